// Copyright (c) 2023 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The three-phase drain protocol: `Open` → `Draining` → `Closed`.
//!
//! Each peer announces the highest stream id it will honor via GOAWAY. A
//! later GOAWAY may only narrow the surviving set; `last_good` never grows.

use ylong_http_codec::h2::{ErrorCode, H2Error, StreamId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum DrainPhase {
    Open,
    Draining,
    Closed,
}

pub(crate) struct DrainState {
    phase: DrainPhase,
    last_received_good: Option<StreamId>,
    last_sent_good: Option<StreamId>,
}

impl DrainState {
    pub(crate) fn new() -> Self {
        Self {
            phase: DrainPhase::Open,
            last_received_good: None,
            last_sent_good: None,
        }
    }

    pub(crate) fn phase(&self) -> DrainPhase {
        self.phase
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.phase != DrainPhase::Open
    }

    // Phases advance monotonically; a later `start_draining` is a no-op.
    pub(crate) fn start_draining(&mut self) {
        if self.phase == DrainPhase::Open {
            self.phase = DrainPhase::Draining;
        }
    }

    pub(crate) fn close(&mut self) {
        self.phase = DrainPhase::Closed;
    }

    /// Records a peer GOAWAY. The surviving set may only narrow, so a
    /// `last_good` above the previous one is a connection error.
    pub(crate) fn on_peer_goaway(&mut self, last_good: StreamId) -> Result<(), H2Error> {
        if let Some(prev) = self.last_received_good {
            if last_good > prev {
                return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
            }
        }
        self.last_received_good = Some(last_good);
        self.start_draining();
        Ok(())
    }

    /// Records a locally sent GOAWAY. Returns `false` when an identical
    /// GOAWAY was already sent and should not be repeated.
    pub(crate) fn record_sent_goaway(&mut self, last_good: StreamId) -> bool {
        if self.last_sent_good == Some(last_good) {
            return false;
        }
        self.last_sent_good = Some(last_good);
        self.start_draining();
        true
    }

    pub(crate) fn last_received_good(&self) -> Option<StreamId> {
        self.last_received_good
    }

    #[allow(dead_code)]
    pub(crate) fn last_sent_good(&self) -> Option<StreamId> {
        self.last_sent_good
    }
}
