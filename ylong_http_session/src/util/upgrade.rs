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

//! The in-band HTTP/1.1 upgrade bridge.
//!
//! While an `Upgrade:` request is outstanding the session caps outgoing
//! streams at one; when the `101 Switching Protocols` response arrives the
//! session swaps codecs and the bridge keeps the pre-upgrade codec alive
//! until the straddling transaction detaches.

use crate::codec::SessionCodec;
use crate::transaction::StreamId;

/// A protocol this session can switch to in-band.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpgradeProtocol {
    /// HTTP/2 over cleartext, token `h2c`.
    Http2,
}

impl UpgradeProtocol {
    /// The wire token of this protocol.
    pub fn token(&self) -> &'static str {
        match self {
            UpgradeProtocol::Http2 => "h2c",
        }
    }
}

/// Picks the first supported token from an `Upgrade:` header value. Matching
/// is case-insensitive and tolerates surrounding whitespace and junk tokens.
pub(crate) fn negotiate_upgrade(header: &str) -> Option<UpgradeProtocol> {
    for token in header.split(',') {
        let token = token.trim_matches(|c: char| c.is_ascii_whitespace());
        if token.eq_ignore_ascii_case(UpgradeProtocol::Http2.token()) {
            return Some(UpgradeProtocol::Http2);
        }
    }
    None
}

/// Transient state carried between sending an `Upgrade:` request and
/// completing (or failing) the protocol switch.
pub(crate) struct UpgradeBridge {
    // The transaction straddling both codecs.
    txn_id: StreamId,
    protocol: UpgradeProtocol,
    // The pre-upgrade codec, parked after the swap.
    parked_codec: Option<Box<dyn SessionCodec>>,
}

impl UpgradeBridge {
    pub(crate) fn armed(txn_id: StreamId, protocol: UpgradeProtocol) -> Self {
        Self {
            txn_id,
            protocol,
            parked_codec: None,
        }
    }

    pub(crate) fn txn_id(&self) -> StreamId {
        self.txn_id
    }

    pub(crate) fn protocol(&self) -> UpgradeProtocol {
        self.protocol
    }

    pub(crate) fn is_armed(&self) -> bool {
        self.parked_codec.is_none()
    }

    pub(crate) fn park(&mut self, codec: Box<dyn SessionCodec>) {
        self.parked_codec = Some(codec);
    }
}
