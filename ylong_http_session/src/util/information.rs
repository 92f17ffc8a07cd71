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

//! The session-level observer interface.

use ylong_http_codec::h2::Setting;

/// Callbacks the session produces for its owner. All methods default to
/// no-ops so implementors only override what they observe.
pub trait InfoCallback {
    /// The session has been created.
    fn on_create(&mut self) {}

    /// The session has been torn down; no further callbacks follow.
    fn on_destroy(&mut self) {}

    /// A complete ingress message head was dispatched.
    fn on_ingress_message(&mut self) {}

    /// Bytes were read from the transport.
    fn on_read(&mut self, bytes: usize) {
        let _ = bytes;
    }

    /// Bytes were acknowledged by the transport.
    fn on_write(&mut self, bytes: usize) {
        let _ = bytes;
    }

    /// A SETTINGS frame arrived from the peer.
    fn on_settings(&mut self, settings: &[Setting]) {
        let _ = settings;
    }

    /// The peer acknowledged our SETTINGS.
    fn on_settings_ack(&mut self) {}

    /// The session replaced its codec after a protocol switch.
    fn on_session_codec_change(&mut self) {}

    /// The outgoing-stream budget is exhausted.
    fn on_settings_outgoing_streams_full(&mut self) {}

    /// The outgoing-stream budget has room again.
    fn on_settings_outgoing_streams_not_full(&mut self) {}

    /// A send was blocked on an exhausted flow-control window.
    fn on_flow_control_window_exhausted(&mut self) {}
}

/// An observer that ignores every callback.
#[derive(Default)]
pub struct NoopInfoCallback;

impl InfoCallback for NoopInfoCallback {}
