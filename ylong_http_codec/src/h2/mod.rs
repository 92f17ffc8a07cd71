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

//! `HTTP/2` wire components: the frame model, the frame encoder and decoder,
//! and field-block (header) coding.

mod decoder;
mod encoder;
mod error;
mod fieldblock;
mod frame;

pub use decoder::FrameDecoder;
pub use encoder::FrameEncoder;
pub use error::{ErrorCode, H2Error};
pub use fieldblock::{FieldBlockDecoder, FieldBlockEncoder};
pub use frame::{
    Data, Frame, FrameFlags, FrameType, Goaway, Headers, Parts, Payload, Ping, Priority,
    PseudoHeaders, PushPromise, RstStream, Setting, Settings, SettingsBuilder, WindowUpdate,
};

/// Type StreamId.
/// In HTTP/2, streams are identified by an unsigned 31-bit integer.
pub type StreamId = u32;

/// The client connection preface that precedes any frame.
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// The default SETTINGS_INITIAL_WINDOW_SIZE value.
pub const DEFAULT_WINDOW_SIZE: u32 = 65535;

/// The default SETTINGS_MAX_FRAME_SIZE value.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16384;

/// The largest legal flow-control window.
pub const MAX_FLOW_CONTROL_WINDOW: u32 = (1 << 31) - 1;
