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

//! `ylong_http_session` provides the client-side HTTP session core: the state
//! machine that multiplexes application-level transactions over a single
//! byte-oriented transport connection, protocol-agnostic above the
//! [`SessionCodec`] boundary.
//!
//! The session is sans-io. It is bound to one external cooperative event loop
//! which drives it through [`Session::on_read`], [`Session::on_write_ready`]
//! and the timer entry points; the session itself never blocks and owns no
//! threads.
//!
//! # Feature flags
//!
//! - **`tracing`** — emit `tracing` events for session diagnostics (GOAWAY
//!   handling, codec swap, fatal write errors).

#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { ::tracing::debug!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { ::tracing::warn!($($arg)*) }
}
#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {{}};
}

pub(crate) use {trace_debug, trace_warn};

pub mod codec;
pub mod error;
pub mod session;
pub mod transaction;
pub mod transport;
pub(crate) mod util;

pub use codec::{CodecEvent, Http1Codec, Http2Codec, Protocol, SessionCodec};
pub use error::{Direction, ErrorKind, SessionError};
pub use session::{Session, SessionState};
pub use transaction::{StreamId, TransactionDirection, TransactionHandler, TxnHandle};
pub use transport::Transport;
pub use util::byte_event::{ByteEvent, ByteEventKind, ByteEventTracker, ByteEventTracking};
pub use util::information::{InfoCallback, NoopInfoCallback};
pub use util::priority::{PriorityNode, PriorityTree, PriorityUpdate};
pub use util::upgrade::UpgradeProtocol;
