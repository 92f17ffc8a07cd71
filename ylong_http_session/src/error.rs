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

//! Definition of [`SessionError`], the error surfaced to transactions.
//!
//! Messages follow the format `"<Kind> on transaction id: <N>"`, optionally
//! suffixed with `" with codec error: <name>"` when a codec error code is
//! attached.

use core::fmt::{Debug, Display, Formatter};
use std::error;

use crate::transaction::StreamId;

/// The direction an error applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The error affects ingress only.
    Ingress,

    /// The error affects egress only.
    Egress,

    /// The error affects both directions.
    IngressAndEgress,
}

/// An error surfaced to a transaction or to the session owner.
#[derive(Clone)]
pub struct SessionError {
    kind: ErrorKind,
    direction: Direction,
    txn_id: Option<StreamId>,
    codec_error: Option<&'static str>,
}

impl SessionError {
    /// Creates a new `SessionError`.
    pub fn new(kind: ErrorKind, direction: Direction) -> Self {
        Self {
            kind,
            direction,
            txn_id: None,
            codec_error: None,
        }
    }

    /// Attaches the owning transaction id.
    pub fn with_txn(mut self, id: StreamId) -> Self {
        self.txn_id = Some(id);
        self
    }

    /// Attaches a codec error code name, rendered as
    /// `" with codec error: <name>"`.
    pub fn with_codec_error(mut self, name: &'static str) -> Self {
        self.codec_error = Some(name);
        self
    }

    /// Gets the `ErrorKind` of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Gets the `Direction` of this error.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Gets the owning transaction id, if any.
    pub fn txn_id(&self) -> Option<StreamId> {
        self.txn_id
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.txn_id {
            Some(id) => write!(f, "{} on transaction id: {}", self.kind.as_str(), id)?,
            None => f.write_str(self.kind.as_str())?,
        }
        if let Some(name) = self.codec_error {
            write!(f, " with codec error: {}", name)?;
        }
        Ok(())
    }
}

impl Debug for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionError")
            .field("kind", &self.kind)
            .field("direction", &self.direction)
            .field("txn_id", &self.txn_id)
            .field("codec_error", &self.codec_error)
            .finish()
    }
}

impl error::Error for SessionError {}

/// Error kinds surfaced to transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The peer sent a GOAWAY that does not acknowledge this stream.
    StreamUnacknowledged,

    /// Egress did not make progress before the idle timeout expired.
    WriteTimeout,

    /// Ingress did not make progress before the idle timeout expired.
    ReadTimeout,

    /// The codec could not parse a message head.
    ParseHeader,

    /// An ingress event arrived in a state that does not allow it.
    IngressStateTransition,

    /// The connection was dropped by the local application.
    Dropped,

    /// The transport reported a renegotiation after the request was written.
    ClientRenegotiation,

    /// The peer violated the protocol.
    ProtocolError,

    /// The peer refused the stream before processing it.
    RefusedStream,

    /// The transport failed or was closed underneath the session.
    ConnectionReset,
}

impl ErrorKind {
    /// Gets the string form of this `ErrorKind`, as used in error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StreamUnacknowledged => "StreamUnacknowledged",
            Self::WriteTimeout => "WriteTimeout",
            Self::ReadTimeout => "ReadTimeout",
            Self::ParseHeader => "ParseHeader",
            Self::IngressStateTransition => "IngressStateTransition",
            Self::Dropped => "Dropped",
            Self::ClientRenegotiation => "ClientRenegotiation",
            Self::ProtocolError => "ProtocolError",
            Self::RefusedStream => "RefusedStream",
            Self::ConnectionReset => "ConnectionReset",
        }
    }
}

#[cfg(test)]
mod ut_session_error {
    use super::*;

    /// UT test cases for the error message format.
    ///
    /// # Brief
    /// 1. Builds an error with a transaction id.
    /// 2. Checks the rendered message with and without a codec error code.
    #[test]
    fn ut_error_display() {
        let err = SessionError::new(ErrorKind::StreamUnacknowledged, Direction::IngressAndEgress)
            .with_txn(3);
        assert_eq!(format!("{}", err), "StreamUnacknowledged on transaction id: 3");

        let err = err.with_codec_error("PROTOCOL_ERROR");
        assert_eq!(
            format!("{}", err),
            "StreamUnacknowledged on transaction id: 3 with codec error: PROTOCOL_ERROR"
        );

        let err = SessionError::new(ErrorKind::Dropped, Direction::IngressAndEgress);
        assert_eq!(format!("{}", err), "Dropped");
    }

    /// UT test cases for accessors.
    ///
    /// # Brief
    /// 1. Builds an error and reads back its fields.
    #[test]
    fn ut_error_accessors() {
        let err = SessionError::new(ErrorKind::WriteTimeout, Direction::Egress).with_txn(5);
        assert_eq!(err.kind(), ErrorKind::WriteTimeout);
        assert_eq!(err.direction(), Direction::Egress);
        assert_eq!(err.txn_id(), Some(5));
    }
}
