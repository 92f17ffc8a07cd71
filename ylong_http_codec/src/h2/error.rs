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

//! [`Error Codes`] in [`HTTP/2`].
//!
//! [`Error Codes`]: https://httpwg.org/specs/rfc9113.html#ErrorCodes
//! [`HTTP/2`]: https://httpwg.org/specs/rfc9113.html
//!
//! Error codes are 32-bit fields used in `RST_STREAM` and `GOAWAY` frames to
//! convey the reason for a stream or connection error.

use std::convert::TryFrom;

use super::StreamId;

/// The http2 error handle implementation.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum H2Error {
    /// [`Stream Error`] handling.
    ///
    /// [`Stream Error`]: https://www.rfc-editor.org/rfc/rfc9113.html#name-stream-error-handling
    StreamError(StreamId, ErrorCode),

    /// [`Connection Error`] handling.
    ///
    /// [`Connection Error`]: https://www.rfc-editor.org/rfc/rfc9113.html#name-connection-error-handling
    ConnectionError(ErrorCode),
}

/// [`Error Codes`] implementation.
///
/// [`Error Codes`]: https://httpwg.org/specs/rfc9113.html#ErrorCodes
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ErrorCode {
    /// The associated condition is not a result of an error. A `GOAWAY` might
    /// include this code to indicate graceful shutdown of a connection.
    NoError = 0x00,

    /// The endpoint detected an unspecific protocol error.
    ProtocolError = 0x01,

    /// The endpoint encountered an unexpected internal error.
    InternalError = 0x02,

    /// The endpoint detected that its peer violated the flow-control protocol.
    FlowControlError = 0x03,

    /// The endpoint sent a `SETTINGS` frame but did not receive a response in
    /// a timely manner.
    SettingsTimeout = 0x04,

    /// The endpoint received a frame after a stream was half-closed.
    StreamClosed = 0x05,

    /// The endpoint received a frame with an invalid size.
    FrameSizeError = 0x06,

    /// The endpoint refused the stream prior to performing any application
    /// processing.
    RefusedStream = 0x07,

    /// The endpoint uses this error code to indicate that the stream is no
    /// longer needed.
    Cancel = 0x08,

    /// The endpoint is unable to maintain the field section compression
    /// context for the connection.
    CompressionError = 0x09,

    /// The connection established in response to a `CONNECT` request was
    /// reset or abnormally closed.
    ConnectError = 0x0a,

    /// The endpoint detected that its peer is exhibiting a behavior that
    /// might be generating excessive load.
    EnhanceYourCalm = 0x0b,

    /// The underlying transport has properties that do not meet minimum
    /// security requirements.
    InadequateSecurity = 0x0c,

    /// The endpoint requires that HTTP/1.1 be used instead of HTTP/2.
    Http1_1Required = 0x0d,
}

impl ErrorCode {
    /// Gets the wire value of the `ErrorCode`.
    pub fn into_code(self) -> u32 {
        self as u32
    }

    /// Returns the constant name of the `ErrorCode`, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::NoError => "NO_ERROR",
            ErrorCode::ProtocolError => "PROTOCOL_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::FlowControlError => "FLOW_CONTROL_ERROR",
            ErrorCode::SettingsTimeout => "SETTINGS_TIMEOUT",
            ErrorCode::StreamClosed => "STREAM_CLOSED",
            ErrorCode::FrameSizeError => "FRAME_SIZE_ERROR",
            ErrorCode::RefusedStream => "REFUSED_STREAM",
            ErrorCode::Cancel => "CANCEL",
            ErrorCode::CompressionError => "COMPRESSION_ERROR",
            ErrorCode::ConnectError => "CONNECT_ERROR",
            ErrorCode::EnhanceYourCalm => "ENHANCE_YOUR_CALM",
            ErrorCode::InadequateSecurity => "INADEQUATE_SECURITY",
            ErrorCode::Http1_1Required => "HTTP_1_1_REQUIRED",
        }
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = H2Error;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        let err = match value {
            0x00 => ErrorCode::NoError,
            0x01 => ErrorCode::ProtocolError,
            0x02 => ErrorCode::InternalError,
            0x03 => ErrorCode::FlowControlError,
            0x04 => ErrorCode::SettingsTimeout,
            0x05 => ErrorCode::StreamClosed,
            0x06 => ErrorCode::FrameSizeError,
            0x07 => ErrorCode::RefusedStream,
            0x08 => ErrorCode::Cancel,
            0x09 => ErrorCode::CompressionError,
            0x0a => ErrorCode::ConnectError,
            0x0b => ErrorCode::EnhanceYourCalm,
            0x0c => ErrorCode::InadequateSecurity,
            0x0d => ErrorCode::Http1_1Required,
            _ => return Err(H2Error::ConnectionError(ErrorCode::ProtocolError)),
        };
        Ok(err)
    }
}
