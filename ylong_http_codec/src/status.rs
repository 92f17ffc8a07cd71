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

//! HTTP [`StatusCode`].
//!
//! [`StatusCode`]: https://httpwg.org/specs/rfc9110.html#overview.of.status.codes

use crate::error::{ErrorKind, HttpError};

/// HTTP response status code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 100 Continue
    pub const CONTINUE: StatusCode = StatusCode(100);

    /// 101 Switching Protocols
    pub const SWITCHING_PROTOCOLS: StatusCode = StatusCode(101);

    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);

    /// 204 No Content
    pub const NO_CONTENT: StatusCode = StatusCode(204);

    /// 304 Not Modified
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);

    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);

    /// 404 Not Found
    pub const NOT_FOUND: StatusCode = StatusCode(404);

    /// 417 Expectation Failed
    pub const EXPECTATION_FAILED: StatusCode = StatusCode(417);

    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Creates a `StatusCode` from a `u16` value.
    pub fn from_u16(code: u16) -> Result<StatusCode, HttpError> {
        if !(100..1000).contains(&code) {
            return Err(ErrorKind::InvalidInput.into());
        }
        Ok(StatusCode(code))
    }

    /// Parses a `StatusCode` from a three-digit byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        if bytes.len() != 3 {
            return Err(ErrorKind::InvalidInput.into());
        }
        let mut code = 0u16;
        for b in bytes {
            if !b.is_ascii_digit() {
                return Err(ErrorKind::InvalidInput.into());
            }
            code = code * 10 + u16::from(b - b'0');
        }
        Self::from_u16(code)
    }

    /// Returns the `u16` value of this `StatusCode`.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns `true` if this status code is informational (1xx).
    pub fn is_informational(&self) -> bool {
        (100..200).contains(&self.0)
    }

    /// Returns `true` if this status code is successful (2xx).
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Returns the canonical reason phrase for this status code, if one is
    /// known.
    pub fn reason(&self) -> Option<&'static str> {
        match self.0 {
            100 => Some("Continue"),
            101 => Some("Switching Protocols"),
            200 => Some("OK"),
            204 => Some("No Content"),
            304 => Some("Not Modified"),
            400 => Some("Bad Request"),
            404 => Some("Not Found"),
            417 => Some("Expectation Failed"),
            500 => Some("Internal Server Error"),
            _ => None,
        }
    }
}
