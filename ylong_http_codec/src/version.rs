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

//! HTTP [`Version`].
//!
//! [`Version`]: https://httpwg.org/specs/rfc9110.html#protocol.version

use crate::error::{ErrorKind, HttpError};

/// HTTP protocol version.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Version(Inner);

impl Version {
    /// HTTP/1.0
    pub const HTTP1_0: Self = Self(Inner::Http10);

    /// HTTP/1.1
    pub const HTTP1_1: Self = Self(Inner::Http11);

    /// HTTP/2
    pub const HTTP2: Self = Self(Inner::Http2);

    /// Returns the string representation of this `Version`.
    pub fn as_str(&self) -> &str {
        match self.0 {
            Inner::Http10 => "HTTP/1.0",
            Inner::Http11 => "HTTP/1.1",
            Inner::Http2 => "HTTP/2.0",
        }
    }

    /// Parses a `Version` from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        match bytes {
            b"HTTP/1.0" => Ok(Version::HTTP1_0),
            b"HTTP/1.1" => Ok(Version::HTTP1_1),
            b"HTTP/2.0" => Ok(Version::HTTP2),
            _ => Err(ErrorKind::InvalidInput.into()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Inner {
    Http10,
    Http11,
    Http2,
}
