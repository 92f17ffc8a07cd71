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

//! HTTP [`Method`].
//!
//! [`Method`]: https://httpwg.org/specs/rfc9110.html#methods

use crate::error::{ErrorKind, HttpError};

/// HTTP request method.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Method(Inner);

impl Method {
    /// The `GET` method.
    pub const GET: Self = Self(Inner::Get);

    /// The `HEAD` method.
    pub const HEAD: Self = Self(Inner::Head);

    /// The `POST` method.
    pub const POST: Self = Self(Inner::Post);

    /// The `PUT` method.
    pub const PUT: Self = Self(Inner::Put);

    /// The `DELETE` method.
    pub const DELETE: Self = Self(Inner::Delete);

    /// The `CONNECT` method.
    pub const CONNECT: Self = Self(Inner::Connect);

    /// The `OPTIONS` method.
    pub const OPTIONS: Self = Self(Inner::Options);

    /// The `TRACE` method.
    pub const TRACE: Self = Self(Inner::Trace);

    /// Parses a `Method` from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Method, HttpError> {
        match bytes {
            b"GET" => Ok(Method::GET),
            b"HEAD" => Ok(Method::HEAD),
            b"POST" => Ok(Method::POST),
            b"PUT" => Ok(Method::PUT),
            b"DELETE" => Ok(Method::DELETE),
            b"CONNECT" => Ok(Method::CONNECT),
            b"OPTIONS" => Ok(Method::OPTIONS),
            b"TRACE" => Ok(Method::TRACE),
            _ => Err(ErrorKind::InvalidInput.into()),
        }
    }

    /// Returns the string representation of this `Method`.
    pub fn as_str(&self) -> &str {
        match self.0 {
            Inner::Get => "GET",
            Inner::Head => "HEAD",
            Inner::Post => "POST",
            Inner::Put => "PUT",
            Inner::Delete => "DELETE",
            Inner::Connect => "CONNECT",
            Inner::Options => "OPTIONS",
            Inner::Trace => "TRACE",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Inner {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
}
