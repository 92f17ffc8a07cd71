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

//! Errors that may occur in this crate.
//!
//! [`HttpError`] encapsulates error information related to all supported
//! protocols, including `H1Error` and `H2Error`.

use core::fmt::{Debug, Display, Formatter};
use std::error::Error;

#[cfg(feature = "http1_1")]
use crate::h1::H1Error;
#[cfg(feature = "http2")]
use crate::h2::H2Error;

/// Errors that may occur when using this crate.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct HttpError {
    kind: ErrorKind,
}

impl HttpError {
    /// Returns `true` if this error was produced while parsing or building a
    /// header or a message head.
    pub fn is_header_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Header | ErrorKind::InvalidInput)
    }

    /// Returns the `H2Error` this error wraps, if any.
    #[cfg(feature = "http2")]
    pub fn h2_error(&self) -> Option<H2Error> {
        match self.kind {
            ErrorKind::H2(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ErrorKind> for HttpError {
    fn from(kind: ErrorKind) -> Self {
        HttpError { kind }
    }
}

#[cfg(feature = "http1_1")]
impl From<H1Error> for HttpError {
    fn from(err: H1Error) -> Self {
        ErrorKind::H1(err).into()
    }
}

#[cfg(feature = "http2")]
impl From<H2Error> for HttpError {
    fn from(err: H2Error) -> Self {
        ErrorKind::H2(err).into()
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(self, f)
    }
}

impl Error for HttpError {}

#[derive(Debug, Eq, PartialEq, Clone)]
pub(crate) enum ErrorKind {
    /// An invalid input parameter was passed to a method of this crate.
    InvalidInput,

    /// A header name or value failed validation.
    Header,

    /// Errors related to `HTTP/1`.
    #[cfg(feature = "http1_1")]
    H1(H1Error),

    /// Errors related to `HTTP/2`.
    #[cfg(feature = "http2")]
    H2(H2Error),
}
