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

//! `ylong_http_codec` provides the protocol components an upstream HTTP
//! session multiplexes transactions over: the protocol-agnostic [`Message`]
//! type, header collections, and the HTTP/1 and HTTP/2 wire codecs.
//!
//! # Supported HTTP Version
//! - `HTTP/1.1`
//! - `HTTP/2`

#[cfg(feature = "http1_1")]
pub mod h1;

#[cfg(feature = "http2")]
pub mod h2;

pub mod error;
pub mod headers;
pub mod message;
pub mod method;
pub mod status;
pub mod version;

pub use error::HttpError;
pub use headers::{HeaderName, HeaderValue, Headers};
pub use message::Message;
pub use method::Method;
pub use status::StatusCode;
pub use version::Version;
