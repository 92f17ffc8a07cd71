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

//! The protocol-agnostic [`Message`] a session codec serializes and parses.
//!
//! A `Message` is either a request head or a response head. The session layer
//! dispatches both directions through one codec event set, so the two share a
//! type rather than the request/response pair used by full clients.

use crate::headers::Headers;
use crate::method::Method;
use crate::status::StatusCode;
use crate::version::Version;

/// A request or response head.
#[derive(Clone, Debug)]
pub struct Message {
    version: Version,
    start: StartLine,
    headers: Headers,
    chunked: bool,
    upgraded: bool,
}

#[derive(Clone, Debug)]
enum StartLine {
    Request { method: Method, path: String },
    Response { status: StatusCode },
}

impl Message {
    /// Creates a request message with the given method and path.
    pub fn request(method: Method, path: &str) -> Self {
        Self {
            version: Version::HTTP1_1,
            start: StartLine::Request {
                method,
                path: path.to_string(),
            },
            headers: Headers::new(),
            chunked: false,
            upgraded: false,
        }
    }

    /// Creates a response message with the given status code.
    pub fn response(status: StatusCode) -> Self {
        Self {
            version: Version::HTTP1_1,
            start: StartLine::Response { status },
            headers: Headers::new(),
            chunked: false,
            upgraded: false,
        }
    }

    /// Returns `true` if this message is a request head.
    pub fn is_request(&self) -> bool {
        matches!(self.start, StartLine::Request { .. })
    }

    /// Returns the request method, if this message is a request.
    pub fn method(&self) -> Option<Method> {
        match self.start {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Response { .. } => None,
        }
    }

    /// Returns the request path, if this message is a request.
    pub fn path(&self) -> Option<&str> {
        match self.start {
            StartLine::Request { ref path, .. } => Some(path),
            StartLine::Response { .. } => None,
        }
    }

    /// Returns the response status, if this message is a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self.start {
            StartLine::Request { .. } => None,
            StartLine::Response { status } => Some(status),
        }
    }

    /// Returns the protocol version of this message.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the protocol version of this message.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Returns a reference to the headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns `true` if the message body uses chunked transfer coding.
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Marks the message body as chunked.
    pub fn set_chunked(&mut self, chunked: bool) {
        self.chunked = chunked;
    }

    /// Returns `true` if this message switched protocols (a `101` head).
    pub fn is_upgraded(&self) -> bool {
        self.upgraded
    }

    /// Marks this message as a protocol switch.
    pub fn set_upgraded(&mut self, upgraded: bool) {
        self.upgraded = upgraded;
    }
}

#[cfg(test)]
mod ut_message {
    use super::*;

    /// UT test cases for `Message::request`.
    ///
    /// # Brief
    /// 1. Builds a request message.
    /// 2. Checks direction, method, path and default flags.
    #[test]
    fn ut_message_request() {
        let mut msg = Message::request(Method::GET, "/index.html");
        msg.headers_mut().insert("host", "example.com").unwrap();
        assert!(msg.is_request());
        assert_eq!(msg.method(), Some(Method::GET));
        assert_eq!(msg.path(), Some("/index.html"));
        assert!(msg.status().is_none());
        assert!(!msg.is_chunked());
        assert!(!msg.is_upgraded());
    }

    /// UT test cases for `Message::response`.
    ///
    /// # Brief
    /// 1. Builds a response message and sets flags.
    /// 2. Checks direction, status and flags.
    #[test]
    fn ut_message_response() {
        let mut msg = Message::response(StatusCode::OK);
        msg.set_chunked(true);
        assert!(!msg.is_request());
        assert_eq!(msg.status(), Some(StatusCode::OK));
        assert!(msg.method().is_none());
        assert!(msg.is_chunked());
    }
}
