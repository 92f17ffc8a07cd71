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

//! HTTP/1 request encoder implementation.
//!
//! The encoder serializes a request head and chunked body pieces into an
//! output buffer. The caller owns buffering; each method appends to the
//! provided `BytesMut` and returns the number of bytes written.

use bytes::{BufMut, BytesMut};

use crate::error::{ErrorKind, HttpError};
use crate::message::Message;

/// An encoder that serializes request messages in `HTTP/1` format.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use ylong_http_codec::h1::RequestEncoder;
/// use ylong_http_codec::{Message, Method};
///
/// let mut msg = Message::request(Method::GET, "/");
/// msg.headers_mut().insert("Accept", "text/html").unwrap();
///
/// let mut buf = BytesMut::new();
/// RequestEncoder::encode_head(&msg, &mut buf).unwrap();
/// assert_eq!(&buf[..], b"GET / HTTP/1.1\r\naccept:text/html\r\n\r\n");
/// ```
pub struct RequestEncoder;

impl RequestEncoder {
    /// Serializes the request line and field lines of `msg`, followed by the
    /// terminating blank line. Returns the number of bytes written.
    pub fn encode_head(msg: &Message, buf: &mut BytesMut) -> Result<usize, HttpError> {
        let method = msg.method().ok_or(HttpError::from(ErrorKind::InvalidInput))?;
        let path = msg.path().ok_or(HttpError::from(ErrorKind::InvalidInput))?;
        let before = buf.len();

        buf.put_slice(method.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(path.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(msg.version().as_str().as_bytes());
        buf.put_slice(b"\r\n");

        for (name, value) in msg.headers().iter() {
            for part in value.iter() {
                buf.put_slice(name.as_bytes());
                buf.put_u8(b':');
                buf.put_slice(part);
                buf.put_slice(b"\r\n");
            }
        }
        buf.put_slice(b"\r\n");
        Ok(buf.len() - before)
    }

    /// Serializes one body chunk in chunked transfer coding.
    pub fn encode_chunk(data: &[u8], buf: &mut BytesMut) -> usize {
        let before = buf.len();
        buf.put_slice(format!("{:x}\r\n", data.len()).as_bytes());
        buf.put_slice(data);
        buf.put_slice(b"\r\n");
        buf.len() - before
    }

    /// Serializes the zero-length last chunk that ends a chunked body.
    pub fn encode_last_chunk(buf: &mut BytesMut) -> usize {
        buf.put_slice(b"0\r\n\r\n");
        5
    }
}

#[cfg(test)]
mod ut_request_encoder {
    use super::*;
    use crate::method::Method;
    use crate::status::StatusCode;

    /// UT test cases for `RequestEncoder::encode_head`.
    ///
    /// # Brief
    /// 1. Encodes a request head with one header.
    /// 2. Checks the serialized layout, including the lowercased name.
    #[test]
    fn ut_encode_head() {
        let mut msg = Message::request(Method::POST, "/upload");
        msg.headers_mut().insert("Content-Type", "text/plain").unwrap();
        let mut buf = BytesMut::new();
        let n = RequestEncoder::encode_head(&msg, &mut buf).unwrap();
        assert_eq!(n, buf.len());
        assert_eq!(
            &buf[..],
            b"POST /upload HTTP/1.1\r\ncontent-type:text/plain\r\n\r\n"
        );
    }

    /// UT test cases for encoding a response through the request encoder.
    ///
    /// # Brief
    /// 1. Attempts to encode a response head.
    /// 2. Checks that the attempt fails.
    #[test]
    fn ut_encode_head_rejects_response() {
        let msg = Message::response(StatusCode::OK);
        let mut buf = BytesMut::new();
        assert!(RequestEncoder::encode_head(&msg, &mut buf).is_err());
    }

    /// UT test cases for chunk serialization.
    ///
    /// # Brief
    /// 1. Encodes a data chunk and the last chunk.
    /// 2. Checks the chunked transfer coding layout.
    #[test]
    fn ut_encode_chunks() {
        let mut buf = BytesMut::new();
        RequestEncoder::encode_chunk(b"hello world", &mut buf);
        RequestEncoder::encode_last_chunk(&mut buf);
        assert_eq!(&buf[..], b"b\r\nhello world\r\n0\r\n\r\n");
    }
}
