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

//! HTTP/1 response decoder implementation.
//!
//! [`ResponseDecoder`] supports decoding multi-segment byte streams into
//! message events: a head, body pieces framed by content-length or chunked
//! coding, trailers, and message completion. Informational heads restart the
//! decoder for the real response on the same exchange; a `101 Switching
//! Protocols` head stops consumption so remaining bytes can be handed to the
//! replacement codec.

use bytes::Bytes;

use crate::error::HttpError;
use crate::h1::H1Error;
use crate::headers::Headers;
use crate::message::Message;
use crate::status::StatusCode;
use crate::version::Version;

/// One decoded ingress event.
#[derive(Debug)]
pub enum H1Event {
    /// A complete response head, including informational (1xx) heads.
    HeadersComplete(Message),
    /// A chunk-size line announcing a chunk of the given length.
    ChunkHeader(usize),
    /// A piece of body data. May be emitted several times per chunk.
    Body(Bytes),
    /// The current chunk has been fully received.
    ChunkComplete,
    /// The trailer section of a chunked body.
    Trailers(Headers),
    /// The message is complete. `upgrade` is set for a `101` head, in which
    /// case the decoder stops consuming input.
    MessageComplete {
        /// The message ended by switching protocols.
        upgrade: bool,
    },
}

// Decoder parsing phase. All components of a response message are:
// ---------------------------------------------------------
// | HTTP-version SP status-code SP [ reason-phrase ] CRLF |
// | *( field-name ":" OWS field-value OWS CRLF )          |
// | CRLF                                                  |
// | [ message-body ]                                      |
// ---------------------------------------------------------
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum DecodeStage {
    StatusLine,
    HeaderLine,
    FixedBody,
    ChunkSize,
    ChunkData,
    ChunkDataCrlf,
    TrailerLine,
    ToEof,
    Upgraded,
}

/// `HTTP/1` response decoder supporting incremental input.
///
/// # Examples
///
/// ```
/// use ylong_http_codec::h1::{H1Event, ResponseDecoder};
///
/// let mut decoder = ResponseDecoder::new();
/// let (consumed, events) = decoder
///     .decode(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi")
///     .unwrap();
/// assert_eq!(consumed, 40);
/// assert!(matches!(events[0], H1Event::HeadersComplete(_)));
/// assert!(matches!(events[1], H1Event::Body(_)));
/// assert!(matches!(events[2], H1Event::MessageComplete { upgrade: false }));
/// ```
pub struct ResponseDecoder {
    stage: DecodeStage,
    // Bytes received but not yet decoded, at most one partial line or body
    // remainder.
    rest: Vec<u8>,
    version: Option<Version>,
    status: Option<StatusCode>,
    headers: Headers,
    trailers: Headers,
    body_remaining: u64,
    chunk_remaining: usize,
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseDecoder {
    /// Creates a new `ResponseDecoder`.
    pub fn new() -> Self {
        Self {
            stage: DecodeStage::StatusLine,
            rest: Vec::new(),
            version: None,
            status: None,
            headers: Headers::new(),
            trailers: Headers::new(),
            body_remaining: 0,
            chunk_remaining: 0,
        }
    }

    /// Decodes some bytes, returning how many input bytes were consumed and
    /// the events produced. The consumed count is less than `buf.len()` only
    /// after a protocol switch, when the remaining bytes belong to the next
    /// codec.
    pub fn decode(&mut self, buf: &[u8]) -> Result<(usize, Vec<H1Event>), HttpError> {
        if self.stage == DecodeStage::Upgraded {
            return Ok((0, Vec::new()));
        }
        self.rest.extend_from_slice(buf);
        let mut events = Vec::new();
        let res = self.run(&mut events);
        if let Err(e) = res {
            self.rest.clear();
            return Err(e);
        }
        if self.stage == DecodeStage::Upgraded {
            let leftover = self.rest.len();
            self.rest.clear();
            let consumed = buf.len().saturating_sub(leftover);
            return Ok((consumed, events));
        }
        Ok((buf.len(), events))
    }

    /// Signals end of input. Completes a read-until-close body.
    pub fn on_eof(&mut self) -> Vec<H1Event> {
        let mut events = Vec::new();
        if self.stage == DecodeStage::ToEof {
            events.push(H1Event::MessageComplete { upgrade: false });
            self.reset_message();
        }
        events
    }

    /// Returns `true` if the decoder is between messages.
    pub fn is_idle(&self) -> bool {
        self.stage == DecodeStage::StatusLine && self.rest.is_empty()
    }

    fn run(&mut self, events: &mut Vec<H1Event>) -> Result<(), HttpError> {
        loop {
            match self.stage {
                DecodeStage::StatusLine => {
                    let line = match self.take_line() {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    self.parse_status_line(&line)?;
                    self.stage = DecodeStage::HeaderLine;
                }
                DecodeStage::HeaderLine => {
                    let line = match self.take_line() {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        self.finish_head(events)?;
                        if self.stage == DecodeStage::Upgraded {
                            return Ok(());
                        }
                    } else {
                        let (name, value) = split_field_line(&line)?;
                        self.headers.append(name, value)?;
                    }
                }
                DecodeStage::FixedBody => {
                    if self.rest.is_empty() {
                        return Ok(());
                    }
                    let take = u64::min(self.body_remaining, self.rest.len() as u64) as usize;
                    let data: Vec<u8> = self.rest.drain(..take).collect();
                    self.body_remaining -= take as u64;
                    if !data.is_empty() {
                        events.push(H1Event::Body(Bytes::from(data)));
                    }
                    if self.body_remaining == 0 {
                        events.push(H1Event::MessageComplete { upgrade: false });
                        self.reset_message();
                    } else {
                        return Ok(());
                    }
                }
                DecodeStage::ChunkSize => {
                    let line = match self.take_line() {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    let size = parse_chunk_size(&line)?;
                    if size == 0 {
                        self.stage = DecodeStage::TrailerLine;
                    } else {
                        events.push(H1Event::ChunkHeader(size));
                        self.chunk_remaining = size;
                        self.stage = DecodeStage::ChunkData;
                    }
                }
                DecodeStage::ChunkData => {
                    if self.rest.is_empty() {
                        return Ok(());
                    }
                    let take = usize::min(self.chunk_remaining, self.rest.len());
                    let data: Vec<u8> = self.rest.drain(..take).collect();
                    self.chunk_remaining -= take;
                    events.push(H1Event::Body(Bytes::from(data)));
                    if self.chunk_remaining == 0 {
                        events.push(H1Event::ChunkComplete);
                        self.stage = DecodeStage::ChunkDataCrlf;
                    } else {
                        return Ok(());
                    }
                }
                DecodeStage::ChunkDataCrlf => {
                    if self.take_line().is_none() {
                        return Ok(());
                    }
                    self.stage = DecodeStage::ChunkSize;
                }
                DecodeStage::TrailerLine => {
                    let line = match self.take_line() {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    if line.is_empty() {
                        if !self.trailers.is_empty() {
                            events.push(H1Event::Trailers(core::mem::take(&mut self.trailers)));
                        }
                        events.push(H1Event::MessageComplete { upgrade: false });
                        self.reset_message();
                    } else {
                        let (name, value) = split_field_line(&line)?;
                        self.trailers.append(name, value)?;
                    }
                }
                DecodeStage::ToEof => {
                    if self.rest.is_empty() {
                        return Ok(());
                    }
                    let data: Vec<u8> = self.rest.drain(..).collect();
                    events.push(H1Event::Body(Bytes::from(data)));
                    return Ok(());
                }
                DecodeStage::Upgraded => return Ok(()),
            }
        }
    }

    // Extracts one line ending in LF, stripping the line ending. Returns
    // `None` when the buffered bytes hold no complete line yet.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.rest.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.rest.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    fn parse_status_line(&mut self, line: &[u8]) -> Result<(), HttpError> {
        let mut parts = line.splitn(3, |b| *b == b' ');
        let version = parts.next().ok_or(HttpError::from(H1Error::InvalidResponse))?;
        let code = parts.next().ok_or(HttpError::from(H1Error::InvalidResponse))?;
        self.version = Some(
            Version::from_bytes(version).map_err(|_| HttpError::from(H1Error::InvalidResponse))?,
        );
        self.status = Some(
            StatusCode::from_bytes(code).map_err(|_| HttpError::from(H1Error::InvalidResponse))?,
        );
        Ok(())
    }

    fn finish_head(&mut self, events: &mut Vec<H1Event>) -> Result<(), HttpError> {
        let status = self.status.take().ok_or(HttpError::from(H1Error::InvalidResponse))?;
        let version = self.version.take().unwrap_or(Version::HTTP1_1);
        let headers = core::mem::take(&mut self.headers);

        let chunked = headers
            .get("transfer-encoding")
            .and_then(|v| v.to_string().ok())
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        let content_length = match headers.get("content-length") {
            None => None,
            Some(v) => {
                let s = v.to_string().map_err(|_| HttpError::from(H1Error::InvalidResponse))?;
                Some(
                    s.trim()
                        .parse::<u64>()
                        .map_err(|_| HttpError::from(H1Error::InvalidResponse))?,
                )
            }
        };

        let mut msg = Message::response(status);
        msg.set_version(version);
        msg.set_chunked(chunked);
        *msg.headers_mut() = headers;

        if status.is_informational() {
            if status == StatusCode::SWITCHING_PROTOCOLS {
                msg.set_upgraded(true);
                events.push(H1Event::HeadersComplete(msg));
                events.push(H1Event::MessageComplete { upgrade: true });
                self.stage = DecodeStage::Upgraded;
            } else {
                // A 1xx head precedes the real response on the same exchange.
                events.push(H1Event::HeadersComplete(msg));
                self.stage = DecodeStage::StatusLine;
            }
            return Ok(());
        }

        events.push(H1Event::HeadersComplete(msg));
        if chunked {
            self.stage = DecodeStage::ChunkSize;
        } else if let Some(len) = content_length {
            if len == 0 {
                events.push(H1Event::MessageComplete { upgrade: false });
                self.reset_message();
            } else {
                self.body_remaining = len;
                self.stage = DecodeStage::FixedBody;
            }
        } else if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
            events.push(H1Event::MessageComplete { upgrade: false });
            self.reset_message();
        } else {
            self.stage = DecodeStage::ToEof;
        }
        Ok(())
    }

    fn reset_message(&mut self) {
        self.stage = DecodeStage::StatusLine;
        self.version = None;
        self.status = None;
        self.headers = Headers::new();
        self.trailers = Headers::new();
        self.body_remaining = 0;
        self.chunk_remaining = 0;
    }
}

fn split_field_line(line: &[u8]) -> Result<(&[u8], &[u8]), HttpError> {
    let pos = line
        .iter()
        .position(|b| *b == b':')
        .ok_or(HttpError::from(H1Error::InvalidResponse))?;
    let name = &line[..pos];
    let mut value = &line[pos + 1..];
    while value.first() == Some(&b' ') || value.first() == Some(&b'\t') {
        value = &value[1..];
    }
    while value.last() == Some(&b' ') || value.last() == Some(&b'\t') {
        value = &value[..value.len() - 1];
    }
    Ok((name, value))
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, HttpError> {
    // Chunk extensions after ';' are ignored.
    let digits = match line.iter().position(|b| *b == b';') {
        Some(pos) => &line[..pos],
        None => line,
    };
    let s = core::str::from_utf8(digits)
        .map_err(|_| HttpError::from(H1Error::InvalidChunk))?
        .trim();
    if s.is_empty() {
        return Err(H1Error::InvalidChunk.into());
    }
    usize::from_str_radix(s, 16).map_err(|_| H1Error::InvalidChunk.into())
}

#[cfg(test)]
mod ut_response_decoder {
    use super::*;

    fn statuses(events: &[H1Event]) -> Vec<u16> {
        events
            .iter()
            .filter_map(|e| match e {
                H1Event::HeadersComplete(msg) => msg.status().map(|s| s.as_u16()),
                _ => None,
            })
            .collect()
    }

    /// UT test cases for decoding a chunked response split across segments.
    ///
    /// # Brief
    /// 1. Feeds a chunked 200 response in three pieces.
    /// 2. Checks the full event sequence and the consumed byte counts.
    #[test]
    fn ut_decode_chunked_segments() {
        let mut decoder = ResponseDecoder::new();
        let (_, events) = decoder
            .decode(b"HTTP/1.1 200 OK\r\nTransfer-Enc")
            .unwrap();
        assert!(events.is_empty());
        let (_, events) = decoder.decode(b"oding: chunked\r\n\r\n").unwrap();
        assert_eq!(statuses(&events), [200]);
        let (_, events) = decoder.decode(b"5\r\nhello\r\n0\r\n\r\n").unwrap();
        assert!(matches!(events[0], H1Event::ChunkHeader(5)));
        assert!(matches!(events[1], H1Event::Body(ref b) if &b[..] == b"hello"));
        assert!(matches!(events[2], H1Event::ChunkComplete));
        assert!(matches!(events[3], H1Event::MessageComplete { upgrade: false }));
        assert!(decoder.is_idle());
    }

    /// UT test cases for the zero-length chunked response of the basic
    /// request exchange.
    ///
    /// # Brief
    /// 1. Feeds `200` with chunked coding and only the last chunk.
    /// 2. Checks that exactly a head and a completion are produced.
    #[test]
    fn ut_decode_empty_chunked() {
        let mut decoder = ResponseDecoder::new();
        let (consumed, events) = decoder
            .decode(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n")
            .unwrap();
        assert_eq!(consumed, 52);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], H1Event::HeadersComplete(ref m) if m.is_chunked()));
        assert!(matches!(events[1], H1Event::MessageComplete { upgrade: false }));
    }

    /// UT test cases for an informational head before the final response.
    ///
    /// # Brief
    /// 1. Feeds `100 Continue` followed by a `200` with a zero-length body.
    /// 2. Checks that both heads are delivered and one completion follows.
    #[test]
    fn ut_decode_100_then_200() {
        let mut decoder = ResponseDecoder::new();
        let (_, events) = decoder
            .decode(
                b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
            )
            .unwrap();
        assert_eq!(statuses(&events), [100, 200]);
        assert!(matches!(
            events.last().unwrap(),
            H1Event::MessageComplete { upgrade: false }
        ));
    }

    /// UT test cases for the protocol-switch stop.
    ///
    /// # Brief
    /// 1. Feeds a `101` head with trailing bytes for the next protocol.
    /// 2. Checks that the trailing bytes are left unconsumed and further
    ///    decoding is refused.
    #[test]
    fn ut_decode_101_stops() {
        let mut decoder = ResponseDecoder::new();
        let head = b"HTTP/1.1 101 Switching Protocols\r\nUpgrade: h2c\r\n\r\n";
        let mut input = head.to_vec();
        input.extend_from_slice(b"PRI *");
        let (consumed, events) = decoder.decode(&input).unwrap();
        assert_eq!(consumed, head.len());
        assert!(matches!(events[0], H1Event::HeadersComplete(ref m) if m.is_upgraded()));
        assert!(matches!(events[1], H1Event::MessageComplete { upgrade: true }));
        let (consumed, events) = decoder.decode(b"more").unwrap();
        assert_eq!(consumed, 0);
        assert!(events.is_empty());
    }

    /// UT test cases for a read-until-close body.
    ///
    /// # Brief
    /// 1. Feeds a head without body framing and some data.
    /// 2. Checks that EOF completes the message.
    #[test]
    fn ut_decode_to_eof() {
        let mut decoder = ResponseDecoder::new();
        let (_, events) = decoder
            .decode(b"HTTP/1.1 200 OK\r\n\r\nTest Body\r\n")
            .unwrap();
        assert_eq!(statuses(&events), [200]);
        assert!(matches!(events[1], H1Event::Body(ref b) if &b[..] == b"Test Body\r\n"));
        let events = decoder.on_eof();
        assert!(matches!(events[0], H1Event::MessageComplete { upgrade: false }));
    }

    /// UT test cases for trailers after a chunked body.
    ///
    /// # Brief
    /// 1. Feeds a chunked body ending with a trailer field.
    /// 2. Checks that the trailer event precedes completion.
    #[test]
    fn ut_decode_trailers() {
        let mut decoder = ResponseDecoder::new();
        let (_, events) = decoder
            .decode(
                b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
                  3\r\nabc\r\n0\r\nx-checksum: 99\r\n\r\n",
            )
            .unwrap();
        assert!(matches!(
            events.iter().rev().nth(1),
            Some(H1Event::Trailers(t)) if t.get("x-checksum").is_some()
        ));
        assert!(matches!(
            events.last().unwrap(),
            H1Event::MessageComplete { upgrade: false }
        ));
    }

    /// UT test cases for invalid input.
    ///
    /// # Brief
    /// 1. Feeds a malformed status line and a malformed chunk size.
    /// 2. Checks that both fail.
    #[test]
    fn ut_decode_invalid() {
        let mut decoder = ResponseDecoder::new();
        assert!(decoder.decode(b"invalid str\r\n").is_err());

        let mut decoder = ResponseDecoder::new();
        let res = decoder.decode(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n");
        assert!(res.is_err());
    }
}
