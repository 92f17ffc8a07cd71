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

//! The serial HTTP/1.x client codec.
//!
//! One transaction is on the wire at a time. Stream ids are still minted as
//! ascending odd integers so the session's bookkeeping is uniform across
//! protocols, and so the straddling transaction keeps its id across an
//! upgrade to HTTP/2 (the first transaction is stream 1 in both).

use bytes::BytesMut;
use ylong_http_codec::h1::{H1Event, RequestEncoder, ResponseDecoder};
use ylong_http_codec::h2::{ErrorCode, Setting, StreamId};
use ylong_http_codec::{HttpError, Message};

use crate::codec::{CodecEvent, Protocol, SessionCodec};
use crate::util::priority::PriorityUpdate;

const MAX_STREAM_ID: StreamId = u32::MAX >> 1;

/// HTTP/1.x client codec.
pub struct Http1Codec {
    decoder: ResponseDecoder,
    next_stream_id: StreamId,
    // The stream awaiting its response.
    current_ingress: Option<StreamId>,
    // Whether the current egress message uses chunked coding.
    egress_chunked: bool,
    reusable: bool,
}

impl Default for Http1Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Http1Codec {
    /// Creates a new `Http1Codec`.
    pub fn new() -> Self {
        Self {
            decoder: ResponseDecoder::new(),
            next_stream_id: 1,
            current_ingress: None,
            egress_chunked: false,
            reusable: true,
        }
    }

    fn ingress_stream(&self) -> StreamId {
        self.current_ingress.unwrap_or(1)
    }
}

impl SessionCodec for Http1Codec {
    fn protocol(&self) -> Protocol {
        Protocol::Http1_1
    }

    fn supports_parallel_requests(&self) -> bool {
        false
    }

    fn supports_stream_flow_control(&self) -> bool {
        false
    }

    fn supports_session_flow_control(&self) -> bool {
        false
    }

    fn default_window_size(&self) -> u32 {
        65535
    }

    fn is_reusable(&self) -> bool {
        self.reusable
    }

    fn create_stream(&mut self) -> StreamId {
        let id = self.next_stream_id;
        if self.next_stream_id < MAX_STREAM_ID {
            self.next_stream_id += 2;
        }
        self.current_ingress = Some(id);
        id
    }

    fn on_ingress(&mut self, buf: &[u8]) -> Result<(usize, Vec<CodecEvent>), HttpError> {
        let stream = self.ingress_stream();
        let (consumed, h1_events) = self.decoder.decode(buf)?;
        let mut events = Vec::with_capacity(h1_events.len());
        for event in h1_events {
            match event {
                H1Event::HeadersComplete(msg) => {
                    // A response without body framing ends the connection.
                    if !msg.is_chunked()
                        && msg
                            .status()
                            .map(|s| !s.is_informational())
                            .unwrap_or(false)
                        && msg.headers().get("content-length").is_none()
                        && msg.status().map(|s| s.as_u16()).unwrap_or(0) != 204
                        && msg.status().map(|s| s.as_u16()).unwrap_or(0) != 304
                    {
                        self.reusable = false;
                    }
                    events.push(CodecEvent::HeadersComplete { stream, msg });
                }
                H1Event::ChunkHeader(len) => {
                    events.push(CodecEvent::ChunkHeader { stream, len });
                }
                H1Event::Body(data) => {
                    events.push(CodecEvent::Body { stream, data });
                }
                H1Event::ChunkComplete => {
                    events.push(CodecEvent::ChunkComplete { stream });
                }
                H1Event::Trailers(trailers) => {
                    events.push(CodecEvent::Trailers { stream, trailers });
                }
                H1Event::MessageComplete { upgrade } => {
                    if upgrade {
                        self.reusable = false;
                    } else {
                        self.current_ingress = None;
                    }
                    events.push(CodecEvent::MessageComplete { stream, upgrade });
                }
            }
        }
        Ok((consumed, events))
    }

    fn on_ingress_eof(&mut self) -> Vec<CodecEvent> {
        self.reusable = false;
        let stream = self.ingress_stream();
        self.decoder
            .on_eof()
            .into_iter()
            .filter_map(|event| match event {
                H1Event::MessageComplete { upgrade } => {
                    Some(CodecEvent::MessageComplete { stream, upgrade })
                }
                _ => None,
            })
            .collect()
    }

    fn generate_connection_preface(&mut self, _buf: &mut BytesMut) -> usize {
        0
    }

    fn generate_settings(&mut self, _buf: &mut BytesMut, _settings: &[Setting]) -> usize {
        0
    }

    fn generate_settings_ack(&mut self, _buf: &mut BytesMut) -> usize {
        0
    }

    fn generate_header(
        &mut self,
        buf: &mut BytesMut,
        _id: StreamId,
        msg: &Message,
        eom: bool,
    ) -> Result<usize, HttpError> {
        let has_length = msg.headers().get("content-length").is_some()
            || msg.headers().get("transfer-encoding").is_some();
        if !eom && !has_length {
            // A body follows without a declared length; switch to chunked.
            let mut chunked = msg.clone();
            let _ = chunked
                .headers_mut()
                .insert("transfer-encoding", "chunked")?;
            self.egress_chunked = true;
            return RequestEncoder::encode_head(&chunked, buf);
        }
        self.egress_chunked = msg
            .headers()
            .get("transfer-encoding")
            .and_then(|v| v.to_string().ok())
            .map(|v| v.to_ascii_lowercase().contains("chunked"))
            .unwrap_or(false);
        RequestEncoder::encode_head(msg, buf)
    }

    fn generate_body(
        &mut self,
        buf: &mut BytesMut,
        _id: StreamId,
        data: &[u8],
        _padding: Option<u8>,
        eom: bool,
    ) -> usize {
        let mut written = if self.egress_chunked {
            RequestEncoder::encode_chunk(data, buf)
        } else {
            use bytes::BufMut;
            buf.put_slice(data);
            data.len()
        };
        if eom && self.egress_chunked {
            written += RequestEncoder::encode_last_chunk(buf);
        }
        written
    }

    fn generate_eom(&mut self, buf: &mut BytesMut, _id: StreamId) -> usize {
        if self.egress_chunked {
            self.egress_chunked = false;
            RequestEncoder::encode_last_chunk(buf)
        } else {
            0
        }
    }

    fn generate_rst_stream(
        &mut self,
        _buf: &mut BytesMut,
        _id: StreamId,
        _code: ErrorCode,
    ) -> usize {
        // HTTP/1 cannot express a stream reset; the session closes instead.
        self.reusable = false;
        0
    }

    fn generate_goaway(
        &mut self,
        _buf: &mut BytesMut,
        _last_good: StreamId,
        _code: ErrorCode,
        _debug: &[u8],
    ) -> usize {
        self.reusable = false;
        0
    }

    fn generate_window_update(&mut self, _buf: &mut BytesMut, _id: StreamId, _delta: u32) -> usize {
        0
    }

    fn generate_priority(
        &mut self,
        _buf: &mut BytesMut,
        _id: StreamId,
        _pri: &PriorityUpdate,
    ) -> usize {
        0
    }

    fn generate_ping_reply(&mut self, _buf: &mut BytesMut, _data: [u8; 8]) -> usize {
        0
    }
}
