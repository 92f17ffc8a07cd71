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

//! The codec boundary the session is protocol-agnostic above.
//!
//! A [`SessionCodec`] serializes egress calls into outbound bytes and parses
//! inbound bytes into [`CodecEvent`]s, which the session dispatches in order.
//! `on_ingress` reports how many input bytes it consumed so that the first
//! transaction of a connection can straddle two codecs across an in-band
//! protocol switch.

pub(crate) mod h1;
pub(crate) mod h2;

pub use h1::Http1Codec;
pub use h2::Http2Codec;

use bytes::{Bytes, BytesMut};
use ylong_http_codec::h2::{ErrorCode, H2Error, Setting, StreamId};
use ylong_http_codec::{Headers, HttpError, Message};

use crate::util::priority::PriorityUpdate;

/// The wire protocol a codec speaks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Protocol {
    /// HTTP/1.0
    Http1_0,
    /// HTTP/1.1
    Http1_1,
    /// SPDY/3.1
    Spdy3_1,
    /// HTTP/2
    Http2,
}

impl Protocol {
    /// Returns the string form of this protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http1_0 => "http/1.0",
            Protocol::Http1_1 => "http/1.1",
            Protocol::Spdy3_1 => "spdy/3.1",
            Protocol::Http2 => "h2",
        }
    }
}

/// One parsed ingress event.
#[derive(Debug)]
pub enum CodecEvent {
    /// A server push announced `stream`, associated with `assoc`.
    PushMessageBegin {
        /// The pushed (even) stream id.
        stream: StreamId,
        /// The client stream the push is associated with.
        assoc: StreamId,
    },

    /// The peer opened a bidirectional stream attached to a control stream.
    ExMessageBegin {
        /// The new stream id.
        stream: StreamId,
        /// The control stream it is attached to.
        control: StreamId,
    },

    /// A complete message head.
    HeadersComplete {
        /// The stream the head belongs to.
        stream: StreamId,
        /// The parsed head.
        msg: Message,
    },

    /// A piece of body data.
    Body {
        /// The stream the data belongs to.
        stream: StreamId,
        /// The data bytes, with any wire framing removed.
        data: Bytes,
    },

    /// A chunk-size line (HTTP/1 chunked coding only).
    ChunkHeader {
        /// The stream the chunk belongs to.
        stream: StreamId,
        /// The announced chunk length.
        len: usize,
    },

    /// The current chunk completed (HTTP/1 chunked coding only).
    ChunkComplete {
        /// The stream the chunk belongs to.
        stream: StreamId,
    },

    /// The trailer section of a message.
    Trailers {
        /// The stream the trailers belong to.
        stream: StreamId,
        /// The trailer fields.
        trailers: Headers,
    },

    /// The message on `stream` is complete.
    MessageComplete {
        /// The stream the message belongs to.
        stream: StreamId,
        /// The message ended by switching protocols.
        upgrade: bool,
    },

    /// A SETTINGS frame.
    Settings {
        /// The settings carried by the frame.
        settings: Vec<Setting>,
    },

    /// The peer acknowledged our SETTINGS.
    SettingsAck,

    /// A PING request that must be answered.
    PingRequest {
        /// The opaque ping payload.
        data: [u8; 8],
    },

    /// A PING reply.
    PingReply {
        /// The opaque ping payload.
        data: [u8; 8],
    },

    /// A GOAWAY frame.
    Goaway {
        /// The highest stream id the peer will honor.
        last_good: StreamId,
        /// The error code carried by the frame.
        code: ErrorCode,
        /// Opaque debug data.
        debug: Vec<u8>,
    },

    /// The peer reset `stream`.
    Abort {
        /// The reset stream.
        stream: StreamId,
        /// The reset code.
        code: ErrorCode,
    },

    /// A flow-control window grant.
    WindowUpdate {
        /// The stream the grant applies to; `0` is the connection window.
        stream: StreamId,
        /// The grant size.
        delta: u32,
    },

    /// A raw frame header, for observability.
    FrameHeader {
        /// The stream of the frame.
        stream: StreamId,
        /// The payload length.
        length: u32,
        /// The wire frame type.
        kind: u8,
        /// The wire flags.
        flags: u8,
    },

    /// A stream-scoped parse error.
    Error {
        /// The stream the error belongs to, if known.
        stream: Option<StreamId>,
        /// The parse error.
        error: HttpError,
        /// `true` when the error names a stream the session has never seen.
        is_new_stream: bool,
    },
}

/// The codec capability set the session drives.
pub trait SessionCodec {
    /// The protocol this codec speaks.
    fn protocol(&self) -> Protocol;

    /// Whether several transactions may be in flight at once.
    fn supports_parallel_requests(&self) -> bool;

    /// Whether per-stream flow control applies.
    fn supports_stream_flow_control(&self) -> bool;

    /// Whether connection-level flow control applies.
    fn supports_session_flow_control(&self) -> bool;

    /// The protocol's default flow-control window.
    fn default_window_size(&self) -> u32;

    /// Whether new streams may still be opened on this codec.
    fn is_reusable(&self) -> bool;

    /// Whether the codec itself is waiting for the connection to drain.
    fn is_waiting_to_drain(&self) -> bool {
        false
    }

    /// Mints the next locally-initiated stream id.
    fn create_stream(&mut self) -> StreamId;

    /// Parses inbound bytes. Returns how many bytes were consumed and the
    /// events they produced. Consuming less than `buf.len()` hands the
    /// remainder to a replacement codec after a protocol switch.
    fn on_ingress(&mut self, buf: &[u8]) -> Result<(usize, Vec<CodecEvent>), HttpError>;

    /// Signals end of input.
    fn on_ingress_eof(&mut self) -> Vec<CodecEvent>;

    /// Serializes the connection preface, if the protocol has one.
    fn generate_connection_preface(&mut self, buf: &mut BytesMut) -> usize;

    /// Serializes a SETTINGS frame.
    fn generate_settings(&mut self, buf: &mut BytesMut, settings: &[Setting]) -> usize;

    /// Serializes a SETTINGS acknowledgement.
    fn generate_settings_ack(&mut self, buf: &mut BytesMut) -> usize;

    /// Serializes a message head for `id`.
    fn generate_header(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        msg: &Message,
        eom: bool,
    ) -> Result<usize, HttpError>;

    /// Serializes a message head opening a bidirectional stream attached to
    /// `control_stream`.
    fn generate_ex_header(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        msg: &Message,
        control_stream: StreamId,
        eom: bool,
    ) -> Result<usize, HttpError> {
        let _ = (buf, id, msg, control_stream, eom);
        Err(H2Error::ConnectionError(ErrorCode::ProtocolError).into())
    }

    /// Serializes a push promise. Codecs without push support write nothing.
    fn generate_push_promise(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        promised: StreamId,
        msg: &Message,
    ) -> usize {
        let _ = (buf, id, promised, msg);
        0
    }

    /// Serializes body bytes for `id`.
    fn generate_body(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        data: &[u8],
        padding: Option<u8>,
        eom: bool,
    ) -> usize;

    /// Serializes an end-of-message marker for `id`.
    fn generate_eom(&mut self, buf: &mut BytesMut, id: StreamId) -> usize;

    /// Serializes a stream reset. Codecs without resets write nothing.
    fn generate_rst_stream(&mut self, buf: &mut BytesMut, id: StreamId, code: ErrorCode) -> usize;

    /// Serializes a GOAWAY. Codecs without GOAWAY write nothing.
    fn generate_goaway(
        &mut self,
        buf: &mut BytesMut,
        last_good: StreamId,
        code: ErrorCode,
        debug: &[u8],
    ) -> usize;

    /// Serializes a flow-control window grant.
    fn generate_window_update(&mut self, buf: &mut BytesMut, id: StreamId, delta: u32) -> usize;

    /// Serializes a priority update.
    fn generate_priority(&mut self, buf: &mut BytesMut, id: StreamId, pri: &PriorityUpdate)
        -> usize;

    /// Serializes a reply to a peer PING.
    fn generate_ping_reply(&mut self, buf: &mut BytesMut, data: [u8; 8]) -> usize;

    /// Maps a priority level to the dependency stream the peer observes.
    fn map_priority_to_dependency(&self, level: u8) -> StreamId {
        let _ = level;
        0
    }
}
