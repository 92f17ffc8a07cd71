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

//! The multiplexed HTTP/2 client codec.

use std::convert::TryFrom;

use bytes::{BufMut, Bytes, BytesMut};
use ylong_http_codec::h2::{
    ErrorCode, Frame, FrameDecoder, FrameEncoder, FrameFlags, Goaway, Parts, Payload, Ping,
    Priority, RstStream, Setting, Settings, SettingsBuilder, StreamId, WindowUpdate,
    CONNECTION_PREFACE, DEFAULT_WINDOW_SIZE,
};
use ylong_http_codec::{HttpError, Message};

use crate::codec::{CodecEvent, Protocol, SessionCodec};
use crate::util::priority::PriorityUpdate;

const MAX_STREAM_ID: StreamId = u32::MAX >> 1;

/// HTTP/2 client codec.
pub struct Http2Codec {
    encoder: FrameEncoder,
    decoder: FrameDecoder,
    next_stream_id: StreamId,
    goaway_received: bool,
}

impl Default for Http2Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl Http2Codec {
    /// Creates a codec for a fresh HTTP/2 connection.
    pub fn new() -> Self {
        Self {
            encoder: FrameEncoder::default(),
            decoder: FrameDecoder::new(),
            next_stream_id: 1,
            goaway_received: false,
        }
    }

    /// Creates a codec for a connection entered through an HTTP/1.1 upgrade:
    /// the straddling transaction is already bound to stream 1.
    pub fn upgraded() -> Self {
        let mut codec = Self::new();
        codec.next_stream_id = 3;
        codec
    }

    fn map_frame(&mut self, frame: Frame, events: &mut Vec<CodecEvent>) -> Result<(), HttpError> {
        let stream = frame.stream_id();
        let end_stream = frame.flags().is_end_stream();
        let is_ack = frame.flags().is_ack();
        match frame.into_payload() {
            Payload::Headers(headers) => {
                let msg = headers.into_parts().into_message()?;
                events.push(CodecEvent::HeadersComplete { stream, msg });
                if end_stream {
                    events.push(CodecEvent::MessageComplete {
                        stream,
                        upgrade: false,
                    });
                }
            }
            Payload::Data(data) => {
                if data.size() > 0 {
                    events.push(CodecEvent::Body {
                        stream,
                        data: Bytes::from(data.into_vec()),
                    });
                }
                if end_stream {
                    events.push(CodecEvent::MessageComplete {
                        stream,
                        upgrade: false,
                    });
                }
            }
            Payload::Settings(settings) => {
                if is_ack {
                    events.push(CodecEvent::SettingsAck);
                } else {
                    for setting in settings.get_settings() {
                        if let Setting::MaxFrameSize(size) = setting {
                            self.encoder.set_max_frame_size(*size as usize);
                            self.decoder.set_max_frame_size(*size as usize);
                        }
                    }
                    events.push(CodecEvent::Settings {
                        settings: settings.get_settings().to_vec(),
                    });
                }
            }
            Payload::Ping(ping) => {
                if is_ack {
                    events.push(CodecEvent::PingReply { data: ping.data() });
                } else {
                    events.push(CodecEvent::PingRequest { data: ping.data() });
                }
            }
            Payload::Goaway(goaway) => {
                self.goaway_received = true;
                let code = ErrorCode::try_from(goaway.get_error_code())
                    .unwrap_or(ErrorCode::ProtocolError);
                events.push(CodecEvent::Goaway {
                    last_good: goaway.get_last_stream_id(),
                    code,
                    debug: goaway.get_debug_data().to_vec(),
                });
            }
            Payload::RstStream(reset) => {
                let code =
                    ErrorCode::try_from(reset.error_code()).unwrap_or(ErrorCode::ProtocolError);
                events.push(CodecEvent::Abort { stream, code });
            }
            Payload::WindowUpdate(update) => {
                events.push(CodecEvent::WindowUpdate {
                    stream,
                    delta: update.get_increment(),
                });
            }
            // PRIORITY from the peer is kept compatible but not processed.
            Payload::Priority(_) => {}
            Payload::PushPromise(promise) => {
                let promised = promise.promised_stream_id();
                let msg = promise.into_parts().into_message()?;
                events.push(CodecEvent::PushMessageBegin {
                    stream: promised,
                    assoc: stream,
                });
                events.push(CodecEvent::HeadersComplete {
                    stream: promised,
                    msg,
                });
            }
        }
        Ok(())
    }
}

impl SessionCodec for Http2Codec {
    fn protocol(&self) -> Protocol {
        Protocol::Http2
    }

    fn supports_parallel_requests(&self) -> bool {
        true
    }

    fn supports_stream_flow_control(&self) -> bool {
        true
    }

    fn supports_session_flow_control(&self) -> bool {
        true
    }

    fn default_window_size(&self) -> u32 {
        DEFAULT_WINDOW_SIZE
    }

    fn is_reusable(&self) -> bool {
        !self.goaway_received && self.next_stream_id < MAX_STREAM_ID
    }

    fn is_waiting_to_drain(&self) -> bool {
        self.goaway_received
    }

    fn create_stream(&mut self) -> StreamId {
        let id = self.next_stream_id;
        if self.next_stream_id < MAX_STREAM_ID {
            self.next_stream_id += 2;
        }
        id
    }

    fn on_ingress(&mut self, buf: &[u8]) -> Result<(usize, Vec<CodecEvent>), HttpError> {
        let frames = self.decoder.decode(buf).map_err(HttpError::from)?;
        let mut events = Vec::new();
        for frame in frames {
            self.map_frame(frame, &mut events)?;
        }
        Ok((buf.len(), events))
    }

    fn on_ingress_eof(&mut self) -> Vec<CodecEvent> {
        Vec::new()
    }

    fn generate_connection_preface(&mut self, buf: &mut BytesMut) -> usize {
        buf.put_slice(CONNECTION_PREFACE);
        CONNECTION_PREFACE.len()
    }

    fn generate_settings(&mut self, buf: &mut BytesMut, settings: &[Setting]) -> usize {
        let frame = Frame::new(
            0,
            FrameFlags::empty(),
            Payload::Settings(Settings::new(settings.to_vec())),
        );
        self.encoder.encode(&frame, buf).unwrap_or(0)
    }

    fn generate_settings_ack(&mut self, buf: &mut BytesMut) -> usize {
        self.encoder.encode(&Settings::ack(), buf).unwrap_or(0)
    }

    fn generate_header(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        msg: &Message,
        eom: bool,
    ) -> Result<usize, HttpError> {
        let mut flags = FrameFlags::empty();
        flags.set_end_stream(eom);
        let parts = Parts::from_message(msg);
        let frame = Frame::new(
            id,
            flags,
            Payload::Headers(ylong_http_codec::h2::Headers::new(parts)),
        );
        self.encoder.encode(&frame, buf).map_err(HttpError::from)
    }

    fn generate_body(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        data: &[u8],
        padding: Option<u8>,
        eom: bool,
    ) -> usize {
        self.encoder.encode_data(id, data, padding, eom, buf)
    }

    fn generate_eom(&mut self, buf: &mut BytesMut, id: StreamId) -> usize {
        self.encoder.encode_data(id, &[], None, true, buf)
    }

    fn generate_rst_stream(&mut self, buf: &mut BytesMut, id: StreamId, code: ErrorCode) -> usize {
        let frame = Frame::new(
            id,
            FrameFlags::empty(),
            Payload::RstStream(RstStream::new(code.into_code())),
        );
        self.encoder.encode(&frame, buf).unwrap_or(0)
    }

    fn generate_goaway(
        &mut self,
        buf: &mut BytesMut,
        last_good: StreamId,
        code: ErrorCode,
        debug: &[u8],
    ) -> usize {
        let frame = Frame::new(
            0,
            FrameFlags::empty(),
            Payload::Goaway(Goaway::new(code.into_code(), last_good, debug.to_vec())),
        );
        self.encoder.encode(&frame, buf).unwrap_or(0)
    }

    fn generate_window_update(&mut self, buf: &mut BytesMut, id: StreamId, delta: u32) -> usize {
        let frame = Frame::new(
            id,
            FrameFlags::empty(),
            Payload::WindowUpdate(WindowUpdate::new(delta)),
        );
        self.encoder.encode(&frame, buf).unwrap_or(0)
    }

    fn generate_priority(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        pri: &PriorityUpdate,
    ) -> usize {
        let weight = pri.weight.clamp(1, 256) - 1;
        let frame = Frame::new(
            id,
            FrameFlags::empty(),
            Payload::Priority(Priority::new(pri.exclusive, pri.parent, weight as u8)),
        );
        self.encoder.encode(&frame, buf).unwrap_or(0)
    }

    fn generate_ping_reply(&mut self, buf: &mut BytesMut, data: [u8; 8]) -> usize {
        self.encoder
            .encode(&Ping::ack(Ping::new(data)), buf)
            .unwrap_or(0)
    }
}

/// Builds the SETTINGS a session sends when it starts an HTTP/2 connection.
pub(crate) fn create_initial_settings(initial_recv_window: u32) -> Vec<Setting> {
    SettingsBuilder::new()
        .header_table_size(4096)
        .enable_push(true)
        .max_frame_size(2 << 13)
        .initial_window_size(initial_recv_window)
        .build()
        .get_settings()
        .to_vec()
}

#[cfg(test)]
mod ut_http2_codec {
    use super::*;
    use ylong_http_codec::Method;

    /// UT test case for stream id minting, fresh and upgraded.
    ///
    /// # Brief
    /// 1. Mints ids on a fresh codec and on an upgraded codec.
    /// 2. Checks that the upgraded codec starts at stream 3.
    #[test]
    fn ut_h2_create_stream() {
        let mut codec = Http2Codec::new();
        assert_eq!(codec.create_stream(), 1);
        assert_eq!(codec.create_stream(), 3);

        let mut codec = Http2Codec::upgraded();
        assert_eq!(codec.create_stream(), 3);
        assert!(codec.supports_parallel_requests());
        assert!(codec.supports_stream_flow_control());
    }

    /// UT test case for a header/body ingress round trip.
    ///
    /// # Brief
    /// 1. Serializes a response head and body with a peer-side encoder.
    /// 2. Feeds the bytes and checks the emitted events.
    #[test]
    fn ut_h2_ingress_events() {
        // The peer serializes with the same frame layer.
        let mut peer = FrameEncoder::default();
        let mut wire = BytesMut::new();
        let mut resp = Message::response(ylong_http_codec::StatusCode::OK);
        resp.headers_mut().insert("x-field", "v").unwrap();
        let frame = Frame::new(
            1,
            FrameFlags::empty(),
            Payload::Headers(ylong_http_codec::h2::Headers::new(Parts::from_message(&resp))),
        );
        peer.encode(&frame, &mut wire).unwrap();
        peer.encode_data(1, b"hello", None, true, &mut wire);

        let mut codec = Http2Codec::new();
        let (consumed, events) = codec.on_ingress(&wire).unwrap();
        assert_eq!(consumed, wire.len());
        assert!(matches!(
            &events[0],
            CodecEvent::HeadersComplete { stream: 1, msg }
                if msg.status() == Some(ylong_http_codec::StatusCode::OK)
        ));
        assert!(matches!(
            &events[1],
            CodecEvent::Body { stream: 1, data } if &data[..] == b"hello"
        ));
        assert!(matches!(
            events[2],
            CodecEvent::MessageComplete { stream: 1, upgrade: false }
        ));
    }

    /// UT test case for GOAWAY mapping.
    ///
    /// # Brief
    /// 1. Feeds a GOAWAY frame.
    /// 2. Checks the event and that the codec stops being reusable.
    #[test]
    fn ut_h2_goaway() {
        let mut peer = FrameEncoder::default();
        let mut wire = BytesMut::new();
        peer.encode(
            &Frame::new(0, FrameFlags::empty(), Payload::Goaway(Goaway::new(0, 1, vec![]))),
            &mut wire,
        )
        .unwrap();

        let mut codec = Http2Codec::new();
        assert!(codec.is_reusable());
        let (_, events) = codec.on_ingress(&wire).unwrap();
        assert!(matches!(
            events[0],
            CodecEvent::Goaway { last_good: 1, code: ErrorCode::NoError, .. }
        ));
        assert!(!codec.is_reusable());
        assert!(codec.is_waiting_to_drain());
    }

    /// UT test case for the request head round trip through the field block.
    ///
    /// # Brief
    /// 1. Generates a request head and parses it back with a server-side
    ///    decoder.
    /// 2. Checks the preface and structural equality of the head.
    #[test]
    fn ut_h2_header_round_trip() {
        let mut codec = Http2Codec::new();
        let mut wire = BytesMut::new();
        codec.generate_connection_preface(&mut wire);
        let mut req = Message::request(Method::GET, "/res");
        req.headers_mut().insert("host", "example.com").unwrap();
        codec.generate_header(&mut wire, 1, &req, true).unwrap();

        let mut server = FrameDecoder::with_preface();
        let frames = server.decode(&wire).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(frames[0].flags().is_end_stream());
        match frames[0].payload() {
            Payload::Headers(headers) => {
                let (pseudo, _) = headers.parts();
                assert_eq!(pseudo.method(), Some("GET"));
                assert_eq!(pseudo.path(), Some("/res"));
                assert_eq!(pseudo.authority(), Some("example.com"));
            }
            _ => panic!("expected HEADERS"),
        }
    }
}
