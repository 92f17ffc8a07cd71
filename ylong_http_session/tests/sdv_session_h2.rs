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

mod common;

use common::{HandlerEvent, MockTransport, TestHandler, TestInfo};
use bytes::BytesMut;
use ylong_http_codec::h2::{
    Frame, FrameDecoder, FrameEncoder, FrameFlags, Headers as H2Headers, Parts, Payload, Ping,
    Setting, Settings, SettingsBuilder,
};
use ylong_http_codec::{Message, Method, StatusCode};
use ylong_http_session::{Http2Codec, Session};

fn new_h2_session() -> (Session, common::TransportHandle, common::InfoLog) {
    let (transport, transport_handle) = MockTransport::new();
    let (info, info_log) = TestInfo::new();
    let mut session = Session::new(transport, Box::new(Http2Codec::new()), info);
    session.set_max_concurrent_outgoing_streams(10);
    session.start_now();
    (session, transport_handle, info_log)
}

fn peer_response(stream: u32, status: StatusCode, body: &[u8]) -> Vec<u8> {
    let mut encoder = FrameEncoder::default();
    let mut wire = BytesMut::new();
    let resp = Message::response(status);
    encoder
        .encode(
            &Frame::new(
                stream,
                FrameFlags::empty(),
                Payload::Headers(H2Headers::new(Parts::from_message(&resp))),
            ),
            &mut wire,
        )
        .unwrap();
    encoder.encode_data(stream, body, None, true, &mut wire);
    wire.to_vec()
}

/// SDV test case for a request round trip through real HTTP/2 codecs.
///
/// # Brief
/// 1. Sends a request with a body; a server-side frame decoder parses
///    everything the session wrote.
/// 2. Checks structural equality of the parsed head and body, then feeds a
///    response back and checks the handler events.
#[test]
fn sdv_h2_round_trip() {
    let (mut session, transport, _info) = new_h2_session();
    let (handler, log) = TestHandler::new();
    let id = session.new_transaction(handler).unwrap();
    assert_eq!(id, 1);

    let mut req = Message::request(Method::POST, "/res");
    req.headers_mut().insert("host", "example.com").unwrap();
    req.headers_mut().insert("x-marker", "42").unwrap();
    session.txn(id).unwrap().send_headers(req).unwrap();
    session.txn(id).unwrap().send_body(b"request body");
    session.txn(id).unwrap().send_eom();

    // The server parses the preface, SETTINGS, HEADERS and DATA.
    let mut server = FrameDecoder::with_preface();
    let frames = server.decode(&transport.take_written()).unwrap();
    assert!(matches!(frames[0].payload(), Payload::Settings(_)));
    let mut body = Vec::new();
    let mut saw_head = false;
    let mut saw_eos = false;
    for frame in &frames[1..] {
        match frame.payload() {
            Payload::Headers(headers) => {
                let (pseudo, fields) = headers.parts();
                assert_eq!(pseudo.method(), Some("POST"));
                assert_eq!(pseudo.path(), Some("/res"));
                assert_eq!(pseudo.authority(), Some("example.com"));
                assert_eq!(
                    fields.get("x-marker").unwrap().to_string().unwrap(),
                    "42"
                );
                saw_head = true;
            }
            Payload::Data(data) => {
                body.extend_from_slice(data.data());
                saw_eos |= frame.flags().is_end_stream();
            }
            _ => {}
        }
    }
    assert!(saw_head);
    assert!(saw_eos);
    assert_eq!(body, b"request body");

    session.on_read(&peer_response(1, StatusCode::OK, &[b'q'; 100]));
    assert_eq!(log.statuses(), [200]);
    assert_eq!(log.body_bytes(), 100);
    assert!(log.contains(&HandlerEvent::Eom));
    assert!(log.contains(&HandlerEvent::Detach(1)));
}

/// SDV test case for two multiplexed transactions.
///
/// # Brief
/// 1. Opens streams 1 and 3 concurrently; responses arrive out of order.
/// 2. Checks each handler only sees its own stream's events.
#[test]
fn sdv_h2_multiplexed_transactions() {
    let (mut session, _transport, _info) = new_h2_session();
    let (h1, log1) = TestHandler::new();
    let (h2, log2) = TestHandler::new();
    let t1 = session.new_transaction(h1).unwrap();
    let t2 = session.new_transaction(h2).unwrap();
    assert_eq!((t1, t2), (1, 3));
    let req = Message::request(Method::GET, "/");
    session.txn(t1).unwrap().send_headers_eom(req.clone()).unwrap();
    session.txn(t2).unwrap().send_headers_eom(req).unwrap();

    session.on_read(&peer_response(3, StatusCode::NOT_FOUND, b""));
    session.on_read(&peer_response(1, StatusCode::OK, b""));
    assert_eq!(log2.statuses(), [404]);
    assert_eq!(log1.statuses(), [200]);
    assert!(log1.contains(&HandlerEvent::Detach(1)));
    assert!(log2.contains(&HandlerEvent::Detach(3)));
    assert_eq!(session.num_outgoing_streams(), 0);
}

/// SDV test case for answering peer pings.
///
/// # Brief
/// 1. Feeds a PING request from the peer.
/// 2. Checks the session writes a PING reply with the same payload.
#[test]
fn sdv_h2_ping_reply() {
    let (mut session, transport, _info) = new_h2_session();
    transport.take_written();

    let mut encoder = FrameEncoder::default();
    let mut wire = BytesMut::new();
    encoder
        .encode(
            &Frame::new(0, FrameFlags::empty(), Payload::Ping(Ping::new([3; 8]))),
            &mut wire,
        )
        .unwrap();
    session.on_read(&wire);

    let mut server = FrameDecoder::new();
    let frames = server.decode(&transport.written()).unwrap();
    let pong = frames
        .iter()
        .find(|f| matches!(f.payload(), Payload::Ping(_)))
        .expect("missing ping reply");
    assert!(pong.flags().is_ack());
    assert!(matches!(pong.payload(), Payload::Ping(p) if p.data() == [3; 8]));
}

/// SDV test case for the peer SETTINGS acknowledgement.
///
/// # Brief
/// 1. Feeds a peer SETTINGS frame.
/// 2. Checks the session acknowledges it.
#[test]
fn sdv_h2_settings_ack() {
    let (mut session, transport, info) = new_h2_session();
    transport.take_written();

    let mut encoder = FrameEncoder::default();
    let mut wire = BytesMut::new();
    let settings = SettingsBuilder::new()
        .max_concurrent_streams(100)
        .initial_window_size(65535)
        .build();
    encoder
        .encode(
            &Frame::new(0, FrameFlags::empty(), Payload::Settings(settings)),
            &mut wire,
        )
        .unwrap();
    session.on_read(&wire);
    assert!(info.contains(&common::InfoEvent::Settings));

    let mut server = FrameDecoder::new();
    let frames = server.decode(&transport.written()).unwrap();
    assert!(frames
        .iter()
        .any(|f| matches!(f.payload(), Payload::Settings(_)) && f.flags().is_ack()));

    // Our own SETTINGS get acknowledged too.
    let mut wire = BytesMut::new();
    encoder.encode(&Settings::ack(), &mut wire).unwrap();
    session.on_read(&wire);
    assert!(info.contains(&common::InfoEvent::SettingsAck));
}

/// SDV test case for the peer shrinking the initial send window.
///
/// # Brief
/// 1. The peer sets INITIAL_WINDOW_SIZE to 8; a 20-byte body only partially
///    drains.
/// 2. A WINDOW_UPDATE grant releases the rest.
#[test]
fn sdv_h2_initial_window_gates_body() {
    let (mut session, transport, info) = new_h2_session();
    let (handler, _log) = TestHandler::new();
    let id = session.new_transaction(handler).unwrap();

    let mut encoder = FrameEncoder::default();
    let mut wire = BytesMut::new();
    encoder
        .encode(
            &Frame::new(
                0,
                FrameFlags::empty(),
                Payload::Settings(Settings::new(vec![Setting::InitialWindowSize(8)])),
            ),
            &mut wire,
        )
        .unwrap();
    session.on_read(&wire);

    let mut req = Message::request(Method::POST, "/upload");
    req.headers_mut().insert("host", "example.com").unwrap();
    session.txn(id).unwrap().send_headers(req).unwrap();
    transport.take_written();
    session.txn(id).unwrap().send_body(&[b'z'; 20]);
    session.txn(id).unwrap().send_eom();
    assert!(info.contains(&common::InfoEvent::WindowExhausted));

    let data_len = |bytes: &[u8]| -> usize {
        let mut server = FrameDecoder::new();
        server
            .decode(bytes)
            .unwrap()
            .iter()
            .map(|f| match f.payload() {
                Payload::Data(d) => d.size(),
                _ => 0,
            })
            .sum()
    };
    assert_eq!(data_len(&transport.take_written()), 8);

    let mut wire = BytesMut::new();
    encoder
        .encode(
            &Frame::new(
                1,
                FrameFlags::empty(),
                Payload::WindowUpdate(ylong_http_codec::h2::WindowUpdate::new(12)),
            ),
            &mut wire,
        )
        .unwrap();
    session.on_read(&wire);
    assert_eq!(data_len(&transport.take_written()), 12);
    assert!(session.txn(id).unwrap().is_egress_complete());
}

/// SDV test case for zero max concurrent streams over the wire.
///
/// # Brief
/// 1. The peer sets MAX_CONCURRENT_STREAMS to 0.
/// 2. Checks the session reports full and drains with a GOAWAY.
#[test]
fn sdv_h2_zero_max_concurrent_drains() {
    let (mut session, transport, info) = new_h2_session();
    transport.take_written();

    let mut encoder = FrameEncoder::default();
    let mut wire = BytesMut::new();
    encoder
        .encode(
            &Frame::new(
                0,
                FrameFlags::empty(),
                Payload::Settings(Settings::new(vec![Setting::MaxConcurrentStreams(0)])),
            ),
            &mut wire,
        )
        .unwrap();
    session.on_read(&wire);

    assert!(info.contains(&common::InfoEvent::StreamsFull));
    let mut server = FrameDecoder::new();
    let frames = server.decode(&transport.written()).unwrap();
    assert!(frames
        .iter()
        .any(|f| matches!(f.payload(), Payload::Goaway(_))));
    let (handler, _) = TestHandler::new();
    assert!(session.new_transaction(handler).is_none());
}
