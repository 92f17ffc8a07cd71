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

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use bytes::{BufMut, Bytes, BytesMut};
use ylong_http_codec::h2::{ErrorCode, Setting, StreamId};
use ylong_http_codec::{HttpError, Message};
use ylong_http_session::{
    CodecEvent, InfoCallback, PriorityUpdate, Protocol, SessionCodec, TransactionHandler,
    Transport, TxnHandle,
};

// ===== transport =====

#[derive(Default)]
pub struct TransportInner {
    pub written: Vec<u8>,
    pub pause_writes: bool,
    pub fail_writes: bool,
    pub closed: bool,
}

pub struct MockTransport {
    inner: Rc<RefCell<TransportInner>>,
}

#[derive(Clone)]
pub struct TransportHandle {
    inner: Rc<RefCell<TransportInner>>,
}

impl MockTransport {
    pub fn new() -> (Box<dyn Transport>, TransportHandle) {
        let inner = Rc::new(RefCell::new(TransportInner::default()));
        (
            Box::new(MockTransport {
                inner: inner.clone(),
            }),
            TransportHandle { inner },
        )
    }
}

impl Transport for MockTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write failed"));
        }
        if inner.pause_writes {
            return Ok(0);
        }
        inner.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn close(&mut self) {
        self.inner.borrow_mut().closed = true;
    }

    fn is_good(&self) -> bool {
        !self.inner.borrow().closed
    }
}

impl TransportHandle {
    pub fn written(&self) -> Vec<u8> {
        self.inner.borrow().written.clone()
    }

    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.inner.borrow().written).to_string()
    }

    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.inner.borrow_mut().written)
    }

    pub fn set_pause_writes(&self, pause: bool) {
        self.inner.borrow_mut().pause_writes = pause;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }
}

// ===== transaction handler =====

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerEvent {
    Attach(StreamId),
    Headers { status: u16, chunked: bool },
    Body(usize),
    ChunkHeader(usize),
    ChunkComplete,
    Trailers,
    Eom,
    Error(String),
    Goaway(u32),
    EgressPaused,
    EgressResumed,
    Detach(StreamId),
}

#[derive(Clone, Default)]
pub struct HandlerLog {
    events: Rc<RefCell<Vec<HandlerEvent>>>,
}

impl HandlerLog {
    pub fn events(&self) -> Vec<HandlerEvent> {
        self.events.borrow().clone()
    }

    pub fn contains(&self, event: &HandlerEvent) -> bool {
        self.events.borrow().contains(event)
    }

    pub fn count(&self, event: &HandlerEvent) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }

    pub fn statuses(&self) -> Vec<u16> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                HandlerEvent::Headers { status, .. } => Some(*status),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                HandlerEvent::Error(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn body_bytes(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .map(|e| match e {
                HandlerEvent::Body(n) => *n,
                _ => 0,
            })
            .sum()
    }

    fn push(&self, event: HandlerEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub struct TestHandler {
    log: HandlerLog,
    // When set, pushed and exchanged streams are accepted with a handler
    // recording into this log.
    accept_streams: Option<HandlerLog>,
}

impl TestHandler {
    pub fn new() -> (Box<dyn TransactionHandler>, HandlerLog) {
        let log = HandlerLog::default();
        (
            Box::new(TestHandler {
                log: log.clone(),
                accept_streams: None,
            }),
            log,
        )
    }

    pub fn accepting() -> (Box<dyn TransactionHandler>, HandlerLog, HandlerLog) {
        let log = HandlerLog::default();
        let child = HandlerLog::default();
        (
            Box::new(TestHandler {
                log: log.clone(),
                accept_streams: Some(child.clone()),
            }),
            log,
            child,
        )
    }
}

impl TransactionHandler for TestHandler {
    fn on_attach(&mut self, id: StreamId) {
        self.log.push(HandlerEvent::Attach(id));
    }

    fn on_headers_complete(&mut self, _txn: &mut TxnHandle<'_>, msg: Message) {
        self.log.push(HandlerEvent::Headers {
            status: msg.status().map(|s| s.as_u16()).unwrap_or(0),
            chunked: msg.is_chunked(),
        });
    }

    fn on_body(&mut self, _txn: &mut TxnHandle<'_>, data: Bytes) {
        self.log.push(HandlerEvent::Body(data.len()));
    }

    fn on_chunk_header(&mut self, _txn: &mut TxnHandle<'_>, len: usize) {
        self.log.push(HandlerEvent::ChunkHeader(len));
    }

    fn on_chunk_complete(&mut self, _txn: &mut TxnHandle<'_>) {
        self.log.push(HandlerEvent::ChunkComplete);
    }

    fn on_trailers(&mut self, _txn: &mut TxnHandle<'_>, _trailers: ylong_http_codec::Headers) {
        self.log.push(HandlerEvent::Trailers);
    }

    fn on_eom(&mut self, _txn: &mut TxnHandle<'_>) {
        self.log.push(HandlerEvent::Eom);
    }

    fn on_error(&mut self, _txn: &mut TxnHandle<'_>, error: &ylong_http_session::SessionError) {
        self.log.push(HandlerEvent::Error(format!("{}", error)));
    }

    fn on_goaway(&mut self, _txn: &mut TxnHandle<'_>, code: ErrorCode) {
        self.log.push(HandlerEvent::Goaway(code.into_code()));
    }

    fn on_egress_paused(&mut self, _txn: &mut TxnHandle<'_>) {
        self.log.push(HandlerEvent::EgressPaused);
    }

    fn on_egress_resumed(&mut self, _txn: &mut TxnHandle<'_>) {
        self.log.push(HandlerEvent::EgressResumed);
    }

    fn on_push_stream(
        &mut self,
        _txn: &mut TxnHandle<'_>,
        _msg: &Message,
    ) -> Option<Box<dyn TransactionHandler>> {
        self.accept_streams.as_ref().map(|log| {
            Box::new(TestHandler {
                log: log.clone(),
                accept_streams: None,
            }) as Box<dyn TransactionHandler>
        })
    }

    fn on_ex_stream(
        &mut self,
        _txn: &mut TxnHandle<'_>,
        _msg: &Message,
    ) -> Option<Box<dyn TransactionHandler>> {
        self.accept_streams.as_ref().map(|log| {
            Box::new(TestHandler {
                log: log.clone(),
                accept_streams: None,
            }) as Box<dyn TransactionHandler>
        })
    }

    fn on_detach(&mut self, id: StreamId) {
        self.log.push(HandlerEvent::Detach(id));
    }
}

// ===== info callback =====

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InfoEvent {
    Create,
    Destroy,
    IngressMessage,
    Settings,
    SettingsAck,
    CodecChange,
    StreamsFull,
    StreamsNotFull,
    WindowExhausted,
}

#[derive(Clone, Default)]
pub struct InfoLog {
    events: Rc<RefCell<Vec<InfoEvent>>>,
}

impl InfoLog {
    pub fn events(&self) -> Vec<InfoEvent> {
        self.events.borrow().clone()
    }

    pub fn contains(&self, event: &InfoEvent) -> bool {
        self.events.borrow().contains(event)
    }

    pub fn count(&self, event: &InfoEvent) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }

    fn push(&self, event: InfoEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub struct TestInfo {
    log: InfoLog,
}

impl TestInfo {
    pub fn new() -> (Box<dyn InfoCallback>, InfoLog) {
        let log = InfoLog::default();
        (Box::new(TestInfo { log: log.clone() }), log)
    }
}

impl InfoCallback for TestInfo {
    fn on_create(&mut self) {
        self.log.push(InfoEvent::Create);
    }

    fn on_destroy(&mut self) {
        self.log.push(InfoEvent::Destroy);
    }

    fn on_ingress_message(&mut self) {
        self.log.push(InfoEvent::IngressMessage);
    }

    fn on_settings(&mut self, _settings: &[Setting]) {
        self.log.push(InfoEvent::Settings);
    }

    fn on_settings_ack(&mut self) {
        self.log.push(InfoEvent::SettingsAck);
    }

    fn on_session_codec_change(&mut self) {
        self.log.push(InfoEvent::CodecChange);
    }

    fn on_settings_outgoing_streams_full(&mut self) {
        self.log.push(InfoEvent::StreamsFull);
    }

    fn on_settings_outgoing_streams_not_full(&mut self) {
        self.log.push(InfoEvent::StreamsNotFull);
    }

    fn on_flow_control_window_exhausted(&mut self) {
        self.log.push(InfoEvent::WindowExhausted);
    }
}

// ===== scriptable codec =====

// A mock codec in the manner of the session's real codecs: egress calls emit
// readable markers into the write buffer and ingress events are scripted by
// the test, one batch per `on_read`.
#[derive(Clone, Default)]
pub struct CodecScript {
    batches: Rc<RefCell<VecDeque<Vec<CodecEvent>>>>,
}

impl CodecScript {
    pub fn push(&self, events: Vec<CodecEvent>) {
        self.batches.borrow_mut().push_back(events);
    }
}

pub struct MockCodec {
    script: CodecScript,
    next_stream_id: StreamId,
    stream_flow_control: bool,
    window_size: u32,
}

impl MockCodec {
    pub fn new() -> (Box<dyn SessionCodec>, CodecScript) {
        let script = CodecScript::default();
        (
            Box::new(MockCodec {
                script: script.clone(),
                next_stream_id: 1,
                stream_flow_control: false,
                window_size: 65535,
            }),
            script,
        )
    }

    pub fn with_flow_control(window_size: u32) -> (Box<dyn SessionCodec>, CodecScript) {
        let script = CodecScript::default();
        (
            Box::new(MockCodec {
                script: script.clone(),
                next_stream_id: 1,
                stream_flow_control: true,
                window_size,
            }),
            script,
        )
    }
}

impl SessionCodec for MockCodec {
    fn protocol(&self) -> Protocol {
        Protocol::Http2
    }

    fn supports_parallel_requests(&self) -> bool {
        true
    }

    fn supports_stream_flow_control(&self) -> bool {
        self.stream_flow_control
    }

    fn supports_session_flow_control(&self) -> bool {
        self.stream_flow_control
    }

    fn default_window_size(&self) -> u32 {
        self.window_size
    }

    fn is_reusable(&self) -> bool {
        true
    }

    fn create_stream(&mut self) -> StreamId {
        let id = self.next_stream_id;
        self.next_stream_id += 2;
        id
    }

    fn on_ingress(&mut self, buf: &[u8]) -> Result<(usize, Vec<CodecEvent>), HttpError> {
        let events = self.script.batches.borrow_mut().pop_front().unwrap_or_default();
        Ok((buf.len(), events))
    }

    fn on_ingress_eof(&mut self) -> Vec<CodecEvent> {
        Vec::new()
    }

    fn generate_connection_preface(&mut self, _buf: &mut BytesMut) -> usize {
        0
    }

    fn generate_settings(&mut self, buf: &mut BytesMut, _settings: &[Setting]) -> usize {
        buf.put_slice(b"SETTINGS");
        8
    }

    fn generate_settings_ack(&mut self, buf: &mut BytesMut) -> usize {
        buf.put_slice(b"SETTINGS_ACK");
        12
    }

    fn generate_header(
        &mut self,
        buf: &mut BytesMut,
        _id: StreamId,
        _msg: &Message,
        _eom: bool,
    ) -> Result<usize, HttpError> {
        buf.put_slice(b"HEADERS");
        Ok(7)
    }

    fn generate_ex_header(
        &mut self,
        buf: &mut BytesMut,
        _id: StreamId,
        _msg: &Message,
        control_stream: StreamId,
        _eom: bool,
    ) -> Result<usize, HttpError> {
        let marker = format!("EXHEADERS({})", control_stream);
        buf.put_slice(marker.as_bytes());
        Ok(marker.len())
    }

    fn generate_body(
        &mut self,
        buf: &mut BytesMut,
        _id: StreamId,
        data: &[u8],
        _padding: Option<u8>,
        _eom: bool,
    ) -> usize {
        let marker = format!("BODY({})", data.len());
        buf.put_slice(marker.as_bytes());
        marker.len()
    }

    fn generate_eom(&mut self, buf: &mut BytesMut, _id: StreamId) -> usize {
        buf.put_slice(b"EOM");
        3
    }

    fn generate_rst_stream(&mut self, buf: &mut BytesMut, id: StreamId, code: ErrorCode) -> usize {
        let marker = format!("RST({},{})", id, code.name());
        buf.put_slice(marker.as_bytes());
        marker.len()
    }

    fn generate_goaway(
        &mut self,
        buf: &mut BytesMut,
        _last_good: StreamId,
        _code: ErrorCode,
        _debug: &[u8],
    ) -> usize {
        buf.put_slice(b"GOAWAY");
        6
    }

    fn generate_window_update(&mut self, buf: &mut BytesMut, id: StreamId, delta: u32) -> usize {
        let marker = format!("WU({},{})", id, delta);
        buf.put_slice(marker.as_bytes());
        marker.len()
    }

    fn generate_priority(
        &mut self,
        buf: &mut BytesMut,
        id: StreamId,
        pri: &PriorityUpdate,
    ) -> usize {
        let marker = format!("PRI({},{},{})", id, pri.parent, pri.weight);
        buf.put_slice(marker.as_bytes());
        marker.len()
    }

    fn generate_ping_reply(&mut self, buf: &mut BytesMut, _data: [u8; 8]) -> usize {
        buf.put_slice(b"PONG");
        4
    }
}

// ===== helpers =====

/// Feeds a scripted event batch through the session's read path.
pub fn read_events(
    session: &mut ylong_http_session::Session,
    script: &CodecScript,
    events: Vec<CodecEvent>,
) {
    script.push(events);
    session.on_read(b"x");
}

/// A minimal server-side parse of an HTTP/1 request head, for round-trip
/// structural assertions.
pub fn parse_h1_request(bytes: &[u8]) -> (String, String, Vec<(String, String)>) {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.split("\r\n");
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split(' ');
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();
    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    (method, path, headers)
}
