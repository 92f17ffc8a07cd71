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

use crate::h2::StreamId;
use crate::headers;
use crate::message::Message;
use crate::method::Method;
use crate::status::StatusCode;
use crate::version::Version;

/// Mask for the END_STREAM flag.
pub(crate) const END_STREAM_MASK: u8 = 0x01;

/// Mask for the END_HEADERS flag.
pub(crate) const END_HEADERS_MASK: u8 = 0x04;

/// Mask for the PADDED flag.
pub(crate) const PADDED_MASK: u8 = 0x08;

/// Mask for the HEADERS_PRIORITY flag.
pub(crate) const HEADERS_PRIORITY_MASK: u8 = 0x20;

/// Mask for the ACK flag.
pub(crate) const ACK_MASK: u8 = 0x01;

/// HTTP/2 frame structure, including the stream ID, flags, and payload
/// information. The frame type is carried by the `Payload` variant.
#[derive(Clone)]
pub struct Frame {
    id: StreamId,
    flags: FrameFlags,
    payload: Payload,
}

/// Enum representing the type of an HTTP/2 frame.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum FrameType {
    /// DATA frame.
    Data = 0x0,
    /// HEADERS frame.
    Headers = 0x1,
    /// PRIORITY frame.
    Priority = 0x2,
    /// RST_STREAM frame.
    RstStream = 0x3,
    /// SETTINGS frame.
    Settings = 0x4,
    /// PUSH_PROMISE frame.
    PushPromise = 0x5,
    /// PING frame.
    Ping = 0x6,
    /// GOAWAY frame.
    Goaway = 0x7,
    /// WINDOW_UPDATE frame.
    WindowUpdate = 0x8,
}

/// Enum representing the payload of an HTTP/2 frame.
#[derive(Clone)]
pub enum Payload {
    /// HEADERS frame payload.
    Headers(Headers),
    /// DATA frame payload.
    Data(Data),
    /// PRIORITY frame payload.
    Priority(Priority),
    /// RST_STREAM frame payload.
    RstStream(RstStream),
    /// PING frame payload.
    Ping(Ping),
    /// SETTINGS frame payload.
    Settings(Settings),
    /// GOAWAY frame payload.
    Goaway(Goaway),
    /// WINDOW_UPDATE frame payload.
    WindowUpdate(WindowUpdate),
    /// PUSH_PROMISE frame payload.
    PushPromise(PushPromise),
}

/// Enum representing the settings that can appear in a SETTINGS frame.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Setting {
    /// SETTINGS_HEADER_TABLE_SIZE
    HeaderTableSize(u32),
    /// SETTINGS_ENABLE_PUSH
    EnablePush(bool),
    /// SETTINGS_MAX_CONCURRENT_STREAMS
    MaxConcurrentStreams(u32),
    /// SETTINGS_INITIAL_WINDOW_SIZE
    InitialWindowSize(u32),
    /// SETTINGS_MAX_FRAME_SIZE
    MaxFrameSize(u32),
    /// SETTINGS_MAX_HEADER_LIST_SIZE
    MaxHeaderListSize(u32),
}

/// HTTP/2 frame flags.
#[derive(Clone)]
pub struct FrameFlags(u8);

/// HTTP/2 HEADERS frame payload: pseudo headers plus regular field lines.
#[derive(Clone)]
pub struct Headers {
    parts: Parts,
}

/// HTTP/2 DATA frame payload, after padding has been removed.
#[derive(Clone)]
pub struct Data {
    data: Vec<u8>,
}

/// PRIORITY frame payload: the sender-advised priority of a stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Priority {
    exclusive: bool,
    stream_dependency: u32,
    weight: u8,
}

/// RST_STREAM frame payload, requesting immediate stream termination.
#[derive(Clone)]
pub struct RstStream {
    error_code: u32,
}

/// PING frame payload.
#[derive(Clone)]
pub struct Ping {
    /// The opaque data of PING.
    pub data: [u8; 8],
}

/// SETTINGS frame payload.
#[derive(Clone)]
pub struct Settings {
    settings: Vec<Setting>,
}

/// GOAWAY frame payload, initiating shutdown of a connection.
#[derive(Clone)]
pub struct Goaway {
    error_code: u32,
    last_stream_id: StreamId,
    debug_data: Vec<u8>,
}

/// WINDOW_UPDATE frame payload, implementing flow control.
#[derive(Clone)]
pub struct WindowUpdate {
    window_size_increment: u32,
}

/// PUSH_PROMISE frame payload, announcing a server-initiated stream.
#[derive(Clone)]
pub struct PushPromise {
    promised_stream_id: StreamId,
    parts: Parts,
}

/// A builder of SETTINGS payloads.
pub struct SettingsBuilder {
    settings: Vec<Setting>,
}

/// HTTP/2 header-block content: pseudo headers plus regular field lines.
#[derive(Clone, Default)]
pub struct Parts {
    pub(crate) pseudo: PseudoHeaders,
    pub(crate) map: headers::Headers,
}

/// Pseudo-header fields beginning with `:` that replace the HTTP/1 start
/// line.
#[derive(Clone, Default, Debug)]
pub struct PseudoHeaders {
    authority: Option<String>,
    method: Option<String>,
    path: Option<String>,
    scheme: Option<String>,
    status: Option<String>,
}

impl Frame {
    /// Constructs a new `Frame`.
    pub fn new(id: StreamId, flags: FrameFlags, payload: Payload) -> Self {
        Frame { id, flags, payload }
    }

    /// Returns the stream identifier of the frame.
    pub fn stream_id(&self) -> StreamId {
        self.id
    }

    /// Returns a reference to the frame's flags.
    pub fn flags(&self) -> &FrameFlags {
        &self.flags
    }

    /// Returns a reference to the frame's payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Consumes the frame, returning its payload.
    pub fn into_payload(self) -> Payload {
        self.payload
    }
}

impl FrameFlags {
    /// Creates a new `FrameFlags` from a flags byte.
    pub fn new(flags: u8) -> Self {
        FrameFlags(flags)
    }

    /// Creates a `FrameFlags` with no flags set.
    pub fn empty() -> Self {
        FrameFlags(0)
    }

    /// Returns `true` if the END_STREAM flag is set.
    pub fn is_end_stream(&self) -> bool {
        self.0 & END_STREAM_MASK == END_STREAM_MASK
    }

    /// Returns `true` if the END_HEADERS flag is set.
    pub fn is_end_headers(&self) -> bool {
        self.0 & END_HEADERS_MASK == END_HEADERS_MASK
    }

    /// Returns `true` if the PADDED flag is set.
    pub fn is_padded(&self) -> bool {
        self.0 & PADDED_MASK == PADDED_MASK
    }

    /// Returns `true` if the ACK flag is set.
    pub fn is_ack(&self) -> bool {
        self.0 & ACK_MASK == ACK_MASK
    }

    /// Gets the flags octet.
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Sets the END_STREAM flag.
    pub fn set_end_stream(&mut self, end_stream: bool) {
        if end_stream {
            self.0 |= END_STREAM_MASK;
        } else {
            self.0 &= !END_STREAM_MASK;
        }
    }

    /// Sets the END_HEADERS flag.
    pub fn set_end_headers(&mut self, end_headers: bool) {
        if end_headers {
            self.0 |= END_HEADERS_MASK;
        } else {
            self.0 &= !END_HEADERS_MASK;
        }
    }
}

impl Payload {
    /// Returns the frame type this payload is carried by.
    pub fn frame_type(&self) -> FrameType {
        match self {
            Payload::Headers(_) => FrameType::Headers,
            Payload::Data(_) => FrameType::Data,
            Payload::Priority(_) => FrameType::Priority,
            Payload::Ping(_) => FrameType::Ping,
            Payload::RstStream(_) => FrameType::RstStream,
            Payload::Settings(_) => FrameType::Settings,
            Payload::Goaway(_) => FrameType::Goaway,
            Payload::WindowUpdate(_) => FrameType::WindowUpdate,
            Payload::PushPromise(_) => FrameType::PushPromise,
        }
    }
}

impl Headers {
    /// Creates a new `Headers` payload from the provided `Parts`.
    pub fn new(parts: Parts) -> Self {
        Headers { parts }
    }

    /// Returns pseudo headers and regular headers.
    pub fn parts(&self) -> (&PseudoHeaders, &headers::Headers) {
        self.parts.parts()
    }

    /// Consumes the payload, returning its `Parts`.
    pub fn into_parts(self) -> Parts {
        self.parts
    }
}

impl Data {
    /// Creates a new `Data` payload.
    pub fn new(data: Vec<u8>) -> Self {
        Data { data }
    }

    /// Returns the data bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the number of bytes in the payload.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Consumes the payload, returning the data bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Settings {
    /// Creates a new `Settings` payload.
    pub fn new(settings: Vec<Setting>) -> Self {
        Settings { settings }
    }

    /// Returns a slice of the settings.
    pub fn get_settings(&self) -> &[Setting] {
        &self.settings
    }

    /// Returns an ACK SETTINGS frame.
    pub fn ack() -> Frame {
        Frame::new(
            0,
            FrameFlags::new(ACK_MASK),
            Payload::Settings(Settings::new(vec![])),
        )
    }
}

impl Setting {
    /// Returns the identifier associated with the setting.
    pub fn setting_identifier(&self) -> u16 {
        match self {
            Setting::HeaderTableSize(_) => 0x01,
            Setting::EnablePush(_) => 0x02,
            Setting::MaxConcurrentStreams(_) => 0x03,
            Setting::InitialWindowSize(_) => 0x04,
            Setting::MaxFrameSize(_) => 0x05,
            Setting::MaxHeaderListSize(_) => 0x06,
        }
    }

    /// Returns the wire value of the setting.
    pub fn value(&self) -> u32 {
        match self {
            Setting::HeaderTableSize(v) => *v,
            Setting::EnablePush(v) => u32::from(*v),
            Setting::MaxConcurrentStreams(v) => *v,
            Setting::InitialWindowSize(v) => *v,
            Setting::MaxFrameSize(v) => *v,
            Setting::MaxHeaderListSize(v) => *v,
        }
    }
}

impl SettingsBuilder {
    /// `SettingsBuilder` constructor.
    pub fn new() -> Self {
        SettingsBuilder { settings: vec![] }
    }

    /// SETTINGS_HEADER_TABLE_SIZE (0x01) setting.
    pub fn header_table_size(mut self, size: u32) -> Self {
        self.settings.push(Setting::HeaderTableSize(size));
        self
    }

    /// SETTINGS_ENABLE_PUSH (0x02) setting.
    pub fn enable_push(mut self, is_enable: bool) -> Self {
        self.settings.push(Setting::EnablePush(is_enable));
        self
    }

    /// SETTINGS_MAX_CONCURRENT_STREAMS (0x03) setting.
    pub fn max_concurrent_streams(mut self, num: u32) -> Self {
        self.settings.push(Setting::MaxConcurrentStreams(num));
        self
    }

    /// SETTINGS_INITIAL_WINDOW_SIZE (0x04) setting.
    pub fn initial_window_size(mut self, size: u32) -> Self {
        self.settings.push(Setting::InitialWindowSize(size));
        self
    }

    /// SETTINGS_MAX_FRAME_SIZE (0x05) setting.
    pub fn max_frame_size(mut self, size: u32) -> Self {
        self.settings.push(Setting::MaxFrameSize(size));
        self
    }

    /// Consumes the builder and constructs a SETTINGS payload.
    pub fn build(self) -> Settings {
        Settings::new(self.settings)
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Goaway {
    /// Creates a new `Goaway` payload.
    pub fn new(error_code: u32, last_stream_id: StreamId, debug_data: Vec<u8>) -> Self {
        Goaway {
            error_code,
            last_stream_id,
            debug_data,
        }
    }

    /// Returns a slice of the debug data.
    pub fn get_debug_data(&self) -> &[u8] {
        &self.debug_data
    }

    /// Returns the identifier of the last stream processed by the sender.
    pub fn get_last_stream_id(&self) -> StreamId {
        self.last_stream_id
    }

    /// Returns the error code.
    pub fn get_error_code(&self) -> u32 {
        self.error_code
    }
}

impl WindowUpdate {
    /// Creates a new `WindowUpdate` payload.
    pub fn new(window_size_increment: u32) -> Self {
        WindowUpdate {
            window_size_increment,
        }
    }

    /// Returns the window size increment.
    pub fn get_increment(&self) -> u32 {
        self.window_size_increment
    }
}

impl Priority {
    /// Creates a new `Priority` payload.
    pub fn new(exclusive: bool, stream_dependency: u32, weight: u8) -> Self {
        Priority {
            exclusive,
            stream_dependency,
            weight,
        }
    }

    /// Returns whether the dependency is exclusive.
    pub fn get_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Returns the stream this stream depends on.
    pub fn get_stream_dependency(&self) -> u32 {
        self.stream_dependency
    }

    /// Returns the weight of the stream.
    pub fn get_weight(&self) -> u8 {
        self.weight
    }
}

impl RstStream {
    /// Creates a new `RstStream` payload.
    pub fn new(error_code: u32) -> Self {
        Self { error_code }
    }

    /// Returns the error code of the reset.
    pub fn error_code(&self) -> u32 {
        self.error_code
    }
}

impl Ping {
    /// Creates a new `Ping` payload.
    pub fn new(data: [u8; 8]) -> Self {
        Ping { data }
    }

    /// Returns the opaque data.
    pub fn data(&self) -> [u8; 8] {
        self.data
    }

    /// Returns an ACK PING frame for the given ping.
    pub fn ack(ping: Ping) -> Frame {
        Frame::new(0, FrameFlags::new(ACK_MASK), Payload::Ping(ping))
    }
}

impl PushPromise {
    /// `PushPromise` constructor.
    pub fn new(promised_stream_id: StreamId, parts: Parts) -> Self {
        Self {
            promised_stream_id,
            parts,
        }
    }

    /// Returns the promised stream id.
    pub fn promised_stream_id(&self) -> StreamId {
        self.promised_stream_id
    }

    /// Returns pseudo headers and regular headers of the promised request.
    pub fn parts(&self) -> (&PseudoHeaders, &headers::Headers) {
        self.parts.parts()
    }

    /// Consumes the payload, returning its `Parts`.
    pub fn into_parts(self) -> Parts {
        self.parts
    }
}

impl Parts {
    /// The constructor of `Parts`.
    pub fn new() -> Self {
        Self {
            pseudo: PseudoHeaders::default(),
            map: headers::Headers::new(),
        }
    }

    /// Sets pseudo headers for `Parts`.
    pub fn set_pseudo(&mut self, pseudo: PseudoHeaders) {
        self.pseudo = pseudo;
    }

    /// Sets regular field lines for `Parts`.
    pub fn set_header_lines(&mut self, headers: headers::Headers) {
        self.map = headers;
    }

    /// Returns pseudo headers and regular headers as a tuple.
    pub fn parts(&self) -> (&PseudoHeaders, &headers::Headers) {
        (&self.pseudo, &self.map)
    }

    /// Builds the `Parts` of a request or response head.
    pub fn from_message(msg: &Message) -> Self {
        let mut pseudo = PseudoHeaders::default();
        if msg.is_request() {
            if let Some(method) = msg.method() {
                pseudo.set_method(Some(method.as_str().to_string()));
            }
            pseudo.set_path(msg.path().map(|p| p.to_string()));
            pseudo.set_scheme(Some("http".to_string()));
            if let Some(host) = msg.headers().get("host").and_then(|v| v.to_string().ok()) {
                pseudo.set_authority(Some(host));
            }
        } else if let Some(status) = msg.status() {
            pseudo.set_status(Some(status.as_u16().to_string()));
        }
        let mut map = msg.headers().clone();
        // Connection-specific fields do not transit HTTP/2.
        for name in ["connection", "host", "keep-alive", "transfer-encoding", "upgrade"] {
            map.remove(name);
        }
        Self { pseudo, map }
    }

    /// Rebuilds a `Message` from this header block.
    pub fn into_message(self) -> Result<Message, crate::error::HttpError> {
        use crate::error::ErrorKind;
        let mut msg = if let Some(status) = self.pseudo.status() {
            Message::response(StatusCode::from_bytes(status.as_bytes())?)
        } else {
            let method = self
                .pseudo
                .method()
                .ok_or(crate::error::HttpError::from(ErrorKind::Header))?;
            let method = Method::from_bytes(method.as_bytes())?;
            let path = self.pseudo.path().unwrap_or("/").to_string();
            Message::request(method, &path)
        };
        msg.set_version(Version::HTTP2);
        *msg.headers_mut() = self.map;
        Ok(msg)
    }
}

impl PseudoHeaders {
    /// Gets the `:authority` value.
    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    /// Sets the `:authority` value.
    pub fn set_authority(&mut self, authority: Option<String>) {
        self.authority = authority;
    }

    /// Gets the `:method` value.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Sets the `:method` value.
    pub fn set_method(&mut self, method: Option<String>) {
        self.method = method;
    }

    /// Gets the `:path` value.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Sets the `:path` value.
    pub fn set_path(&mut self, path: Option<String>) {
        self.path = path;
    }

    /// Gets the `:scheme` value.
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Sets the `:scheme` value.
    pub fn set_scheme(&mut self, scheme: Option<String>) {
        self.scheme = scheme;
    }

    /// Gets the `:status` value.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Sets the `:status` value.
    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status;
    }

    pub(crate) fn field_list(&self) -> Vec<(&'static str, &str)> {
        let mut list = Vec::new();
        if let Some(ref v) = self.method {
            list.push((":method", v.as_str()));
        }
        if let Some(ref v) = self.scheme {
            list.push((":scheme", v.as_str()));
        }
        if let Some(ref v) = self.authority {
            list.push((":authority", v.as_str()));
        }
        if let Some(ref v) = self.path {
            list.push((":path", v.as_str()));
        }
        if let Some(ref v) = self.status {
            list.push((":status", v.as_str()));
        }
        list
    }
}
