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

//! HTTP/2 frame serialization.

use bytes::{BufMut, BytesMut};

use crate::h2::fieldblock::FieldBlockEncoder;
use crate::h2::frame::{
    Frame, FrameFlags, FrameType, Payload, END_HEADERS_MASK, PADDED_MASK,
};
use crate::h2::{ErrorCode, H2Error, StreamId, DEFAULT_MAX_FRAME_SIZE};

/// HTTP/2 frame encoder. Serializes [`Frame`]s into an output buffer.
pub struct FrameEncoder {
    max_frame_size: usize,
    field: FieldBlockEncoder,
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

impl FrameEncoder {
    /// Creates a `FrameEncoder` with the given maximum frame size.
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            field: FieldBlockEncoder::new(),
        }
    }

    /// Applies a peer SETTINGS_MAX_FRAME_SIZE update.
    pub fn set_max_frame_size(&mut self, size: usize) {
        self.max_frame_size = size;
    }

    /// Returns the current maximum frame size.
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Serializes one frame into `buf` and returns the number of bytes
    /// written. DATA payloads larger than the maximum frame size must be
    /// split by the caller; [`FrameEncoder::encode_data`] does so.
    pub fn encode(&mut self, frame: &Frame, buf: &mut BytesMut) -> Result<usize, H2Error> {
        let before = buf.len();
        let mut flags = frame.flags().bits();
        let mut payload = BytesMut::new();
        match frame.payload() {
            Payload::Data(data) => {
                if data.size() > self.max_frame_size {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                payload.put_slice(data.data());
            }
            Payload::Headers(headers) => {
                self.field.encode(&headers.clone().into_parts(), &mut payload);
                flags |= END_HEADERS_MASK;
            }
            Payload::PushPromise(promise) => {
                payload.put_u32(promise.promised_stream_id() & 0x7fff_ffff);
                self.field
                    .encode(&promise.clone().into_parts(), &mut payload);
                flags |= END_HEADERS_MASK;
            }
            Payload::Priority(priority) => {
                let mut dep = priority.get_stream_dependency() & 0x7fff_ffff;
                if priority.get_exclusive() {
                    dep |= 0x8000_0000;
                }
                payload.put_u32(dep);
                payload.put_u8(priority.get_weight());
            }
            Payload::RstStream(reset) => {
                payload.put_u32(reset.error_code());
            }
            Payload::Settings(settings) => {
                for setting in settings.get_settings() {
                    payload.put_u16(setting.setting_identifier());
                    payload.put_u32(setting.value());
                }
            }
            Payload::Ping(ping) => {
                payload.put_slice(&ping.data());
            }
            Payload::Goaway(goaway) => {
                payload.put_u32(goaway.get_last_stream_id() & 0x7fff_ffff);
                payload.put_u32(goaway.get_error_code());
                payload.put_slice(goaway.get_debug_data());
            }
            Payload::WindowUpdate(update) => {
                payload.put_u32(update.get_increment() & 0x7fff_ffff);
            }
        }
        put_frame_header(buf, payload.len(), frame.payload().frame_type(), flags, frame.stream_id());
        buf.put_slice(&payload);
        Ok(buf.len() - before)
    }

    /// Serializes body bytes as one or more DATA frames, splitting at the
    /// maximum frame size and applying optional padding to each frame.
    /// END_STREAM is set on the final frame when `eom` is true.
    pub fn encode_data(
        &mut self,
        id: StreamId,
        data: &[u8],
        padding: Option<u8>,
        eom: bool,
        buf: &mut BytesMut,
    ) -> usize {
        let before = buf.len();
        let max = self.max_frame_size.max(1);
        let mut chunks = data.chunks(max).peekable();
        if data.is_empty() {
            self.put_data_frame(id, &[], padding, eom, buf);
            return buf.len() - before;
        }
        while let Some(chunk) = chunks.next() {
            let last = chunks.peek().is_none();
            self.put_data_frame(id, chunk, padding, eom && last, buf);
        }
        buf.len() - before
    }

    fn put_data_frame(
        &mut self,
        id: StreamId,
        chunk: &[u8],
        padding: Option<u8>,
        end_stream: bool,
        buf: &mut BytesMut,
    ) {
        let mut flags = 0u8;
        if end_stream {
            flags |= FrameFlags::new(0x1).bits();
        }
        match padding {
            Some(pad) => {
                flags |= PADDED_MASK;
                put_frame_header(buf, 1 + chunk.len() + pad as usize, FrameType::Data, flags, id);
                buf.put_u8(pad);
                buf.put_slice(chunk);
                buf.put_bytes(0, pad as usize);
            }
            None => {
                put_frame_header(buf, chunk.len(), FrameType::Data, flags, id);
                buf.put_slice(chunk);
            }
        }
    }
}

fn put_frame_header(buf: &mut BytesMut, len: usize, kind: FrameType, flags: u8, id: StreamId) {
    buf.put_u8((len >> 16) as u8);
    buf.put_u8((len >> 8) as u8);
    buf.put_u8(len as u8);
    buf.put_u8(kind as u8);
    buf.put_u8(flags);
    buf.put_u32(id & 0x7fff_ffff);
}
