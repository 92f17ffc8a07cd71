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

//! HTTP/2 frame parsing.

use std::convert::TryInto;

use crate::h2::fieldblock::FieldBlockDecoder;
use crate::h2::frame::{
    Data, Frame, FrameFlags, Goaway, Headers, Payload, Ping, Priority, PushPromise, RstStream,
    Setting, Settings, WindowUpdate, HEADERS_PRIORITY_MASK,
};
use crate::h2::{ErrorCode, H2Error, CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE};

const FRAME_HEADER_LEN: usize = 9;

/// HTTP/2 frame decoder supporting incremental input.
///
/// Complete frames are returned in receipt order; partial input is buffered
/// until the rest of the frame arrives.
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_frame_size: usize,
    field: FieldBlockDecoder,
    expect_preface: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Creates a `FrameDecoder` for a server-to-client byte stream.
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            field: FieldBlockDecoder::new(),
            expect_preface: false,
        }
    }

    /// Creates a `FrameDecoder` that first expects the client connection
    /// preface, for parsing a client-to-server byte stream.
    pub fn with_preface() -> Self {
        let mut decoder = Self::new();
        decoder.expect_preface = true;
        decoder
    }

    /// Applies a SETTINGS_MAX_FRAME_SIZE update.
    pub fn set_max_frame_size(&mut self, size: usize) {
        self.max_frame_size = size;
    }

    /// Decodes some bytes, returning every complete frame they finish.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Frame>, H2Error> {
        self.buf.extend_from_slice(data);
        let mut frames = Vec::new();
        loop {
            if self.expect_preface {
                if self.buf.len() < CONNECTION_PREFACE.len() {
                    return Ok(frames);
                }
                if &self.buf[..CONNECTION_PREFACE.len()] != CONNECTION_PREFACE {
                    return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
                self.buf.drain(..CONNECTION_PREFACE.len());
                self.expect_preface = false;
            }
            if self.buf.len() < FRAME_HEADER_LEN {
                return Ok(frames);
            }
            let len = ((self.buf[0] as usize) << 16)
                | ((self.buf[1] as usize) << 8)
                | self.buf[2] as usize;
            if len > self.max_frame_size {
                return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
            }
            if self.buf.len() < FRAME_HEADER_LEN + len {
                return Ok(frames);
            }
            let kind = self.buf[3];
            let flags = FrameFlags::new(self.buf[4]);
            let id = u32::from_be_bytes(
                self.buf[5..9]
                    .try_into()
                    .map_err(|_| H2Error::ConnectionError(ErrorCode::InternalError))?,
            ) & 0x7fff_ffff;
            let payload: Vec<u8> = self
                .buf
                .drain(..FRAME_HEADER_LEN + len)
                .skip(FRAME_HEADER_LEN)
                .collect();
            if let Some(frame) = self.parse_payload(kind, flags, id, payload)? {
                frames.push(frame);
            }
        }
    }

    fn parse_payload(
        &mut self,
        kind: u8,
        flags: FrameFlags,
        id: u32,
        payload: Vec<u8>,
    ) -> Result<Option<Frame>, H2Error> {
        let payload = match kind {
            0x0 => {
                let data = strip_padding(&flags, &payload)?;
                Payload::Data(Data::new(data.to_vec()))
            }
            0x1 => {
                if !flags.is_end_headers() {
                    // Split header blocks are not produced by the peer codecs
                    // this decoder pairs with.
                    return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
                }
                let mut block = strip_padding(&flags, &payload)?;
                if flags.bits() & HEADERS_PRIORITY_MASK != 0 {
                    if block.len() < 5 {
                        return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                    }
                    block = &block[5..];
                }
                let parts = self.field.decode(block)?;
                Payload::Headers(Headers::new(parts))
            }
            0x2 => {
                if payload.len() != 5 {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                let dep = read_u32(&payload[..4])?;
                Payload::Priority(Priority::new(
                    dep & 0x8000_0000 != 0,
                    dep & 0x7fff_ffff,
                    payload[4],
                ))
            }
            0x3 => {
                if payload.len() != 4 {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                Payload::RstStream(RstStream::new(read_u32(&payload)?))
            }
            0x4 => {
                if payload.len() % 6 != 0 {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                let mut settings = Vec::new();
                for chunk in payload.chunks(6) {
                    let identifier = u16::from_be_bytes(
                        chunk[..2]
                            .try_into()
                            .map_err(|_| H2Error::ConnectionError(ErrorCode::InternalError))?,
                    );
                    let value = read_u32(&chunk[2..])?;
                    let setting = match identifier {
                        0x01 => Setting::HeaderTableSize(value),
                        0x02 => Setting::EnablePush(value != 0),
                        0x03 => Setting::MaxConcurrentStreams(value),
                        0x04 => Setting::InitialWindowSize(value),
                        0x05 => Setting::MaxFrameSize(value),
                        0x06 => Setting::MaxHeaderListSize(value),
                        // Unknown settings are ignored.
                        _ => continue,
                    };
                    settings.push(setting);
                }
                Payload::Settings(Settings::new(settings))
            }
            0x5 => {
                let block = strip_padding(&flags, &payload)?;
                if block.len() < 4 {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                let promised = read_u32(&block[..4])? & 0x7fff_ffff;
                let parts = self.field.decode(&block[4..])?;
                Payload::PushPromise(PushPromise::new(promised, parts))
            }
            0x6 => {
                let data: [u8; 8] = payload
                    .as_slice()
                    .try_into()
                    .map_err(|_| H2Error::ConnectionError(ErrorCode::FrameSizeError))?;
                Payload::Ping(Ping::new(data))
            }
            0x7 => {
                if payload.len() < 8 {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                let last = read_u32(&payload[..4])? & 0x7fff_ffff;
                let code = read_u32(&payload[4..8])?;
                Payload::Goaway(Goaway::new(code, last, payload[8..].to_vec()))
            }
            0x8 => {
                if payload.len() != 4 {
                    return Err(H2Error::ConnectionError(ErrorCode::FrameSizeError));
                }
                Payload::WindowUpdate(WindowUpdate::new(read_u32(&payload)? & 0x7fff_ffff))
            }
            // Unknown frame types are skipped.
            _ => return Ok(None),
        };
        Ok(Some(Frame::new(id, flags, payload)))
    }
}

fn strip_padding<'a>(flags: &FrameFlags, payload: &'a [u8]) -> Result<&'a [u8], H2Error> {
    if !flags.is_padded() {
        return Ok(payload);
    }
    if payload.is_empty() {
        return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
    }
    let pad = payload[0] as usize;
    if pad + 1 > payload.len() {
        return Err(H2Error::ConnectionError(ErrorCode::ProtocolError));
    }
    Ok(&payload[1..payload.len() - pad])
}

fn read_u32(bytes: &[u8]) -> Result<u32, H2Error> {
    Ok(u32::from_be_bytes(
        bytes[..4]
            .try_into()
            .map_err(|_| H2Error::ConnectionError(ErrorCode::InternalError))?,
    ))
}

#[cfg(test)]
mod ut_frame_decoder {
    use super::*;
    use crate::h2::encoder::FrameEncoder;
    use bytes::BytesMut;

    /// UT test cases for an encode/decode round trip over several frames.
    ///
    /// # Brief
    /// 1. Encodes SETTINGS, WINDOW_UPDATE and a split DATA body.
    /// 2. Feeds the bytes in two segments and checks the decoded frames.
    #[test]
    fn ut_decode_round_trip() {
        let mut encoder = FrameEncoder::default();
        let mut buf = BytesMut::new();
        encoder
            .encode(
                &Frame::new(
                    0,
                    FrameFlags::empty(),
                    Payload::Settings(Settings::new(vec![Setting::InitialWindowSize(100)])),
                ),
                &mut buf,
            )
            .unwrap();
        encoder
            .encode(
                &Frame::new(0, FrameFlags::empty(), Payload::WindowUpdate(WindowUpdate::new(7))),
                &mut buf,
            )
            .unwrap();
        encoder.encode_data(1, b"payload", None, true, &mut buf);

        let mut decoder = FrameDecoder::new();
        let split = buf.len() / 2;
        let mut frames = decoder.decode(&buf[..split]).unwrap();
        frames.extend(decoder.decode(&buf[split..]).unwrap());
        assert_eq!(frames.len(), 3);
        assert!(matches!(frames[0].payload(), Payload::Settings(_)));
        assert!(matches!(
            frames[1].payload(),
            Payload::WindowUpdate(w) if w.get_increment() == 7
        ));
        match frames[2].payload() {
            Payload::Data(data) => assert_eq!(data.data(), b"payload"),
            _ => panic!("expected DATA"),
        }
        assert!(frames[2].flags().is_end_stream());
    }

    /// UT test cases for the client connection preface.
    ///
    /// # Brief
    /// 1. Feeds the preface followed by a PING frame.
    /// 2. Checks that a bogus preface is rejected.
    #[test]
    fn ut_decode_preface() {
        let mut decoder = FrameDecoder::with_preface();
        let mut bytes = CONNECTION_PREFACE.to_vec();
        let mut buf = BytesMut::new();
        FrameEncoder::default()
            .encode(
                &Frame::new(0, FrameFlags::empty(), Payload::Ping(Ping::new([7; 8]))),
                &mut buf,
            )
            .unwrap();
        bytes.extend_from_slice(&buf);
        let frames = decoder.decode(&bytes).unwrap();
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0].payload(), Payload::Ping(p) if p.data() == [7; 8]));

        let mut decoder = FrameDecoder::with_preface();
        assert!(decoder.decode(b"GET / HTTP/1.1\r\n\r\nxxxxxxxx").is_err());
    }

    /// UT test cases for padded DATA frames.
    ///
    /// # Brief
    /// 1. Encodes a padded DATA frame.
    /// 2. Checks that padding is stripped on decode.
    #[test]
    fn ut_decode_padded_data() {
        let mut encoder = FrameEncoder::default();
        let mut buf = BytesMut::new();
        encoder.encode_data(3, b"abc", Some(4), false, &mut buf);
        let frames = FrameDecoder::new().decode(&buf).unwrap();
        match frames[0].payload() {
            Payload::Data(data) => assert_eq!(data.data(), b"abc"),
            _ => panic!("expected DATA"),
        }
        assert_eq!(frames[0].stream_id(), 3);
    }

    /// UT test cases for oversized frames.
    ///
    /// # Brief
    /// 1. Feeds a frame header announcing an oversized payload.
    /// 2. Checks that decoding fails with FRAME_SIZE_ERROR.
    #[test]
    fn ut_decode_oversized() {
        let mut decoder = FrameDecoder::new();
        let header = [0xff, 0xff, 0xff, 0x0, 0, 0, 0, 0, 1];
        assert!(matches!(
            decoder.decode(&header),
            Err(H2Error::ConnectionError(ErrorCode::FrameSizeError))
        ));
    }
}
