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

//! HTTP/2 field-block coding.
//!
//! The encoder emits indexed references into the static table and literal
//! representations without indexing; the decoder accepts the same set plus
//! literals with incremental indexing. No dynamic table is maintained and no
//! Huffman coding is used, so every emitted block is self-describing.

use bytes::{BufMut, BytesMut};

use crate::h2::frame::{Parts, PseudoHeaders};
use crate::h2::{ErrorCode, H2Error};

// The static table of RFC 7541 Appendix A.
const STATIC_TABLE: [(&str, &str); 61] = [
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

/// Field-block encoder.
#[derive(Default)]
pub struct FieldBlockEncoder;

impl FieldBlockEncoder {
    /// Creates a new `FieldBlockEncoder`.
    pub fn new() -> Self {
        Self
    }

    /// Serializes a header block into `buf`, returning the number of bytes
    /// written.
    pub fn encode(&mut self, parts: &Parts, buf: &mut BytesMut) -> usize {
        let before = buf.len();
        let (pseudo, map) = parts.parts();
        for (name, value) in pseudo.field_list() {
            encode_field(name, value.as_bytes(), buf);
        }
        for (name, value) in map.iter() {
            for part in value.iter() {
                encode_field(name.as_str(), part, buf);
            }
        }
        buf.len() - before
    }
}

fn encode_field(name: &str, value: &[u8], buf: &mut BytesMut) {
    // Exact static match becomes an indexed field.
    for (n, entry) in STATIC_TABLE.iter().enumerate() {
        if entry.0 == name && entry.1.as_bytes() == value && !entry.1.is_empty() {
            encode_int(buf, 7, n + 1, 0x80);
            return;
        }
    }
    // Name-only static match becomes a literal without indexing with an
    // indexed name.
    if let Some(n) = STATIC_TABLE.iter().position(|entry| entry.0 == name) {
        encode_int(buf, 4, n + 1, 0x00);
        encode_string(value, buf);
        return;
    }
    // Literal without indexing, new name.
    buf.put_u8(0x00);
    encode_string(name.as_bytes(), buf);
    encode_string(value, buf);
}

fn encode_string(s: &[u8], buf: &mut BytesMut) {
    encode_int(buf, 7, s.len(), 0x00);
    buf.put_slice(s);
}

fn encode_int(buf: &mut BytesMut, prefix_bits: u8, value: usize, pattern: u8) {
    let max = (1usize << prefix_bits) - 1;
    if value < max {
        buf.put_u8(pattern | value as u8);
        return;
    }
    buf.put_u8(pattern | max as u8);
    let mut rest = value - max;
    while rest >= 128 {
        buf.put_u8((rest as u8 & 0x7f) | 0x80);
        rest >>= 7;
    }
    buf.put_u8(rest as u8);
}

/// Field-block decoder.
#[derive(Default)]
pub struct FieldBlockDecoder;

impl FieldBlockDecoder {
    /// Creates a new `FieldBlockDecoder`.
    pub fn new() -> Self {
        Self
    }

    /// Parses a complete header block into `Parts`.
    pub fn decode(&mut self, mut block: &[u8]) -> Result<Parts, H2Error> {
        let mut pseudo = PseudoHeaders::default();
        let mut map = crate::headers::Headers::new();
        while !block.is_empty() {
            let first = block[0];
            let (name, value) = if first & 0x80 != 0 {
                // Indexed field.
                let (index, rest) = decode_int(block, 7)?;
                block = rest;
                let entry = static_entry(index)?;
                (entry.0.to_string(), entry.1.as_bytes().to_vec())
            } else if first & 0x40 != 0 {
                // Literal with incremental indexing. The entry is parsed but
                // no dynamic table is maintained.
                let (index, rest) = decode_int(block, 6)?;
                block = rest;
                decode_literal(index, &mut block)?
            } else if first & 0x20 != 0 {
                // Dynamic table size update. The table stays empty.
                let (_, rest) = decode_int(block, 5)?;
                block = rest;
                continue;
            } else {
                // Literal without indexing or never indexed.
                let (index, rest) = decode_int(block, 4)?;
                block = rest;
                decode_literal(index, &mut block)?
            };
            update_parts(&mut pseudo, &mut map, &name, &value)?;
        }
        let mut parts = Parts::new();
        parts.set_pseudo(pseudo);
        parts.set_header_lines(map);
        Ok(parts)
    }
}

fn static_entry(index: usize) -> Result<(&'static str, &'static str), H2Error> {
    if index == 0 || index > STATIC_TABLE.len() {
        return Err(H2Error::ConnectionError(ErrorCode::CompressionError));
    }
    Ok(STATIC_TABLE[index - 1])
}

fn decode_literal(name_index: usize, block: &mut &[u8]) -> Result<(String, Vec<u8>), H2Error> {
    let name = if name_index == 0 {
        let bytes = decode_string(block)?;
        String::from_utf8(bytes)
            .map_err(|_| H2Error::ConnectionError(ErrorCode::CompressionError))?
    } else {
        static_entry(name_index)?.0.to_string()
    };
    let value = decode_string(block)?;
    Ok((name, value))
}

fn decode_string(block: &mut &[u8]) -> Result<Vec<u8>, H2Error> {
    if block.is_empty() {
        return Err(H2Error::ConnectionError(ErrorCode::CompressionError));
    }
    if block[0] & 0x80 != 0 {
        // Huffman coding is never emitted by this crate.
        return Err(H2Error::ConnectionError(ErrorCode::CompressionError));
    }
    let (len, rest) = decode_int(block, 7)?;
    if rest.len() < len {
        return Err(H2Error::ConnectionError(ErrorCode::CompressionError));
    }
    let out = rest[..len].to_vec();
    *block = &rest[len..];
    Ok(out)
}

fn decode_int(block: &[u8], prefix_bits: u8) -> Result<(usize, &[u8]), H2Error> {
    let max = (1usize << prefix_bits) - 1;
    let mut value = (block[0] & (max as u8)) as usize;
    let mut rest = &block[1..];
    if value < max {
        return Ok((value, rest));
    }
    let mut shift = 0u32;
    loop {
        let byte = *rest
            .first()
            .ok_or(H2Error::ConnectionError(ErrorCode::CompressionError))?;
        rest = &rest[1..];
        value += ((byte & 0x7f) as usize) << shift;
        shift += 7;
        if shift > 28 {
            return Err(H2Error::ConnectionError(ErrorCode::CompressionError));
        }
        if byte & 0x80 == 0 {
            return Ok((value, rest));
        }
    }
}

fn update_parts(
    pseudo: &mut PseudoHeaders,
    map: &mut crate::headers::Headers,
    name: &str,
    value: &[u8],
) -> Result<(), H2Error> {
    let text = || {
        String::from_utf8(value.to_vec())
            .map_err(|_| H2Error::ConnectionError(ErrorCode::CompressionError))
    };
    match name {
        ":authority" => pseudo.set_authority(Some(text()?)),
        ":method" => pseudo.set_method(Some(text()?)),
        ":path" => pseudo.set_path(Some(text()?)),
        ":scheme" => pseudo.set_scheme(Some(text()?)),
        ":status" => pseudo.set_status(Some(text()?)),
        other => map
            .append(other, value)
            .map_err(|_| H2Error::ConnectionError(ErrorCode::CompressionError))?,
    }
    Ok(())
}
