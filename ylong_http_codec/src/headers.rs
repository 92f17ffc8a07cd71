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

//! HTTP [`Headers`].
//!
//! Headers are key-value pairs in HTTP messages. Names are case-insensitive
//! and stored lowercased; a name may map to several values.
//!
//! [`Headers`]: https://httpwg.org/specs/rfc9110.html#fields

use core::fmt::{Debug, Formatter};
use std::collections::{hash_map, HashMap};

use crate::error::{ErrorKind, HttpError};

/// A case-insensitive HTTP header name, stored lowercased.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HeaderName {
    name: String,
}

impl HeaderName {
    /// Creates a `HeaderName` from a byte slice, validating and lowercasing.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        if bytes.is_empty() {
            return Err(ErrorKind::Header.into());
        }
        let mut name = String::with_capacity(bytes.len());
        for &b in bytes {
            if !is_token_byte(b) {
                return Err(ErrorKind::Header.into());
            }
            name.push(b.to_ascii_lowercase() as char);
        }
        Ok(Self { name })
    }

    /// Returns the lowercased name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Returns the lowercased name as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.name.as_bytes()
    }
}

/// An HTTP header value. A value may hold several parts when the same header
/// name appears more than once.
#[derive(Clone, Eq, PartialEq)]
pub struct HeaderValue {
    inner: Vec<Vec<u8>>,
}

impl HeaderValue {
    /// Creates a `HeaderValue` from a byte slice, validating each byte.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HttpError> {
        if !bytes.iter().all(|b| is_value_byte(*b)) {
            return Err(ErrorKind::Header.into());
        }
        Ok(Self {
            inner: vec![bytes.to_vec()],
        })
    }

    /// Appends another value part to this value.
    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), HttpError> {
        if !bytes.iter().all(|b| is_value_byte(*b)) {
            return Err(ErrorKind::Header.into());
        }
        self.inner.push(bytes.to_vec());
        Ok(())
    }

    /// Joins the value parts with `", "` and returns the result as a `String`.
    pub fn to_string(&self) -> Result<String, HttpError> {
        let mut out = String::new();
        for (n, part) in self.inner.iter().enumerate() {
            if n > 0 {
                out.push_str(", ");
            }
            out.push_str(
                core::str::from_utf8(part).map_err(|_| HttpError::from(ErrorKind::Header))?,
            );
        }
        Ok(out)
    }

    /// Returns an iterator over the value parts.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.inner.iter().map(|v| v.as_slice())
    }
}

impl Debug for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self.to_string() {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.inner),
        }
    }
}

/// A collection of HTTP headers.
///
/// # Examples
///
/// ```
/// use ylong_http_codec::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Accept", "text/html").unwrap();
/// headers.append("accept", "application/json").unwrap();
/// assert_eq!(
///     headers.get("ACCEPT").unwrap().to_string().unwrap(),
///     "text/html, application/json"
/// );
/// ```
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Headers {
    map: HashMap<HeaderName, HeaderValue>,
}

impl Headers {
    /// Creates an empty `Headers`.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Returns the number of header names in the collection.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the collection contains no headers.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the value for the given name, if present.
    pub fn get<T: AsRef<[u8]>>(&self, name: T) -> Option<&HeaderValue> {
        let name = HeaderName::from_bytes(name.as_ref()).ok()?;
        self.map.get(&name)
    }

    /// Inserts a header, replacing any previous value for the same name.
    /// Returns the previous value if one existed.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Result<Option<HeaderValue>, HttpError>
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let name = HeaderName::from_bytes(name.as_ref())?;
        let value = HeaderValue::from_bytes(value.as_ref())?;
        Ok(self.map.insert(name, value))
    }

    /// Appends a header value, keeping any previous values for the same name.
    pub fn append<N, V>(&mut self, name: N, value: V) -> Result<(), HttpError>
    where
        N: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let name = HeaderName::from_bytes(name.as_ref())?;
        match self.map.entry(name) {
            hash_map::Entry::Occupied(mut entry) => entry.get_mut().append_bytes(value.as_ref()),
            hash_map::Entry::Vacant(entry) => {
                entry.insert(HeaderValue::from_bytes(value.as_ref())?);
                Ok(())
            }
        }
    }

    /// Removes a header and returns its value, if present.
    pub fn remove<T: AsRef<[u8]>>(&mut self, name: T) -> Option<HeaderValue> {
        let name = HeaderName::from_bytes(name.as_ref()).ok()?;
        self.map.remove(&name)
    }

    /// Returns an iterator over `(&HeaderName, &HeaderValue)` pairs.
    pub fn iter(&self) -> hash_map::Iter<'_, HeaderName, HeaderValue> {
        self.map.iter()
    }
}

impl Debug for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

// token per RFC 9110: visible ASCII except delimiters.
fn is_token_byte(b: u8) -> bool {
    matches!(b,
        b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9'
        | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
        | b'^' | b'_' | b'`' | b'|' | b'~')
}

// field-value bytes: visible ASCII plus SP and HTAB.
fn is_value_byte(b: u8) -> bool {
    b == b'\t' || (b' '..=b'~').contains(&b) || b >= 0x80
}
