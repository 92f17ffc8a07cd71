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

//! `HTTP/1` client-side components: the request encoder and the incremental
//! response decoder.

mod decoder;
mod encoder;

pub use decoder::{H1Event, ResponseDecoder};
pub use encoder::RequestEncoder;

/// Errors related to `HTTP/1` parsing and serialization.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum H1Error {
    /// The response head is not syntactically valid.
    InvalidResponse,

    /// A chunk-size line or chunk framing byte is not valid.
    InvalidChunk,
}
