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

//! The transport boundary the session writes to.
//!
//! The concrete socket engine lives outside this crate; the session only
//! needs to push bytes, learn how many were accepted, and close the
//! connection. `Ok(0)` models a transport that cannot currently accept
//! bytes; the event loop later calls [`crate::Session::on_write_ready`] to
//! retry. An `Err` is fatal to the session.

use std::io;

/// A byte-oriented, ordered, reliable transport connection.
pub trait Transport {
    /// Attempts to write `buf`, returning how many bytes were accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Closes the connection.
    fn close(&mut self);

    /// Returns `true` while the connection is usable.
    fn is_good(&self) -> bool;
}
