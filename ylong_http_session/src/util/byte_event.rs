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

//! The byte-event tracker coupling write progress to transaction callbacks.
//!
//! Events are enqueued with monotone offsets as egress is serialized; each
//! write completion advances the acknowledged byte count and fires, in
//! order, every event whose offset has been covered. Events reference
//! transactions by stream id only, so a transaction that has gone away is
//! simply skipped by the session.

use std::collections::VecDeque;

use crate::transaction::StreamId;

/// The kind of a byte event.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ByteEventKind {
    /// The first byte of a message head reached the transport.
    FirstHeaderByte,

    /// The last egress byte of a transaction reached the transport.
    LastByte,

    /// A ping reply reached the transport.
    PingReply,
}

/// A pending byte event.
#[derive(Clone, Debug)]
pub struct ByteEvent {
    /// The cumulative egress offset that must be acknowledged for the event
    /// to fire.
    pub offset: u64,

    /// What the event marks.
    pub kind: ByteEventKind,

    /// The transaction the event belongs to, if any.
    pub txn: Option<StreamId>,
}

/// The tracking interface. The session owns one tracker and allows it to be
/// swapped, e.g. for a mock in tests.
pub trait ByteEventTracking {
    /// Enqueues an event. Offsets are monotone in insertion order.
    fn add_event(&mut self, event: ByteEvent);

    /// Advances the acknowledged byte count and returns every fired event,
    /// in offset order.
    fn process_byte_events(&mut self, acked: u64) -> Vec<ByteEvent>;

    /// A gate consulted before each transport write: the number of bytes the
    /// session may send now. Returning `0` means no gate.
    fn pre_send(&mut self, pending: u64) -> u64 {
        let _ = pending;
        0
    }

    /// The number of events still queued.
    fn pending(&self) -> usize;

    /// Removes and returns every queued event, for session teardown.
    fn drain_events(&mut self) -> Vec<ByteEvent>;
}

/// The default tracker: an ordered queue of pending byte offsets.
#[derive(Default)]
pub struct ByteEventTracker {
    queue: VecDeque<ByteEvent>,
}

impl ByteEventTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl ByteEventTracking for ByteEventTracker {
    fn add_event(&mut self, event: ByteEvent) {
        debug_assert!(
            self.queue.back().map(|e| e.offset <= event.offset).unwrap_or(true),
            "byte event offsets must be monotone"
        );
        self.queue.push_back(event);
    }

    fn process_byte_events(&mut self, acked: u64) -> Vec<ByteEvent> {
        let mut fired = Vec::new();
        while let Some(front) = self.queue.front() {
            if front.offset > acked {
                break;
            }
            if let Some(event) = self.queue.pop_front() {
                fired.push(event);
            }
        }
        fired
    }

    fn pending(&self) -> usize {
        self.queue.len()
    }

    fn drain_events(&mut self) -> Vec<ByteEvent> {
        self.queue.drain(..).collect()
    }
}
