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

//! The upstream session: the conductor that multiplexes transactions over
//! one transport connection.
//!
//! Inbound bytes flow `transport → Session::on_read → codec → events →
//! transactions`; outbound calls flow `TxnHandle → codec → write buffer →
//! transport`, with write completions advancing the byte-event tracker.
//! All methods run to completion on the owning event loop; there is no
//! internal parallelism.

use std::collections::{HashMap, HashSet};
use std::mem;
use std::time::Duration;

use bytes::BytesMut;
use ylong_http_codec::h2::{ErrorCode, H2Error, Setting, StreamId};
use ylong_http_codec::{HttpError, Message, StatusCode};

use crate::codec::h2::create_initial_settings;
use crate::codec::{CodecEvent, Http2Codec, Protocol, SessionCodec};
use crate::error::{Direction, ErrorKind, SessionError};
use crate::transaction::{Transaction, TransactionDirection, TransactionHandler, TxnHandle};
use crate::transport::Transport;
use crate::util::byte_event::{ByteEvent, ByteEventKind, ByteEventTracker, ByteEventTracking};
use crate::util::drain::DrainState;
use crate::util::information::InfoCallback;
use crate::util::priority::{PriorityTree, PriorityUpdate};
use crate::util::upgrade::{negotiate_upgrade, UpgradeBridge};
use crate::util::window::FlowControl;
use crate::{trace_debug, trace_warn};

const DEFAULT_WINDOW_SIZE: u32 = 65535;
const DEFAULT_WRITE_BUFFER_LIMIT: usize = 65536;
const DEFAULT_MAX_CONCURRENT_OUTGOING: u32 = 100;

/// Session life-cycle states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionState {
    /// Created but not started.
    Unstarted,
    /// Accepting and servicing transactions.
    Running,
    /// No new transactions; existing ones complete.
    Draining,
    /// Tearing down.
    Closing,
    /// Fully closed; the owner may drop the session.
    Closed,
}

/// The upstream HTTP session.
pub struct Session {
    state: SessionState,
    transport: Box<dyn Transport>,
    codec: Box<dyn SessionCodec>,
    // Bumped on codec swap so the read loop can tell progress from a stall.
    codec_generation: u32,
    info: Box<dyn InfoCallback>,
    txns: HashMap<StreamId, Transaction>,
    write_buf: BytesMut,
    write_buf_limit: usize,
    egress_paused: bool,
    wrote_since_pause: bool,
    read_paused: bool,
    bytes_scheduled: u64,
    bytes_acked: u64,
    conn_flow: FlowControl,
    // The peer's SETTINGS_INITIAL_WINDOW_SIZE, applied to new streams.
    initial_send_window: u32,
    // What the peer currently believes our per-stream window to be.
    advertised_recv_window: u32,
    per_stream_recv_window: u32,
    conn_recv_window: u32,
    tracker: Box<dyn ByteEventTracking>,
    drain: DrainState,
    priority: PriorityTree,
    priority_levels: Vec<u16>,
    upgrade: Option<UpgradeBridge>,
    max_concurrent_outgoing: u32,
    configured_max_concurrent: u32,
    outgoing_full_reported: bool,
    outgoing_streams: u32,
    // Our SETTINGS awaiting the peer's acknowledgement.
    staged_settings: Option<Vec<Setting>>,
    reset_streams: HashSet<StreamId>,
    ignored_streams: HashSet<StreamId>,
    pending_push: HashMap<StreamId, StreamId>,
    pending_ex: HashMap<StreamId, StreamId>,
    // Highest peer-initiated stream id dispatched so far.
    latest_remote_id: StreamId,
    loop_attached: bool,
    destroyed_notified: bool,
}

impl Session {
    /// Creates a session over `transport` speaking `codec`, reporting to
    /// `info`.
    pub fn new(
        transport: Box<dyn Transport>,
        codec: Box<dyn SessionCodec>,
        mut info: Box<dyn InfoCallback>,
    ) -> Self {
        info.on_create();
        let initial_send_window = codec.default_window_size();
        Self {
            state: SessionState::Unstarted,
            transport,
            codec,
            codec_generation: 0,
            info,
            txns: HashMap::new(),
            write_buf: BytesMut::new(),
            write_buf_limit: DEFAULT_WRITE_BUFFER_LIMIT,
            egress_paused: false,
            wrote_since_pause: false,
            read_paused: false,
            bytes_scheduled: 0,
            bytes_acked: 0,
            conn_flow: FlowControl::new(DEFAULT_WINDOW_SIZE, DEFAULT_WINDOW_SIZE),
            initial_send_window,
            advertised_recv_window: DEFAULT_WINDOW_SIZE,
            per_stream_recv_window: DEFAULT_WINDOW_SIZE,
            conn_recv_window: DEFAULT_WINDOW_SIZE,
            tracker: Box::new(ByteEventTracker::new()),
            drain: DrainState::new(),
            priority: PriorityTree::new(),
            priority_levels: Vec::new(),
            upgrade: None,
            max_concurrent_outgoing: DEFAULT_MAX_CONCURRENT_OUTGOING,
            configured_max_concurrent: DEFAULT_MAX_CONCURRENT_OUTGOING,
            outgoing_full_reported: false,
            outgoing_streams: 0,
            staged_settings: None,
            reset_streams: HashSet::new(),
            ignored_streams: HashSet::new(),
            pending_push: HashMap::new(),
            pending_ex: HashMap::new(),
            latest_remote_id: 0,
            loop_attached: true,
            destroyed_notified: false,
        }
    }

    /// Returns the current life-cycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The number of locally initiated transactions still attached.
    pub fn num_outgoing_streams(&self) -> u32 {
        self.outgoing_streams
    }

    /// Whether any transaction is still attached.
    pub fn has_active_transactions(&self) -> bool {
        !self.txns.is_empty()
    }

    /// Whether `new_transaction` can currently succeed.
    pub fn is_reusable(&self) -> bool {
        self.state == SessionState::Running
            && !self.drain.is_draining()
            && self.codec.is_reusable()
            && self.transport.is_good()
    }

    /// The current outgoing-stream budget.
    pub fn max_concurrent_outgoing_streams(&self) -> u32 {
        self.max_concurrent_outgoing
    }

    /// Whether the session wants more transport reads.
    pub fn wants_reads(&self) -> bool {
        !self.read_paused && self.state != SessionState::Closed
    }

    /// Sets the write-buffer limit that triggers egress pause.
    pub fn set_write_buffer_limit(&mut self, limit: usize) {
        self.write_buf_limit = limit;
    }

    /// Sets the outgoing-stream budget.
    pub fn set_max_concurrent_outgoing_streams(&mut self, max: u32) {
        self.max_concurrent_outgoing = max;
        self.configured_max_concurrent = max;
        self.check_outgoing_full();
    }

    /// Configures receive-side flow control: the advertised initial window,
    /// the per-stream budget, and the connection budget. Sent to the peer as
    /// SETTINGS and WINDOW_UPDATE at start.
    pub fn set_flow_control(&mut self, initial_recv: u32, per_stream_recv: u32, conn_recv: u32) {
        self.advertised_recv_window = initial_recv;
        self.per_stream_recv_window = per_stream_recv;
        self.conn_recv_window = conn_recv;
    }

    /// Configures levels-mode priority weights, one per level. Virtual nodes
    /// are created when the session starts.
    pub fn set_priority_levels(&mut self, weights: Vec<u16>) {
        self.priority_levels = weights;
    }

    /// Swaps the byte-event tracker, carrying over any pending events.
    pub fn set_byte_event_tracker(&mut self, mut tracker: Box<dyn ByteEventTracking>) {
        for event in self.tracker.drain_events() {
            tracker.add_event(event);
        }
        self.tracker = tracker;
    }

    /// Unbinds the session from its event loop. Must be called while no
    /// scheduler-bound state is pending.
    pub fn detach_event_loop(&mut self) {
        debug_assert!(self.write_buf.is_empty(), "pending writes while detaching");
        self.loop_attached = false;
    }

    /// Rebinds the session to an event loop.
    pub fn attach_event_loop(&mut self) {
        self.loop_attached = true;
    }

    /// Whether the session is currently bound to an event loop.
    pub fn is_loop_attached(&self) -> bool {
        self.loop_attached
    }

    /// Transmits the connection preface, initial SETTINGS, priority-tree
    /// bootstrap nodes, and the configured receive-window delta.
    pub fn start_now(&mut self) {
        if self.state != SessionState::Unstarted {
            return;
        }
        self.state = SessionState::Running;
        let n = self.codec.generate_connection_preface(&mut self.write_buf);
        self.note_scheduled(n);
        let settings = create_initial_settings(self.advertised_recv_window);
        let n = self.codec.generate_settings(&mut self.write_buf, &settings);
        self.note_scheduled(n);
        if n > 0 {
            self.staged_settings = Some(settings);
        }
        if !self.priority_levels.is_empty() {
            // One root node, a distinguished high-priority parent for level 0,
            // and a single low-priority parent shared by every other level.
            let root = self.send_priority(PriorityUpdate::new(0, false, 1));
            let weights = mem::take(&mut self.priority_levels);
            let high = self.send_priority(PriorityUpdate::new(root, false, weights[0]));
            self.priority.push_level(high, weights[0]);
            if weights.len() > 1 {
                let low_weight = weights[1..].iter().copied().min().unwrap_or(1);
                let low = self.send_priority(PriorityUpdate::new(root, false, low_weight));
                for weight in &weights[1..] {
                    self.priority.push_level(low, *weight);
                }
            }
            self.priority_levels = weights;
        }
        if self.codec.supports_session_flow_control() && self.conn_recv_window > DEFAULT_WINDOW_SIZE
        {
            let delta = self.conn_recv_window - DEFAULT_WINDOW_SIZE;
            let n = self.codec.generate_window_update(&mut self.write_buf, 0, delta);
            self.note_scheduled(n);
            self.conn_flow.setup_recv_window(self.conn_recv_window);
        }
        self.schedule_write();
    }

    /// Opens a new transaction bound to `handler`. Returns `None` while the
    /// session is draining, the transport is bad, or a serial codec already
    /// has a transaction in flight.
    pub fn new_transaction(
        &mut self,
        handler: Box<dyn TransactionHandler>,
    ) -> Option<StreamId> {
        if !self.is_reusable() {
            return None;
        }
        if !self.codec.supports_parallel_requests() && self.outgoing_streams > 0 {
            return None;
        }
        let id = self.codec.create_stream();
        self.attach_transaction(id, TransactionDirection::Egress, None, true, handler);
        self.outgoing_streams += 1;
        self.check_outgoing_full();
        if self.egress_paused {
            if let Some(txn) = self.txns.get_mut(&id) {
                txn.egress_pause_notified = true;
            }
            self.with_handler(id, |h, ctx| h.on_egress_paused(ctx));
        }
        Some(id)
    }

    /// Opens a bidirectional transaction attached to `control_stream`.
    pub fn new_ex_transaction(
        &mut self,
        control_stream: StreamId,
        handler: Box<dyn TransactionHandler>,
    ) -> Option<StreamId> {
        if !self.is_reusable() || !self.txns.contains_key(&control_stream) {
            return None;
        }
        let id = self.codec.create_stream();
        self.attach_transaction(id, TransactionDirection::Ex, Some(control_stream), true, handler);
        Some(id)
    }

    /// Creates a virtual priority node and announces it to the peer.
    /// Returns the id the peer will observe.
    pub fn send_priority(&mut self, update: PriorityUpdate) -> StreamId {
        let id = self.codec.create_stream();
        let n = self.codec.generate_priority(&mut self.write_buf, id, &update);
        self.note_scheduled(n);
        self.priority.ensure_node(id, update, true);
        self.schedule_write();
        id
    }

    /// Updates the priority of an existing node or stream.
    pub fn send_priority_for(&mut self, id: StreamId, update: PriorityUpdate) {
        let n = self.codec.generate_priority(&mut self.write_buf, id, &update);
        self.note_scheduled(n);
        let virtual_node = !self.txns.contains_key(&id);
        self.priority.ensure_node(id, update, virtual_node);
        self.schedule_write();
    }

    /// Returns the priority tuple the peer observes for a level. Unknown
    /// levels resolve to the minimum-priority entry.
    pub fn get_http_priority(&self, level: u8) -> Option<PriorityUpdate> {
        self.priority.get_http_priority(level)
    }

    /// Moves to Draining: sends a GOAWAY whose last-good id is the highest
    /// peer stream dispatched, stops accepting new transactions, and lets
    /// existing ones complete. The GOAWAY goes onto the wire at call time,
    /// ahead of any HEADERS flushed afterwards.
    pub fn drain(&mut self) {
        if matches!(
            self.state,
            SessionState::Unstarted | SessionState::Closing | SessionState::Closed
        ) {
            return;
        }
        trace_debug!("session draining");
        if self.state == SessionState::Running {
            self.state = SessionState::Draining;
        }
        let last_good = self.latest_remote_id;
        if self.drain.record_sent_goaway(last_good) {
            let n =
                self.codec
                    .generate_goaway(&mut self.write_buf, last_good, ErrorCode::NoError, b"");
            self.note_scheduled(n);
        }
        self.schedule_write();
        self.try_close_if_done();
    }

    /// Best-effort GOAWAY, then closes the transport. Every remaining
    /// transaction receives a fatal `Dropped` error and detaches.
    pub fn drop_connection(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        trace_debug!("dropping connection");
        if self.drain.record_sent_goaway(self.latest_remote_id) {
            let n = self.codec.generate_goaway(
                &mut self.write_buf,
                self.latest_remote_id,
                ErrorCode::NoError,
                b"",
            );
            self.note_scheduled(n);
        }
        self.state = SessionState::Closing;
        self.fail_all_transactions(ErrorKind::Dropped, Direction::IngressAndEgress, None);
        self.close_now();
    }

    /// Graceful teardown once every transaction has detached.
    pub fn destroy(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if !self.txns.is_empty() {
            self.fail_all_transactions(ErrorKind::Dropped, Direction::IngressAndEgress, None);
        }
        self.close_now();
    }

    /// Returns a handle to a live transaction.
    pub fn txn(&mut self, id: StreamId) -> Option<TxnHandle<'_>> {
        if self.txns.contains_key(&id) {
            Some(TxnHandle { session: self, id })
        } else {
            None
        }
    }

    /// The transport reported a TLS renegotiation after a request was
    /// written; this is fatal to every transaction.
    pub fn on_transport_renegotiation(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closing;
        self.fail_all_transactions(
            ErrorKind::ClientRenegotiation,
            Direction::Ingress,
            None,
        );
        self.close_now();
    }

    // ===== driver entry points =====

    /// Feeds transport bytes through the codec and dispatches the events.
    pub fn on_read(&mut self, data: &[u8]) {
        if self.state == SessionState::Closed || data.is_empty() {
            return;
        }
        self.info.on_read(data.len());
        let mut rest = data;
        while !rest.is_empty() && self.state != SessionState::Closed {
            let generation = self.codec_generation;
            match self.codec.on_ingress(rest) {
                Ok((consumed, events)) => {
                    for event in events {
                        self.dispatch_event(event);
                        if self.state == SessionState::Closed {
                            return;
                        }
                    }
                    rest = &rest[consumed..];
                    if consumed == 0 && self.codec_generation == generation {
                        break;
                    }
                }
                Err(e) => {
                    self.on_parse_error(e);
                    return;
                }
            }
        }
        self.try_close_if_done();
    }

    /// Signals transport end-of-file.
    pub fn on_read_eof(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let events = self.codec.on_ingress_eof();
        for event in events {
            self.dispatch_event(event);
            if self.state == SessionState::Closed {
                return;
            }
        }
        if !self.txns.is_empty() {
            self.state = SessionState::Closing;
            self.fail_all_transactions(ErrorKind::ConnectionReset, Direction::Ingress, None);
        }
        self.close_now();
    }

    /// The transport can accept bytes again.
    pub fn on_write_ready(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.flush_write_buf();
        self.try_close_if_done();
    }

    /// A wheel-timer entry for `id` expired. Stale entries are recognized by
    /// their epoch tag and ignored.
    pub fn on_idle_timeout(&mut self, id: StreamId, epoch: u64) {
        let kind = match self.txns.get(&id) {
            Some(txn) if txn.timeout_epoch == epoch => {
                if !txn.is_egress_complete() {
                    (ErrorKind::WriteTimeout, Direction::Egress)
                } else {
                    (ErrorKind::ReadTimeout, Direction::Ingress)
                }
            }
            _ => return,
        };
        let n = self
            .codec
            .generate_rst_stream(&mut self.write_buf, id, ErrorCode::Cancel);
        self.note_scheduled(n);
        self.reset_streams.insert(id);
        let err = SessionError::new(kind.0, kind.1).with_txn(id);
        self.fail_transaction(id, err);
        self.schedule_write();
        self.try_close_if_done();
    }

    // ===== egress coordination (called through TxnHandle) =====

    pub(crate) fn send_headers_on(
        &mut self,
        id: StreamId,
        msg: Message,
        eom: bool,
    ) -> Result<(), SessionError> {
        let sendable = self
            .txns
            .get(&id)
            .map(|t| !t.is_egress_complete() && !t.is_aborted() && !t.egress_headers_sent())
            .unwrap_or(false);
        if !sendable || self.state == SessionState::Closed {
            return Err(SessionError::new(ErrorKind::Dropped, Direction::Egress).with_txn(id));
        }
        self.maybe_arm_upgrade(id, &msg);
        let control_stream = self.txns.get(&id).and_then(|t| {
            if t.direction() == TransactionDirection::Ex {
                t.parent()
            } else {
                None
            }
        });
        let offset_before = self.bytes_scheduled;
        let n = match control_stream {
            Some(control) => {
                self.codec
                    .generate_ex_header(&mut self.write_buf, id, &msg, control, eom)
            }
            None => self.codec.generate_header(&mut self.write_buf, id, &msg, eom),
        }
        .map_err(|_| SessionError::new(ErrorKind::ParseHeader, Direction::Egress).with_txn(id))?;
        self.note_scheduled(n);
        if let Some(txn) = self.txns.get_mut(&id) {
            txn.mark_egress_headers_sent();
            txn.increment_pending_byte_events();
        }
        self.tracker.add_event(ByteEvent {
            offset: offset_before + 1,
            kind: ByteEventKind::FirstHeaderByte,
            txn: Some(id),
        });
        if eom {
            self.complete_egress(id);
        }
        self.after_egress();
        Ok(())
    }

    pub(crate) fn send_body_on(&mut self, id: StreamId, data: &[u8]) {
        let sendable = self
            .txns
            .get(&id)
            .map(|t| !t.is_egress_complete() && !t.is_aborted())
            .unwrap_or(false);
        if !sendable || self.state == SessionState::Closed {
            return;
        }
        if !self.codec.supports_stream_flow_control() {
            let n = self
                .codec
                .generate_body(&mut self.write_buf, id, data, None, false);
            self.note_scheduled(n);
            self.after_egress();
            return;
        }
        if let Some(txn) = self.txns.get_mut(&id) {
            txn.egress_buf.extend_from_slice(data);
        }
        self.flush_pending_egress(id);
        let blocked = self
            .txns
            .get(&id)
            .map(|t| !t.egress_buf.is_empty())
            .unwrap_or(false);
        if blocked {
            self.info.on_flow_control_window_exhausted();
        }
    }

    pub(crate) fn send_eom_on(&mut self, id: StreamId) {
        match self.txns.get_mut(&id) {
            Some(txn) if !txn.is_egress_complete() && !txn.is_aborted() => {
                if !txn.egress_buf.is_empty() {
                    // Body bytes are still waiting on window; close after them.
                    txn.egress_buf_eom = true;
                    return;
                }
            }
            _ => return,
        }
        let n = self.codec.generate_eom(&mut self.write_buf, id);
        self.note_scheduled(n);
        self.complete_egress(id);
        self.after_egress();
        self.try_detach(id);
    }

    pub(crate) fn send_abort_on(&mut self, id: StreamId) {
        if !self.txns.contains_key(&id) || self.state == SessionState::Closed {
            return;
        }
        let n = self
            .codec
            .generate_rst_stream(&mut self.write_buf, id, ErrorCode::Cancel);
        self.note_scheduled(n);
        self.reset_streams.insert(id);
        if let Some(txn) = self.txns.get_mut(&id) {
            txn.mark_aborted();
        }
        self.after_egress();
        self.try_detach(id);
    }

    pub(crate) fn send_priority_on(&mut self, id: StreamId, update: PriorityUpdate) {
        self.send_priority_for(id, update);
    }

    pub(crate) fn set_idle_timeout_on(&mut self, id: StreamId, timeout: Duration) -> u64 {
        match self.txns.get_mut(&id) {
            Some(txn) => {
                txn.timeout_epoch += 1;
                txn.idle_timeout = Some(timeout);
                txn.timeout_epoch
            }
            None => 0,
        }
    }

    pub(crate) fn pause_ingress_on(&mut self, id: StreamId) {
        if let Some(txn) = self.txns.get_mut(&id) {
            txn.ingress_paused = true;
        }
    }

    pub(crate) fn resume_ingress_on(&mut self, id: StreamId) {
        let delta = match self.txns.get_mut(&id) {
            Some(txn) if txn.ingress_paused => {
                txn.ingress_paused = false;
                txn.recv_window.check_window_update()
            }
            _ => None,
        };
        if let Some(delta) = delta {
            let n = self
                .codec
                .generate_window_update(&mut self.write_buf, id, delta);
            self.note_scheduled(n);
            self.schedule_write();
        }
    }

    pub(crate) fn txn_idle_timeout(&self, id: StreamId) -> Option<Duration> {
        self.txns.get(&id).and_then(|t| t.idle_timeout)
    }

    pub(crate) fn txn_send_window(&self, id: StreamId) -> u32 {
        self.txns
            .get(&id)
            .map(|t| t.send_window.size_available())
            .unwrap_or(0)
    }

    pub(crate) fn txn_is_egress_complete(&self, id: StreamId) -> bool {
        self.txns.get(&id).map(|t| t.is_egress_complete()).unwrap_or(true)
    }

    // ===== internals =====

    fn note_scheduled(&mut self, n: usize) {
        self.bytes_scheduled += n as u64;
    }

    fn attach_transaction(
        &mut self,
        id: StreamId,
        direction: TransactionDirection,
        parent: Option<StreamId>,
        locally_minted: bool,
        mut handler: Box<dyn TransactionHandler>,
    ) {
        handler.on_attach(id);
        let mut txn = Transaction::new(
            id,
            direction,
            parent,
            locally_minted,
            self.initial_send_window as i32,
            self.advertised_recv_window as i32,
            handler,
        );
        // The peer sees the advertised window; our budget may differ.
        if self.per_stream_recv_window > self.advertised_recv_window {
            txn.recv_window
                .increase_actual(self.per_stream_recv_window - self.advertised_recv_window);
        } else {
            txn.recv_window
                .reduce_actual(self.advertised_recv_window - self.per_stream_recv_window);
        }
        self.txns.insert(id, txn);
    }

    fn maybe_arm_upgrade(&mut self, id: StreamId, msg: &Message) {
        if self.upgrade.is_some() || !msg.is_request() {
            return;
        }
        if !matches!(
            self.codec.protocol(),
            Protocol::Http1_0 | Protocol::Http1_1
        ) {
            return;
        }
        let token = msg
            .headers()
            .get("upgrade")
            .and_then(|v| v.to_string().ok());
        if let Some(protocol) = token.as_deref().and_then(negotiate_upgrade) {
            trace_debug!("arming upgrade to {:?}", protocol);
            self.upgrade = Some(UpgradeBridge::armed(id, protocol));
            self.max_concurrent_outgoing = 1;
        }
    }

    fn complete_egress(&mut self, id: StreamId) {
        let offset = self.bytes_scheduled;
        if let Some(txn) = self.txns.get_mut(&id) {
            if txn.is_egress_complete() {
                return;
            }
            txn.mark_egress_complete();
            txn.increment_pending_byte_events();
        } else {
            return;
        }
        self.tracker.add_event(ByteEvent {
            offset,
            kind: ByteEventKind::LastByte,
            txn: Some(id),
        });
    }

    fn after_egress(&mut self) {
        self.schedule_write();
        if self.write_buf.len() > self.write_buf_limit {
            self.pause_egress();
        }
    }

    // Writes coalesce trivially in the sans-io model: scheduling a write is
    // flushing whatever has accumulated.
    fn schedule_write(&mut self) {
        self.flush_write_buf();
    }

    fn flush_write_buf(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        while !self.write_buf.is_empty() {
            let gate = self.tracker.pre_send(self.write_buf.len() as u64);
            let allowed = if gate == 0 {
                self.write_buf.len()
            } else {
                usize::min(gate as usize, self.write_buf.len())
            };
            if allowed == 0 {
                break;
            }
            match self.transport.write(&self.write_buf[..allowed]) {
                Ok(0) => break,
                Ok(n) => {
                    let _ = self.write_buf.split_to(n);
                    self.bytes_acked += n as u64;
                    self.wrote_since_pause = true;
                    self.info.on_write(n);
                }
                Err(_) => {
                    self.on_fatal_write_error();
                    return;
                }
            }
        }
        let fired = self.tracker.process_byte_events(self.bytes_acked);
        self.handle_byte_events(fired);
        self.maybe_resume_egress();
    }

    fn handle_byte_events(&mut self, fired: Vec<ByteEvent>) {
        for event in fired {
            if let Some(id) = event.txn {
                if let Some(txn) = self.txns.get_mut(&id) {
                    txn.decrement_pending_byte_events();
                }
                self.try_detach(id);
            }
        }
    }

    fn pause_egress(&mut self) {
        if self.egress_paused {
            return;
        }
        self.egress_paused = true;
        self.read_paused = true;
        self.wrote_since_pause = false;
        let mut ids: Vec<StreamId> = self.txns.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let notify = match self.txns.get_mut(&id) {
                Some(txn) if !txn.egress_pause_notified => {
                    txn.egress_pause_notified = true;
                    true
                }
                _ => false,
            };
            if notify {
                self.with_handler(id, |h, ctx| h.on_egress_paused(ctx));
            }
        }
    }

    fn maybe_resume_egress(&mut self) {
        if !self.egress_paused
            || self.write_buf.len() > self.write_buf_limit
            || !self.wrote_since_pause
        {
            return;
        }
        self.egress_paused = false;
        self.read_paused = false;
        let mut ids: Vec<StreamId> = self.txns.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            // A resumed handler may refill the pipe and re-pause the session;
            // the remaining transactions keep their pause notification.
            if self.egress_paused {
                break;
            }
            let notify = match self.txns.get_mut(&id) {
                Some(txn) if txn.egress_pause_notified => {
                    txn.egress_pause_notified = false;
                    true
                }
                _ => false,
            };
            if notify {
                self.with_handler(id, |h, ctx| h.on_egress_resumed(ctx));
            }
        }
    }

    fn on_fatal_write_error(&mut self) {
        if matches!(self.state, SessionState::Closing | SessionState::Closed) {
            self.write_buf.clear();
            return;
        }
        trace_warn!("transport write failed; tearing down session");
        self.state = SessionState::Closing;
        self.write_buf.clear();
        self.fail_all_transactions(ErrorKind::ConnectionReset, Direction::Egress, None);
        self.close_now();
    }

    fn flush_pending_egress(&mut self, id: StreamId) {
        loop {
            let (portion, eom) = match self.txns.get_mut(&id) {
                Some(txn) if !txn.is_egress_complete() => {
                    if txn.egress_buf.is_empty() {
                        if txn.egress_buf_eom {
                            txn.egress_buf_eom = false;
                            (Vec::new(), true)
                        } else {
                            break;
                        }
                    } else {
                        let available = usize::min(
                            txn.send_window.size_available() as usize,
                            self.conn_flow.send_size_available(),
                        );
                        if available == 0 {
                            break;
                        }
                        let take = usize::min(available, txn.egress_buf.len());
                        let portion: Vec<u8> = txn.egress_buf.drain(..take).collect();
                        let eom = txn.egress_buf.is_empty() && txn.egress_buf_eom;
                        if eom {
                            txn.egress_buf_eom = false;
                        }
                        txn.send_window.send_data(take as u32);
                        self.conn_flow.send_data(take as u32);
                        (portion, eom)
                    }
                }
                _ => break,
            };
            let n = if portion.is_empty() && eom {
                self.codec.generate_eom(&mut self.write_buf, id)
            } else {
                self.codec
                    .generate_body(&mut self.write_buf, id, &portion, None, eom)
            };
            self.note_scheduled(n);
            if eom {
                self.complete_egress(id);
                self.after_egress();
                self.try_detach(id);
                return;
            }
        }
        self.after_egress();
    }

    fn flush_all_pending_egress(&mut self) {
        let mut ids: Vec<StreamId> = self
            .txns
            .iter()
            .filter(|(_, t)| !t.egress_buf.is_empty() || t.egress_buf_eom)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        for id in ids {
            self.flush_pending_egress(id);
        }
    }

    fn with_handler<F>(&mut self, id: StreamId, f: F)
    where
        F: FnOnce(&mut dyn TransactionHandler, &mut TxnHandle<'_>),
    {
        let mut handler = match self.txns.get_mut(&id) {
            Some(txn) => match txn.take_handler() {
                Some(handler) => handler,
                None => return,
            },
            None => return,
        };
        {
            let mut ctx = TxnHandle { session: self, id };
            f(handler.as_mut(), &mut ctx);
        }
        match self.txns.get_mut(&id) {
            Some(txn) => txn.put_handler(handler),
            None => {
                handler.on_detach(id);
                return;
            }
        }
        self.try_detach(id);
    }

    fn try_detach(&mut self, id: StreamId) {
        let ready = self
            .txns
            .get(&id)
            .map(|t| t.can_detach() && !t.handler_out())
            .unwrap_or(false);
        if !ready {
            return;
        }
        if let Some(mut txn) = self.txns.remove(&id) {
            debug_assert_eq!(txn.id(), id);
            if txn.direction() == TransactionDirection::Egress {
                self.outgoing_streams = self.outgoing_streams.saturating_sub(1);
                self.check_outgoing_full();
            }
            if let Some(mut handler) = txn.take_handler_for_detach() {
                handler.on_detach(id);
            }
        }
        let armed_bridge_died = self
            .upgrade
            .as_ref()
            .map(|bridge| bridge.txn_id() == id && bridge.is_armed())
            .unwrap_or(false);
        if armed_bridge_died {
            // The upgrade request died before a 101 arrived.
            self.upgrade = None;
            self.max_concurrent_outgoing = self.configured_max_concurrent;
        }
        if self.txns.is_empty() {
            self.try_close_if_done();
        }
    }

    fn fail_transaction(&mut self, id: StreamId, err: SessionError) {
        match self.txns.get_mut(&id) {
            Some(txn) => {
                txn.mark_aborted();
                while txn.pending_byte_events() > 0 {
                    txn.decrement_pending_byte_events();
                }
            }
            None => return,
        }
        self.with_handler(id, |h, ctx| h.on_error(ctx, &err));
        self.try_detach(id);
    }

    fn fail_all_transactions(
        &mut self,
        kind: ErrorKind,
        direction: Direction,
        codec_error: Option<&'static str>,
    ) {
        for event in self.tracker.drain_events() {
            if let Some(id) = event.txn {
                if let Some(txn) = self.txns.get_mut(&id) {
                    txn.decrement_pending_byte_events();
                }
            }
        }
        let mut ids: Vec<StreamId> = self.txns.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let mut err = SessionError::new(kind, direction).with_txn(id);
            if let Some(name) = codec_error {
                err = err.with_codec_error(name);
            }
            self.fail_transaction(id, err);
        }
    }

    fn try_close_if_done(&mut self) {
        if !matches!(self.state, SessionState::Running | SessionState::Draining) {
            return;
        }
        if !self.txns.is_empty() {
            return;
        }
        if self.drain.is_draining()
            || self.codec.is_waiting_to_drain()
            || !self.transport.is_good()
        {
            self.close_now();
        }
    }

    fn close_now(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closing;
        self.flush_write_buf();
        self.write_buf.clear();
        self.transport.close();
        self.drain.close();
        self.state = SessionState::Closed;
        if !self.destroyed_notified {
            self.destroyed_notified = true;
            self.info.on_destroy();
        }
    }

    fn check_outgoing_full(&mut self) {
        let full =
            self.max_concurrent_outgoing == 0 || self.outgoing_streams >= self.max_concurrent_outgoing;
        if full && !self.outgoing_full_reported {
            self.outgoing_full_reported = true;
            self.info.on_settings_outgoing_streams_full();
        } else if !full && self.outgoing_full_reported {
            self.outgoing_full_reported = false;
            self.info.on_settings_outgoing_streams_not_full();
        }
    }

    // Returns true when the event has been consumed by reset or ignore
    // bookkeeping. Further activity on a locally reset stream generates a
    // secondary reset.
    fn guard_stream_event(&mut self, stream: StreamId) -> bool {
        if self.ignored_streams.contains(&stream) {
            return true;
        }
        if self.reset_streams.contains(&stream) {
            let n = self.codec.generate_rst_stream(
                &mut self.write_buf,
                stream,
                ErrorCode::StreamClosed,
            );
            self.note_scheduled(n);
            self.schedule_write();
            return true;
        }
        false
    }

    fn reset_stream(&mut self, stream: StreamId, code: ErrorCode) {
        let n = self
            .codec
            .generate_rst_stream(&mut self.write_buf, stream, code);
        self.note_scheduled(n);
        self.reset_streams.insert(stream);
        self.schedule_write();
    }

    fn ingress_state_error(&mut self, stream: StreamId) {
        let n = self.codec.generate_rst_stream(
            &mut self.write_buf,
            stream,
            ErrorCode::ProtocolError,
        );
        self.note_scheduled(n);
        self.reset_streams.insert(stream);
        let err = SessionError::new(ErrorKind::IngressStateTransition, Direction::Ingress)
            .with_txn(stream);
        self.fail_transaction(stream, err);
        self.schedule_write();
    }

    fn dispatch_event(&mut self, event: CodecEvent) {
        match event {
            CodecEvent::HeadersComplete { stream, msg } => {
                self.on_headers_complete(stream, msg);
            }
            CodecEvent::Body { stream, data } => {
                if self.guard_stream_event(stream) {
                    return;
                }
                let len = data.len() as u32;
                if self.codec.supports_session_flow_control() && len > 0 {
                    if self.conn_flow.recv_notification_size_available() < len {
                        self.on_parse_error(
                            H2Error::ConnectionError(ErrorCode::FlowControlError).into(),
                        );
                        return;
                    }
                    self.conn_flow.recv_data(len);
                    if let Some(delta) = self.conn_flow.check_conn_recv_window_update() {
                        let n = self
                            .codec
                            .generate_window_update(&mut self.write_buf, 0, delta);
                        self.note_scheduled(n);
                    }
                }
                let ok = match self.txns.get_mut(&stream) {
                    Some(txn) => {
                        if self.codec.supports_stream_flow_control() {
                            txn.recv_window.recv_data(len);
                        }
                        txn.on_ingress_body().is_ok()
                    }
                    None => return,
                };
                if !ok {
                    self.ingress_state_error(stream);
                    return;
                }
                self.with_handler(stream, |h, ctx| h.on_body(ctx, data));
                if self.codec.supports_stream_flow_control() {
                    let delta = match self.txns.get_mut(&stream) {
                        Some(txn) if !txn.ingress_paused => txn.recv_window.check_window_update(),
                        _ => None,
                    };
                    if let Some(delta) = delta {
                        let n = self
                            .codec
                            .generate_window_update(&mut self.write_buf, stream, delta);
                        self.note_scheduled(n);
                    }
                }
                self.schedule_write();
            }
            CodecEvent::ChunkHeader { stream, len } => {
                if self.guard_stream_event(stream) {
                    return;
                }
                self.with_handler(stream, |h, ctx| h.on_chunk_header(ctx, len));
            }
            CodecEvent::ChunkComplete { stream } => {
                if self.guard_stream_event(stream) {
                    return;
                }
                self.with_handler(stream, |h, ctx| h.on_chunk_complete(ctx));
            }
            CodecEvent::Trailers { stream, trailers } => {
                if self.guard_stream_event(stream) {
                    return;
                }
                let ok = match self.txns.get_mut(&stream) {
                    Some(txn) => txn.on_ingress_trailers().is_ok(),
                    None => return,
                };
                if !ok {
                    self.ingress_state_error(stream);
                    return;
                }
                self.with_handler(stream, |h, ctx| h.on_trailers(ctx, trailers));
            }
            CodecEvent::MessageComplete { stream, upgrade } => {
                if upgrade {
                    // The protocol switch is orchestrated at the 101 head.
                    return;
                }
                if self.guard_stream_event(stream) {
                    return;
                }
                if let Some(txn) = self.txns.get_mut(&stream) {
                    txn.on_ingress_eom();
                } else {
                    return;
                }
                self.with_handler(stream, |h, ctx| h.on_eom(ctx));
            }
            CodecEvent::Settings { settings } => {
                self.info.on_settings(&settings);
                for setting in &settings {
                    match setting {
                        Setting::MaxConcurrentStreams(max) => {
                            self.apply_max_concurrent_streams(*max);
                        }
                        Setting::InitialWindowSize(size) => {
                            self.apply_send_initial_window_size(*size);
                        }
                        _ => {}
                    }
                }
                let n = self.codec.generate_settings_ack(&mut self.write_buf);
                self.note_scheduled(n);
                self.schedule_write();
            }
            CodecEvent::SettingsAck => {
                if let Some(settings) = self.staged_settings.take() {
                    for setting in settings {
                        if let Setting::InitialWindowSize(size) = setting {
                            self.apply_recv_initial_window_size(size);
                        }
                    }
                }
                self.info.on_settings_ack();
            }
            CodecEvent::PingRequest { data } => {
                let n = self.codec.generate_ping_reply(&mut self.write_buf, data);
                self.note_scheduled(n);
                if n > 0 {
                    self.tracker.add_event(ByteEvent {
                        offset: self.bytes_scheduled,
                        kind: ByteEventKind::PingReply,
                        txn: None,
                    });
                }
                self.schedule_write();
            }
            CodecEvent::PingReply { .. } => {}
            CodecEvent::Goaway {
                last_good,
                code,
                debug: _,
            } => {
                self.on_goaway(last_good, code);
            }
            CodecEvent::Abort { stream, code } => {
                if self.ignored_streams.contains(&stream)
                    || self.reset_streams.contains(&stream)
                    || !self.txns.contains_key(&stream)
                {
                    return;
                }
                let kind = if code == ErrorCode::RefusedStream {
                    ErrorKind::RefusedStream
                } else {
                    ErrorKind::ProtocolError
                };
                let err = SessionError::new(kind, Direction::IngressAndEgress)
                    .with_txn(stream)
                    .with_codec_error(code.name());
                self.fail_transaction(stream, err);
            }
            CodecEvent::WindowUpdate { stream, delta } => {
                if stream == 0 {
                    if let Err(e) = self.conn_flow.increase_send_size(delta) {
                        self.on_parse_error(e.into());
                        return;
                    }
                    self.flush_all_pending_egress();
                } else {
                    let res = match self.txns.get_mut(&stream) {
                        Some(txn) => txn.send_window.increase_size(delta),
                        None => Ok(()),
                    };
                    if let Err(e) = res {
                        self.on_parse_error(e.into());
                        return;
                    }
                    self.flush_pending_egress(stream);
                }
            }
            CodecEvent::PushMessageBegin { stream, assoc } => {
                if self.guard_stream_event(stream) {
                    return;
                }
                let assoc_live = self
                    .txns
                    .get(&assoc)
                    .map(|t| !t.is_ingress_complete())
                    .unwrap_or(false);
                if !assoc_live {
                    trace_warn!("push stream {} has invalid associated stream {}", stream, assoc);
                    self.reset_stream(stream, ErrorCode::ProtocolError);
                    return;
                }
                self.pending_push.insert(stream, assoc);
            }
            CodecEvent::ExMessageBegin { stream, control } => {
                if self.guard_stream_event(stream) {
                    return;
                }
                if !self.txns.contains_key(&control) {
                    // Unknown control stream: silently drop the stream.
                    self.ignored_streams.insert(stream);
                    return;
                }
                self.pending_ex.insert(stream, control);
            }
            CodecEvent::FrameHeader { .. } => {}
            CodecEvent::Error {
                stream,
                error,
                is_new_stream,
            } => {
                self.on_stream_error(stream, error, is_new_stream);
            }
        }
    }

    fn on_headers_complete(&mut self, stream: StreamId, msg: Message) {
        if self.guard_stream_event(stream) {
            return;
        }
        if let Some(assoc) = self.pending_push.remove(&stream) {
            self.install_pushed_stream(stream, assoc, msg);
            return;
        }
        if let Some(control) = self.pending_ex.remove(&stream) {
            self.install_ex_stream(stream, control, msg);
            return;
        }
        if !self.txns.contains_key(&stream) {
            self.reset_stream(stream, ErrorCode::StreamClosed);
            return;
        }
        if msg.status() == Some(StatusCode::SWITCHING_PROTOCOLS) {
            self.on_switching_protocols(stream, &msg);
            return;
        }
        let informational = msg
            .status()
            .map(|s| s.is_informational())
            .unwrap_or(false);
        let ok = match self.txns.get_mut(&stream) {
            Some(txn) => txn.on_ingress_headers(informational).is_ok(),
            None => return,
        };
        if !ok {
            self.ingress_state_error(stream);
            return;
        }
        if !informational {
            self.info.on_ingress_message();
        }
        self.with_handler(stream, |h, ctx| h.on_headers_complete(ctx, msg));
    }

    fn install_pushed_stream(&mut self, stream: StreamId, assoc: StreamId, msg: Message) {
        let mut installed: Option<Box<dyn TransactionHandler>> = None;
        self.with_handler(assoc, |h, ctx| {
            installed = h.on_push_stream(ctx, &msg);
        });
        match installed {
            None => {
                trace_warn!("no push handler installed for stream {}", stream);
                self.reset_stream(stream, ErrorCode::RefusedStream);
            }
            Some(handler) => {
                self.attach_transaction(
                    stream,
                    TransactionDirection::Ingress,
                    Some(assoc),
                    false,
                    handler,
                );
                if let Some(txn) = self.txns.get_mut(&stream) {
                    // Pushed streams carry no client egress.
                    txn.mark_egress_complete();
                    let _ = txn.on_ingress_headers(false);
                }
                self.latest_remote_id = self.latest_remote_id.max(stream);
                self.info.on_ingress_message();
                self.with_handler(stream, |h, ctx| h.on_headers_complete(ctx, msg));
            }
        }
    }

    fn install_ex_stream(&mut self, stream: StreamId, control: StreamId, msg: Message) {
        let mut installed: Option<Box<dyn TransactionHandler>> = None;
        self.with_handler(control, |h, ctx| {
            installed = h.on_ex_stream(ctx, &msg);
        });
        match installed {
            None => {
                self.reset_stream(stream, ErrorCode::RefusedStream);
            }
            Some(handler) => {
                self.attach_transaction(
                    stream,
                    TransactionDirection::Ex,
                    Some(control),
                    false,
                    handler,
                );
                if let Some(txn) = self.txns.get_mut(&stream) {
                    let _ = txn.on_ingress_headers(false);
                }
                self.latest_remote_id = self.latest_remote_id.max(stream);
                self.info.on_ingress_message();
                self.with_handler(stream, |h, ctx| h.on_headers_complete(ctx, msg));
            }
        }
    }

    fn on_switching_protocols(&mut self, stream: StreamId, msg: &Message) {
        let armed = self
            .upgrade
            .as_ref()
            .map(|bridge| bridge.is_armed() && bridge.txn_id() == stream)
            .unwrap_or(false);
        let offered = self.upgrade.as_ref().map(|bridge| bridge.protocol());
        let token = msg
            .headers()
            .get("upgrade")
            .and_then(|v| v.to_string().ok());
        let accepted = token.as_deref().and_then(negotiate_upgrade);
        if !armed || accepted.is_none() || accepted != offered {
            trace_warn!("unexpected or unacceptable 101 on stream {}", stream);
            self.state = SessionState::Closing;
            self.fail_all_transactions(ErrorKind::ProtocolError, Direction::Ingress, None);
            self.close_now();
            return;
        }
        trace_debug!("switching protocols on stream {}", stream);
        let new_codec: Box<dyn SessionCodec> = Box::new(Http2Codec::upgraded());
        let old_codec = mem::replace(&mut self.codec, new_codec);
        if let Some(bridge) = self.upgrade.as_mut() {
            bridge.park(old_codec);
        }
        self.codec_generation += 1;
        self.info.on_session_codec_change();
        // The new codec's settings go out before any further ingress is
        // processed.
        let n = self.codec.generate_connection_preface(&mut self.write_buf);
        self.note_scheduled(n);
        let settings = create_initial_settings(self.advertised_recv_window);
        let n = self.codec.generate_settings(&mut self.write_buf, &settings);
        self.note_scheduled(n);
        self.staged_settings = Some(settings);
        if self.conn_recv_window > DEFAULT_WINDOW_SIZE {
            let delta = self.conn_recv_window - DEFAULT_WINDOW_SIZE;
            let n = self.codec.generate_window_update(&mut self.write_buf, 0, delta);
            self.note_scheduled(n);
            self.conn_flow.setup_recv_window(self.conn_recv_window);
        }
        self.max_concurrent_outgoing = self.configured_max_concurrent;
        self.check_outgoing_full();
        self.schedule_write();
    }

    fn on_goaway(&mut self, last_good: StreamId, code: ErrorCode) {
        trace_debug!("peer GOAWAY, last good stream {}", last_good);
        if let Err(e) = self.drain.on_peer_goaway(last_good) {
            self.on_parse_error(e.into());
            return;
        }
        if self.state == SessionState::Running {
            self.state = SessionState::Draining;
        }
        let mut ids: Vec<StreamId> = self.txns.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            self.with_handler(id, |h, ctx| h.on_goaway(ctx, code));
        }
        // Locally-minted streams above the acknowledged id are unacknowledged;
        // peer-initiated pushed and exchanged streams are not subject to the
        // peer's own GOAWAY.
        let mut unacknowledged: Vec<StreamId> = self
            .txns
            .iter()
            .filter(|(id, txn)| txn.is_locally_minted() && **id > last_good)
            .map(|(id, _)| *id)
            .collect();
        unacknowledged.sort_unstable();
        for id in unacknowledged {
            let mut err =
                SessionError::new(ErrorKind::StreamUnacknowledged, Direction::IngressAndEgress)
                    .with_txn(id);
            if code != ErrorCode::NoError {
                err = err.with_codec_error(code.name());
            }
            self.fail_transaction(id, err);
        }
        self.try_close_if_done();
    }

    fn apply_max_concurrent_streams(&mut self, max: u32) {
        self.max_concurrent_outgoing = max;
        self.configured_max_concurrent = max;
        if max == 0 {
            // Zero concurrent streams means drain immediately.
            self.check_outgoing_full();
            self.drain();
            return;
        }
        self.check_outgoing_full();
    }

    fn apply_send_initial_window_size(&mut self, size: u32) {
        let current = self.initial_send_window;
        self.initial_send_window = size;
        if size > current {
            let delta = size - current;
            let mut failed = false;
            for txn in self.txns.values_mut() {
                if txn.send_window.increase_size(delta).is_err() {
                    failed = true;
                }
            }
            if failed {
                self.on_parse_error(
                    H2Error::ConnectionError(ErrorCode::FlowControlError).into(),
                );
                return;
            }
            self.flush_all_pending_egress();
        } else {
            let delta = current - size;
            for txn in self.txns.values_mut() {
                txn.send_window.reduce_size(delta);
            }
        }
    }

    fn apply_recv_initial_window_size(&mut self, size: u32) {
        let current = self.advertised_recv_window;
        self.advertised_recv_window = size;
        if size > current {
            let extra = size - current;
            for txn in self.txns.values_mut() {
                txn.recv_window.increase_notification(extra);
                txn.recv_window.increase_actual(extra);
            }
        } else {
            let extra = current - size;
            for txn in self.txns.values_mut() {
                txn.recv_window.reduce_notification(extra);
            }
        }
    }

    fn on_stream_error(
        &mut self,
        stream: Option<StreamId>,
        error: HttpError,
        is_new_stream: bool,
    ) {
        let codec_name = error
            .h2_error()
            .map(|e| match e {
                H2Error::StreamError(_, code) => code.name(),
                H2Error::ConnectionError(code) => code.name(),
            });
        match stream {
            Some(id) if is_new_stream && !self.txns.contains_key(&id) => {
                self.reset_stream(id, ErrorCode::ProtocolError);
            }
            Some(id) => {
                let mut err =
                    SessionError::new(ErrorKind::ParseHeader, Direction::Ingress).with_txn(id);
                if let Some(name) = codec_name {
                    err = err.with_codec_error(name);
                }
                self.fail_transaction(id, err);
            }
            None => {
                let detail = codec_name;
                self.fail_all_transactions(ErrorKind::ParseHeader, Direction::Ingress, detail);
            }
        }
    }

    fn on_parse_error(&mut self, error: HttpError) {
        if self.state == SessionState::Closed {
            return;
        }
        match error.h2_error() {
            Some(H2Error::StreamError(id, code)) => {
                self.reset_stream(id, code);
                let err = SessionError::new(ErrorKind::ParseHeader, Direction::Ingress)
                    .with_txn(id)
                    .with_codec_error(code.name());
                self.fail_transaction(id, err);
            }
            Some(H2Error::ConnectionError(code)) => {
                trace_warn!("connection error: {}", code.name());
                if self.drain.record_sent_goaway(self.latest_remote_id) {
                    let n = self.codec.generate_goaway(
                        &mut self.write_buf,
                        self.latest_remote_id,
                        code,
                        b"",
                    );
                    self.note_scheduled(n);
                }
                self.state = SessionState::Closing;
                self.fail_all_transactions(
                    ErrorKind::ParseHeader,
                    Direction::Ingress,
                    Some(code.name()),
                );
                self.close_now();
            }
            None => {
                self.state = SessionState::Closing;
                self.fail_all_transactions(ErrorKind::ParseHeader, Direction::Ingress, None);
                self.close_now();
            }
        }
    }
}
