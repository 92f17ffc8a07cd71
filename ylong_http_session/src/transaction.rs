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

//! Per-stream transaction bookkeeping and the application handler surface.
//!
//! The session owns every [`Transaction`] in a map indexed by stream id.
//! Applications implement [`TransactionHandler`]; handler callbacks receive
//! a [`TxnHandle`], a borrow-scoped view through which egress calls flow
//! back into the session. Handles never own the session, so the
//! session/transaction/handler triangle stays acyclic.

use std::time::Duration;

use bytes::Bytes;
use ylong_http_codec::h2::ErrorCode;
use ylong_http_codec::{Headers, Message};

use crate::error::SessionError;
use crate::session::Session;
use crate::util::priority::PriorityUpdate;
use crate::util::window::{RecvWindow, SendWindow};

/// Stream identifier shared with the codec layer.
pub type StreamId = ylong_http_codec::h2::StreamId;

/// How a transaction came to exist.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransactionDirection {
    /// Locally initiated request/response exchange.
    Egress,

    /// Server-pushed stream.
    Ingress,

    /// Peer-initiated bidirectional stream attached to a control stream.
    Ex,
}

// Ingress message state, used to reject illegal event orders.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum IngressState {
    Start,
    HeadersReceived,
    Body,
    TrailersReceived,
    Complete,
}

pub(crate) struct Transaction {
    id: StreamId,
    direction: TransactionDirection,
    parent: Option<StreamId>,
    // Whether this end minted the stream id. Only locally-minted streams are
    // subject to GOAWAY acknowledgement.
    locally_minted: bool,
    pub(crate) send_window: SendWindow,
    pub(crate) recv_window: RecvWindow,
    ingress_state: IngressState,
    egress_headers_sent: bool,
    egress_complete: bool,
    ingress_complete: bool,
    pending_byte_events: u32,
    // Set while an egress-pause notification is outstanding, so pause and
    // resume deliveries stay balanced.
    pub(crate) egress_pause_notified: bool,
    pub(crate) ingress_paused: bool,
    // Body bytes waiting for flow-control window.
    pub(crate) egress_buf: Vec<u8>,
    pub(crate) egress_buf_eom: bool,
    aborted: bool,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) timeout_epoch: u64,
    handler: Option<Box<dyn TransactionHandler>>,
    handler_out: bool,
}

impl Transaction {
    pub(crate) fn new(
        id: StreamId,
        direction: TransactionDirection,
        parent: Option<StreamId>,
        locally_minted: bool,
        send_window: i32,
        recv_window: i32,
        handler: Box<dyn TransactionHandler>,
    ) -> Self {
        Self {
            id,
            direction,
            parent,
            locally_minted,
            send_window: SendWindow::new(send_window),
            recv_window: RecvWindow::new(recv_window),
            ingress_state: IngressState::Start,
            egress_headers_sent: false,
            egress_complete: false,
            ingress_complete: false,
            pending_byte_events: 0,
            egress_pause_notified: false,
            ingress_paused: false,
            egress_buf: Vec::new(),
            egress_buf_eom: false,
            aborted: false,
            idle_timeout: None,
            timeout_epoch: 0,
            handler: Some(handler),
            handler_out: false,
        }
    }

    pub(crate) fn id(&self) -> StreamId {
        self.id
    }

    pub(crate) fn direction(&self) -> TransactionDirection {
        self.direction
    }

    pub(crate) fn parent(&self) -> Option<StreamId> {
        self.parent
    }

    pub(crate) fn is_locally_minted(&self) -> bool {
        self.locally_minted
    }

    pub(crate) fn take_handler(&mut self) -> Option<Box<dyn TransactionHandler>> {
        let handler = self.handler.take();
        if handler.is_some() {
            self.handler_out = true;
        }
        handler
    }

    pub(crate) fn put_handler(&mut self, handler: Box<dyn TransactionHandler>) {
        self.handler = Some(handler);
        self.handler_out = false;
    }

    pub(crate) fn take_handler_for_detach(&mut self) -> Option<Box<dyn TransactionHandler>> {
        self.handler.take()
    }

    pub(crate) fn handler_out(&self) -> bool {
        self.handler_out
    }

    pub(crate) fn increment_pending_byte_events(&mut self) {
        self.pending_byte_events += 1;
    }

    pub(crate) fn decrement_pending_byte_events(&mut self) {
        self.pending_byte_events = self.pending_byte_events.saturating_sub(1);
    }

    pub(crate) fn pending_byte_events(&self) -> u32 {
        self.pending_byte_events
    }

    pub(crate) fn is_egress_complete(&self) -> bool {
        self.egress_complete
    }

    pub(crate) fn is_ingress_complete(&self) -> bool {
        self.ingress_complete
    }

    pub(crate) fn mark_egress_headers_sent(&mut self) {
        self.egress_headers_sent = true;
    }

    pub(crate) fn egress_headers_sent(&self) -> bool {
        self.egress_headers_sent
    }

    pub(crate) fn mark_egress_complete(&mut self) {
        self.egress_complete = true;
    }

    pub(crate) fn mark_aborted(&mut self) {
        self.aborted = true;
        self.egress_complete = true;
        self.ingress_complete = true;
        self.ingress_state = IngressState::Complete;
        self.egress_buf.clear();
        self.egress_buf_eom = false;
    }

    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted
    }

    // A transaction detaches once both directions are complete and no byte
    // event still references it.
    pub(crate) fn can_detach(&self) -> bool {
        self.egress_complete && self.ingress_complete && self.pending_byte_events == 0
    }

    // Ingress transitions. `Err(())` means the event is illegal in the
    // current state and the session surfaces `IngressStateTransition`.
    pub(crate) fn on_ingress_headers(&mut self, informational: bool) -> Result<(), ()> {
        match self.ingress_state {
            IngressState::Start => {
                if !informational {
                    self.ingress_state = IngressState::HeadersReceived;
                }
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub(crate) fn on_ingress_body(&mut self) -> Result<(), ()> {
        match self.ingress_state {
            IngressState::HeadersReceived | IngressState::Body => {
                self.ingress_state = IngressState::Body;
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub(crate) fn on_ingress_trailers(&mut self) -> Result<(), ()> {
        match self.ingress_state {
            IngressState::HeadersReceived | IngressState::Body => {
                self.ingress_state = IngressState::TrailersReceived;
                Ok(())
            }
            _ => Err(()),
        }
    }

    pub(crate) fn on_ingress_eom(&mut self) {
        self.ingress_state = IngressState::Complete;
        self.ingress_complete = true;
    }
}

/// Application callbacks for one transaction. Every method defaults to a
/// no-op so implementors only override what they observe.
pub trait TransactionHandler {
    /// The transaction was bound to a stream id.
    fn on_attach(&mut self, id: StreamId) {
        let _ = id;
    }

    /// A complete message head arrived, including informational heads.
    fn on_headers_complete(&mut self, txn: &mut TxnHandle<'_>, msg: Message) {
        let _ = (txn, msg);
    }

    /// A piece of body data arrived.
    fn on_body(&mut self, txn: &mut TxnHandle<'_>, data: Bytes) {
        let _ = (txn, data);
    }

    /// A chunk-size line arrived.
    fn on_chunk_header(&mut self, txn: &mut TxnHandle<'_>, len: usize) {
        let _ = (txn, len);
    }

    /// The current chunk completed.
    fn on_chunk_complete(&mut self, txn: &mut TxnHandle<'_>) {
        let _ = txn;
    }

    /// The trailer section arrived.
    fn on_trailers(&mut self, txn: &mut TxnHandle<'_>, trailers: Headers) {
        let _ = (txn, trailers);
    }

    /// The ingress message completed.
    fn on_eom(&mut self, txn: &mut TxnHandle<'_>) {
        let _ = txn;
    }

    /// A fatal error ended the transaction; detach follows.
    fn on_error(&mut self, txn: &mut TxnHandle<'_>, error: &SessionError) {
        let _ = (txn, error);
    }

    /// The peer announced connection shutdown.
    fn on_goaway(&mut self, txn: &mut TxnHandle<'_>, code: ErrorCode) {
        let _ = (txn, code);
    }

    /// Session egress is paused; stop generating body data.
    fn on_egress_paused(&mut self, txn: &mut TxnHandle<'_>) {
        let _ = txn;
    }

    /// Session egress resumed.
    fn on_egress_resumed(&mut self, txn: &mut TxnHandle<'_>) {
        let _ = txn;
    }

    /// The server pushed a stream associated with this transaction. Return a
    /// handler to accept it; returning `None` refuses the stream.
    fn on_push_stream(
        &mut self,
        txn: &mut TxnHandle<'_>,
        msg: &Message,
    ) -> Option<Box<dyn TransactionHandler>> {
        let _ = (txn, msg);
        None
    }

    /// The peer opened a bidirectional stream attached to this control
    /// stream. Return a handler to accept it; returning `None` refuses it.
    fn on_ex_stream(
        &mut self,
        txn: &mut TxnHandle<'_>,
        msg: &Message,
    ) -> Option<Box<dyn TransactionHandler>> {
        let _ = (txn, msg);
        None
    }

    /// The transaction fully detached; this is the final callback.
    fn on_detach(&mut self, id: StreamId) {
        let _ = id;
    }
}

/// A borrow-scoped view of one transaction, handed to handler callbacks and
/// returned by [`Session::txn`]. Egress calls flow through it into the
/// session.
pub struct TxnHandle<'a> {
    pub(crate) session: &'a mut Session,
    pub(crate) id: StreamId,
}

impl TxnHandle<'_> {
    /// The stream id of this transaction.
    pub fn id(&self) -> StreamId {
        self.id
    }

    /// Sends the message head.
    pub fn send_headers(&mut self, msg: Message) -> Result<(), SessionError> {
        self.session.send_headers_on(self.id, msg, false)
    }

    /// Sends the message head and marks egress complete.
    pub fn send_headers_eom(&mut self, msg: Message) -> Result<(), SessionError> {
        self.session.send_headers_on(self.id, msg, true)
    }

    /// Sends body bytes.
    pub fn send_body(&mut self, data: &[u8]) {
        self.session.send_body_on(self.id, data);
    }

    /// Marks egress complete.
    pub fn send_eom(&mut self) {
        self.session.send_eom_on(self.id);
    }

    /// Aborts the transaction, generating a stream reset.
    pub fn send_abort(&mut self) {
        self.session.send_abort_on(self.id);
    }

    /// Sends a priority update for this stream.
    pub fn send_priority(&mut self, update: PriorityUpdate) {
        self.session.send_priority_on(self.id, update);
    }

    /// Re-arms the idle timeout, invalidating the prior scheduled entry.
    /// Returns the epoch tag the external timer must present on expiry.
    pub fn set_idle_timeout(&mut self, timeout: Duration) -> u64 {
        self.session.set_idle_timeout_on(self.id, timeout)
    }

    /// The currently armed idle timeout, if any.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.session.txn_idle_timeout(self.id)
    }

    /// Pauses ingress: window updates for this stream are deferred.
    pub fn pause_ingress(&mut self) {
        self.session.pause_ingress_on(self.id);
    }

    /// Resumes ingress and flushes any deferred window update.
    pub fn resume_ingress(&mut self) {
        self.session.resume_ingress_on(self.id);
    }

    /// The currently available send window of this stream.
    pub fn send_window(&self) -> u32 {
        self.session.txn_send_window(self.id)
    }

    /// Whether egress is complete for this transaction.
    pub fn is_egress_complete(&self) -> bool {
        self.session.txn_is_egress_complete(self.id)
    }
}

#[cfg(test)]
mod ut_transaction {
    use super::*;

    struct NoopHandler;
    impl TransactionHandler for NoopHandler {}

    fn txn() -> Transaction {
        Transaction::new(
            1,
            TransactionDirection::Egress,
            None,
            true,
            65535,
            65535,
            Box::new(NoopHandler),
        )
    }

    /// UT test case for the detach condition.
    ///
    /// # Brief
    /// 1. Completes both directions with a byte event pending.
    /// 2. Checks that detach is gated on the byte-event count.
    #[test]
    fn ut_txn_can_detach() {
        let mut txn = txn();
        assert!(!txn.can_detach());
        txn.mark_egress_complete();
        txn.on_ingress_eom();
        txn.increment_pending_byte_events();
        assert!(!txn.can_detach());
        txn.decrement_pending_byte_events();
        assert!(txn.can_detach());
    }

    /// UT test case for ingress state transitions.
    ///
    /// # Brief
    /// 1. Walks headers, body and trailers in order.
    /// 2. Checks that headers after body are rejected and informational
    ///    heads may repeat.
    #[test]
    fn ut_txn_ingress_transitions() {
        let mut txn = txn();
        assert!(txn.on_ingress_headers(true).is_ok());
        assert!(txn.on_ingress_headers(true).is_ok());
        assert!(txn.on_ingress_headers(false).is_ok());
        assert!(txn.on_ingress_body().is_ok());
        assert!(txn.on_ingress_headers(false).is_err());
        assert!(txn.on_ingress_trailers().is_ok());
        assert!(txn.on_ingress_body().is_err());
        txn.on_ingress_eom();
        assert!(txn.is_ingress_complete());
    }

    /// UT test case for abort bookkeeping.
    ///
    /// # Brief
    /// 1. Buffers pending egress and aborts.
    /// 2. Checks that both directions complete and the buffer clears.
    #[test]
    fn ut_txn_abort() {
        let mut txn = txn();
        txn.egress_buf.extend_from_slice(b"pending");
        txn.mark_aborted();
        assert!(txn.is_aborted());
        assert!(txn.is_egress_complete());
        assert!(txn.is_ingress_complete());
        assert!(txn.egress_buf.is_empty());
        assert!(txn.can_detach());
    }
}
