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

mod common;

use common::{MockCodec, MockTransport, TestHandler, TestInfo};
use ylong_http_session::{PriorityUpdate, Session};

/// SDV test case for levels-mode virtual nodes.
///
/// # Brief
/// 1. Configures three priority levels and starts the session.
/// 2. Checks that exactly three virtual nodes are announced (root, the
///    high-priority parent, one shared low-priority parent), that every
///    level past 0 resolves to the shared parent with its own weight, and
///    that unknown levels fall back to the lowest weight.
#[test]
fn sdv_priority_levels_bootstrap() {
    let (transport, transport_handle) = MockTransport::new();
    let (codec, _script) = MockCodec::new();
    let (info, _info_log) = TestInfo::new();
    let mut session = Session::new(transport, codec, info);
    session.set_priority_levels(vec![18, 2, 4]);
    session.start_now();

    let written = transport_handle.written_string();
    // A root node, the high-priority parent, and one low-priority parent
    // shared by the remaining levels: ids 1, 3 and 5.
    assert!(written.contains("PRI(1,0,1)"));
    assert!(written.contains("PRI(3,1,18)"));
    assert!(written.contains("PRI(5,1,2)"));
    assert_eq!(written.matches("PRI(").count(), 3);

    let hi = session.get_http_priority(0).unwrap();
    assert_eq!((hi.parent, hi.weight), (3, 18));
    // Levels past 0 share one low-priority parent but keep their weights.
    let lo = session.get_http_priority(1).unwrap();
    assert_eq!((lo.parent, lo.weight), (5, 2));
    let lo2 = session.get_http_priority(2).unwrap();
    assert_eq!((lo2.parent, lo2.weight), (5, 4));
    // Unknown levels resolve to the minimum-priority entry.
    let unknown = session.get_http_priority(7).unwrap();
    assert_eq!((unknown.parent, unknown.weight), (5, 2));

    // Transactions mint ids above the virtual nodes.
    let (handler, _log) = TestHandler::new();
    assert_eq!(session.new_transaction(handler), Some(7));
}

/// SDV test case for raw-mode priority updates.
///
/// # Brief
/// 1. Creates a virtual node with a full priority update, then updates an
///    existing id.
/// 2. Checks the announced ids and that lookups stay empty without levels.
#[test]
fn sdv_priority_raw_updates() {
    let (transport, transport_handle) = MockTransport::new();
    let (codec, _script) = MockCodec::new();
    let (info, _info_log) = TestInfo::new();
    let mut session = Session::new(transport, codec, info);
    session.start_now();
    transport_handle.take_written();

    let node = session.send_priority(PriorityUpdate::new(0, false, 255));
    assert_eq!(node, 1);
    assert!(transport_handle.written_string().contains("PRI(1,0,255)"));

    session.send_priority_for(node, PriorityUpdate::new(0, true, 16));
    assert!(transport_handle.written_string().contains("PRI(1,0,16)"));
    assert!(session.get_http_priority(0).is_none());
}

/// SDV test case for per-transaction priority updates.
///
/// # Brief
/// 1. Opens a transaction under a levels-mode tree and sends a priority
///    update pointing at a level parent.
/// 2. Checks the update is announced for the transaction's stream.
#[test]
fn sdv_priority_on_transaction() {
    let (transport, transport_handle) = MockTransport::new();
    let (codec, _script) = MockCodec::new();
    let (info, _info_log) = TestInfo::new();
    let mut session = Session::new(transport, codec, info);
    session.set_priority_levels(vec![8]);
    session.start_now();

    let (handler, _log) = TestHandler::new();
    let id = session.new_transaction(handler).unwrap();
    transport_handle.take_written();
    let level = session.get_http_priority(0).unwrap();
    session.txn(id).unwrap().send_priority(level);
    assert!(transport_handle
        .written_string()
        .contains(&format!("PRI({},{},{})", id, level.parent, level.weight)));
}
