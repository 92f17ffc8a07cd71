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

//! The priority tree: a forest of virtual and real dependency nodes the peer
//! consults when scheduling egress.
//!
//! Two usages coexist. In levels mode the application tags requests with an
//! integer level; level 0 owns a distinguished high-priority virtual parent
//! and every other level shares one low-priority virtual parent, both
//! created at session start. Weights stay configurable per level. In raw
//! mode the application passes full priority updates and nodes are created
//! on first reference.

use std::collections::HashMap;

use crate::transaction::StreamId;

/// A dependency/weight update, as expressed on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PriorityUpdate {
    /// The stream this stream depends on. `0` is the connection root.
    pub parent: StreamId,

    /// Whether the dependency is exclusive.
    pub exclusive: bool,

    /// The weight, `1..=256`.
    pub weight: u16,
}

impl PriorityUpdate {
    /// Creates a new `PriorityUpdate`.
    pub fn new(parent: StreamId, exclusive: bool, weight: u16) -> Self {
        Self {
            parent,
            exclusive,
            weight,
        }
    }
}

/// A node of the priority forest.
#[derive(Clone, Debug)]
pub struct PriorityNode {
    /// The node's dependency and weight.
    pub update: PriorityUpdate,
    /// Whether the node has no backing stream.
    pub virtual_node: bool,
}

/// The priority tree.
pub struct PriorityTree {
    nodes: HashMap<StreamId, PriorityNode>,
    // Level index -> the priority the peer observes for that level. Entries
    // past level 0 all name the same shared low-priority parent.
    levels: Vec<PriorityUpdate>,
}

impl Default for PriorityTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityTree {
    /// Creates an empty tree (raw mode until levels are registered).
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            levels: Vec::new(),
        }
    }

    /// Registers or updates a node.
    pub fn ensure_node(&mut self, id: StreamId, update: PriorityUpdate, virtual_node: bool) {
        self.nodes.insert(
            id,
            PriorityNode {
                update,
                virtual_node,
            },
        );
    }

    /// Registers the next level against its virtual parent node: the
    /// distinguished high-priority node for level 0, the shared low-priority
    /// node for every other level. The node itself is registered separately.
    pub fn push_level(&mut self, parent: StreamId, weight: u16) {
        self.levels.push(PriorityUpdate::new(parent, false, weight));
    }

    /// Returns the priority tuple the peer will observe for a level.
    /// Unknown levels resolve to the minimum-priority (lowest weight) entry.
    pub fn get_http_priority(&self, level: u8) -> Option<PriorityUpdate> {
        if self.levels.is_empty() {
            return None;
        }
        match self.levels.get(level as usize) {
            Some(update) => Some(*update),
            None => self
                .levels
                .iter()
                .min_by_key(|update| update.weight)
                .copied(),
        }
    }

    /// Returns the virtual parent id of a level, if the level exists.
    pub fn level_parent(&self, level: u8) -> Option<StreamId> {
        self.levels.get(level as usize).map(|update| update.parent)
    }

    /// Returns the number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node registered under `id`, if any.
    pub fn node(&self, id: StreamId) -> Option<&PriorityNode> {
        self.nodes.get(&id)
    }
}
