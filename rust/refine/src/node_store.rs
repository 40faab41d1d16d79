// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only node table with lazy sorted lookup
//!
//! Nodes are appended in file order. IDs normally arrive ascending; when they
//! do not, the store marks itself dirty and sorts once on the next lookup.
//! Lookups are binary searches over the sorted table.

use fstr_mesh_core::{NodeId, NodeRecord};
use nalgebra::Point3;

use crate::error::{Error, Result};
use crate::geometry;

/// Initial node capacity
pub const INITIAL_NODE_CAPACITY: usize = 1024;

/// A mesh node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Node {
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

impl From<NodeRecord> for Node {
    fn from(record: NodeRecord) -> Self {
        Self {
            id: record.id,
            x: record.x,
            y: record.y,
            z: record.z,
        }
    }
}

/// Synthetic ID allocation state
#[derive(Debug, Default)]
struct MidpointCounter {
    next_id: Option<NodeId>,
    count: usize,
    last: Option<Node>,
}

/// Node table keyed by external node ID
#[derive(Debug)]
pub struct NodeStore {
    nodes: Vec<Node>,
    sorted: bool,
    max_id: Option<NodeId>,
    sort_passes: usize,
    midpoints: MidpointCounter,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_NODE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            sorted: true,
            max_id: None,
            sort_passes: 0,
            midpoints: MidpointCounter::default(),
        }
    }

    /// Append a source node
    ///
    /// An ID that does not exceed the previous one is tolerated: the store
    /// becomes dirty and sorts before the next lookup.
    pub fn append(&mut self, id: NodeId, x: f64, y: f64, z: f64) {
        if let Some(last) = self.nodes.last() {
            if id <= last.id && self.sorted {
                tracing::warn!(
                    id,
                    previous = last.id,
                    "Node ids are not ascending, nodes will be sorted before lookup"
                );
                self.sorted = false;
            }
        }
        self.push(Node { id, x, y, z });
    }

    /// Append a decoded node record
    pub fn append_record(&mut self, record: NodeRecord) {
        self.append(record.id, record.x, record.y, record.z);
    }

    fn push(&mut self, node: Node) {
        self.max_id = Some(self.max_id.map_or(node.id, |max| max.max(node.id)));
        self.nodes.push(node);
    }

    /// Perform the pending sort, if any
    pub fn ensure_sorted(&mut self) {
        if self.is_sorted() {
            return;
        }
        tracing::debug!(nodes = self.nodes.len(), "Sorting node table");
        // stable, so duplicate ids keep their file order
        self.nodes.sort_by_key(|node| node.id);
        self.sorted = true;
        self.sort_passes += 1;
    }

    /// Storage position of the node with `id`
    pub fn local_index(&mut self, id: NodeId) -> Result<usize> {
        self.ensure_sorted();
        self.nodes
            .binary_search_by_key(&id, |node| node.id)
            .map_err(|_| Error::NodeNotFound { id })
    }

    /// External ID of the node stored at `index`
    pub fn global_id(&self, index: usize) -> Option<NodeId> {
        self.nodes.get(index).map(|node| node.id)
    }

    /// Look up a node by external ID
    pub fn lookup(&mut self, id: NodeId) -> Result<&Node> {
        let index = self.local_index(id)?;
        Ok(&self.nodes[index])
    }

    pub fn position(&mut self, id: NodeId) -> Result<Point3<f64>> {
        Ok(self.lookup(id)?.position())
    }

    pub fn distance_squared(&mut self, a: NodeId, b: NodeId) -> Result<f64> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        Ok(nalgebra::distance_squared(&pa, &pb))
    }

    /// Signed volume of the tetrahedron spanned by four nodes
    pub fn signed_tet_volume(&mut self, ids: [NodeId; 4]) -> Result<f64> {
        let p0 = self.position(ids[0])?;
        let p1 = self.position(ids[1])?;
        let p2 = self.position(ids[2])?;
        let p3 = self.position(ids[3])?;
        Ok(geometry::signed_tet_volume(&p0, &p1, &p2, &p3))
    }

    /// Create the midpoint node of `a` and `b`
    ///
    /// The first midpoint gets `max id + 1`; every later one the next integer.
    /// Source nodes appended afterwards must not reuse that range.
    pub fn create_midpoint(&mut self, a: NodeId, b: NodeId) -> Result<Node> {
        let pa = self.position(a)?;
        let pb = self.position(b)?;
        let mid = geometry::midpoint(&pa, &pb);

        let id = match self.midpoints.next_id {
            Some(id) => id,
            None => {
                let first = self.max_id.map_or(1, |max| max + 1);
                tracing::info!(
                    first_id = first,
                    "Numbering midpoint nodes upward, ids from here on must be unused in the source mesh"
                );
                first
            }
        };

        let node = Node {
            id,
            x: mid.x,
            y: mid.y,
            z: mid.z,
        };
        // no warning here; this only trips when source ids entered the midpoint range
        if self.nodes.last().map_or(false, |last| id <= last.id) {
            self.sorted = false;
        }
        self.push(node);
        self.midpoints.next_id = Some(id + 1);
        self.midpoints.count += 1;
        self.midpoints.last = Some(node);
        Ok(node)
    }

    /// The node returned by the latest [`create_midpoint`](Self::create_midpoint)
    pub fn last_midpoint(&self) -> Option<&Node> {
        self.midpoints.last.as_ref()
    }

    /// Number of stored nodes, midpoints included
    pub fn count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn midpoint_count(&self) -> usize {
        self.midpoints.count
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Number of sorts performed so far
    pub fn sort_passes(&self) -> usize {
        self.sort_passes
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Release spare capacity once no more source nodes are expected
    pub fn reduce(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Nodes in storage order
    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }
}
