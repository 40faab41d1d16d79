// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge to midpoint registry
//!
//! Every undirected edge is stored once, in the list of its smaller endpoint.
//! Lists are indexed by node storage position, so a lookup is one binary
//! search in the [`NodeStore`] plus a short linear scan.

use std::cmp::Ordering;
use std::fmt;

use fstr_mesh_core::NodeId;

use crate::error::{Error, Result};
use crate::node_store::NodeStore;

/// Fixed growth step of a per-node edge list
pub const EDGE_LIST_GROWTH: usize = 4;

/// An edge seen from its smaller endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// The larger endpoint
    pub other: NodeId,
    pub midpoint: NodeId,
}

#[derive(Debug)]
struct EdgeList {
    owner: NodeId,
    edges: Vec<Edge>,
    /// Edges that have `owner` as their larger endpoint
    larger_endpoint: usize,
}

impl EdgeList {
    fn new(owner: NodeId) -> Self {
        Self {
            owner,
            edges: Vec::new(),
            larger_endpoint: 0,
        }
    }

    fn degree(&self) -> usize {
        self.edges.len() + self.larger_endpoint
    }

    fn push(&mut self, edge: Edge) {
        if self.edges.len() == self.edges.capacity() {
            self.edges.reserve_exact(EDGE_LIST_GROWTH);
        }
        self.edges.push(edge);
    }
}

/// Deduplicating map from node pairs to midpoint node IDs
#[derive(Debug)]
pub struct EdgeRegistry {
    lists: Vec<EdgeList>,
    initial_nodes: usize,
    /// Sort pass count of the store the list positions were taken from
    generation: usize,
}

impl EdgeRegistry {
    /// Build an empty registry for the nodes currently in `nodes`
    pub fn new(nodes: &mut NodeStore) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::NoNodes);
        }
        nodes.ensure_sorted();

        let lists = nodes.iter().map(|node| EdgeList::new(node.id)).collect();
        Ok(Self {
            lists,
            initial_nodes: nodes.count(),
            generation: nodes.sort_passes(),
        })
    }

    /// Midpoint of the edge `(a, b)`, created on first use
    ///
    /// Returns the midpoint ID and whether this call created it.
    pub fn register_or_find(
        &mut self,
        nodes: &mut NodeStore,
        a: NodeId,
        b: NodeId,
    ) -> Result<(NodeId, bool)> {
        let (lo, hi) = match a.cmp(&b) {
            Ordering::Less => (a, b),
            Ordering::Greater => (b, a),
            Ordering::Equal => return Err(Error::SelfEdge { id: a }),
        };

        nodes.ensure_sorted();
        if nodes.sort_passes() != self.generation {
            self.resync(nodes)?;
        }

        let lo_index = nodes.local_index(lo)?;
        if let Some(midpoint) = self.scan(lo_index, lo, hi) {
            return Ok((midpoint, false));
        }

        let hi_index = nodes.local_index(hi)?;
        let midpoint = nodes.create_midpoint(lo, hi)?.id;

        self.list_mut(lo_index, lo).push(Edge { other: hi, midpoint });
        self.list_mut(hi_index, hi).larger_endpoint += 1;

        Ok((midpoint, true))
    }

    #[inline]
    fn scan(&self, index: usize, lo: NodeId, hi: NodeId) -> Option<NodeId> {
        self.lists
            .get(index)
            .filter(|list| list.owner == lo)?
            .edges
            .iter()
            .find(|edge| edge.other == hi)
            .map(|edge| edge.midpoint)
    }

    /// List for storage position `index`, extending the table for nodes
    /// created after construction
    fn list_mut(&mut self, index: usize, owner: NodeId) -> &mut EdgeList {
        if index >= self.lists.len() {
            let start = self.lists.len();
            self.lists
                .extend((start..=index).map(|_| EdgeList::new(NodeId::MIN)));
        }
        let list = &mut self.lists[index];
        if list.edges.is_empty() && list.larger_endpoint == 0 {
            list.owner = owner;
        }
        list
    }

    /// Re-seat the lists after the store was re-sorted
    fn resync(&mut self, nodes: &mut NodeStore) -> Result<()> {
        tracing::debug!("Node table was re-sorted, re-indexing edge lists");
        let old = std::mem::take(&mut self.lists);
        self.lists = nodes.iter().map(|node| EdgeList::new(node.id)).collect();
        for list in old {
            if list.edges.is_empty() && list.larger_endpoint == 0 {
                continue;
            }
            let index = nodes.local_index(list.owner)?;
            self.lists[index] = list;
        }
        self.generation = nodes.sort_passes();
        Ok(())
    }

    pub fn stats(&self, nodes: &NodeStore) -> EdgeStats {
        let mut stats = EdgeStats {
            initial_nodes: self.initial_nodes,
            active_nodes: 0,
            midpoints: nodes.midpoint_count(),
            min_degree: 0,
            max_degree: 0,
            avg_degree: 0.0,
            used: 0,
            allocated: 0,
        };

        let mut degree_sum = 0usize;
        for list in &self.lists {
            stats.used += list.edges.len();
            stats.allocated += list.edges.capacity();

            let degree = list.degree();
            if degree == 0 {
                continue;
            }
            if stats.active_nodes == 0 || degree < stats.min_degree {
                stats.min_degree = degree;
            }
            stats.max_degree = stats.max_degree.max(degree);
            stats.active_nodes += 1;
            degree_sum += degree;
        }
        if stats.active_nodes > 0 {
            stats.avg_degree = degree_sum as f64 / stats.active_nodes as f64;
        }
        stats
    }
}

/// Edge registry statistics
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStats {
    pub initial_nodes: usize,
    /// Nodes with at least one incident edge
    pub active_nodes: usize,
    pub midpoints: usize,
    pub min_degree: usize,
    pub max_degree: usize,
    pub avg_degree: f64,
    pub used: usize,
    pub allocated: usize,
}

impl EdgeStats {
    pub fn used_over_allocated(&self) -> f64 {
        if self.allocated == 0 {
            0.0
        } else {
            self.used as f64 / self.allocated as f64
        }
    }
}

impl fmt::Display for EdgeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "initial nodes: {}", self.initial_nodes)?;
        writeln!(f, "active nodes: {}", self.active_nodes)?;
        writeln!(f, "midpoints: {}", self.midpoints)?;
        writeln!(
            f,
            "edges per node: min {}, max {}, avg {:.2}",
            self.min_degree, self.max_degree, self.avg_degree
        )?;
        write!(
            f,
            "edge slots used/allocated: {}/{} ({:.1}%)",
            self.used,
            self.allocated,
            100.0 * self.used_over_allocated()
        )
    }
}
