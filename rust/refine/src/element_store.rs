// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only element table

use fstr_mesh_core::{ElemId, ElementType, NodeId, NodeList};

use crate::error::{Error, Result};

/// Initial element capacity
pub const INITIAL_ELEMENT_CAPACITY: usize = 1024;

/// Strictly increasing element ID guard
#[derive(Debug, Clone, Copy, Default)]
pub struct IdSequence {
    last: Option<ElemId>,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `id` if it exceeds every ID seen so far
    pub fn advance(&mut self, id: ElemId) -> Result<()> {
        if let Some(previous) = self.last {
            if id <= previous {
                return Err(Error::ElementOrder { previous, id });
            }
        }
        self.last = Some(id);
        Ok(())
    }
}

/// A stored element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef<'a> {
    pub id: ElemId,
    pub nodes: &'a [NodeId],
}

/// Flat element table of a single element type
#[derive(Debug)]
pub struct ElementStore {
    element_type: ElementType,
    ids: Vec<ElemId>,
    /// `node_count` node IDs per element, back to back
    nodes: Vec<NodeId>,
    order: IdSequence,
}

impl ElementStore {
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            ids: Vec::with_capacity(INITIAL_ELEMENT_CAPACITY),
            nodes: Vec::with_capacity(INITIAL_ELEMENT_CAPACITY * element_type.node_count()),
            order: IdSequence::new(),
        }
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Append an element; IDs must strictly increase
    pub fn append(&mut self, id: ElemId, nodes: &[NodeId]) -> Result<()> {
        let expected = self.element_type.node_count();
        if nodes.len() != expected {
            return Err(Error::FieldCount {
                id,
                expected,
                found: nodes.len(),
            });
        }
        self.order.advance(id)?;
        self.ids.push(id);
        self.nodes.extend_from_slice(nodes);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Elements in insertion order
    pub fn iter(&self) -> impl Iterator<Item = ElementRef<'_>> + '_ {
        self.ids
            .iter()
            .zip(self.nodes.chunks_exact(self.element_type.node_count()))
            .map(|(&id, nodes)| ElementRef { id, nodes })
    }

    /// Elements with every node ID passed through `renumber`
    ///
    /// The first renumbering failure is yielded and the caller decides
    /// whether to stop.
    pub fn remapped<'a, F>(
        &'a self,
        mut renumber: F,
    ) -> impl Iterator<Item = Result<(ElemId, NodeList)>> + 'a
    where
        F: FnMut(NodeId) -> Result<NodeId> + 'a,
    {
        self.iter().map(move |elem| {
            let nodes = elem
                .nodes
                .iter()
                .map(|&node| renumber(node))
                .collect::<Result<NodeList>>()?;
            Ok((elem.id, nodes))
        })
    }
}
