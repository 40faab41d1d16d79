// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use fstr_mesh_core::{ElemId, ElementType, NodeId};
use thiserror::Error;

/// Result type for refinement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during refinement and subdivision
///
/// Every variant is fatal for the run. Degenerate geometry is not an error;
/// it is recorded by the quality tracker instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("node {id} not found")]
    NodeNotFound { id: NodeId },

    #[error("edge from node {id} to itself")]
    SelfEdge { id: NodeId },

    #[error("element id {id} does not follow previous id {previous}")]
    ElementOrder { previous: ElemId, id: ElemId },

    #[error("element {id}: expected {expected} nodes, found {found}")]
    FieldCount {
        id: ElemId,
        expected: usize,
        found: usize,
    },

    #[error("element id {id} is too large to number its subdivided children")]
    ElementIdOverflow { id: ElemId },

    #[error("no nodes defined before the element section")]
    NoNodes,

    #[error("element type {found} found where {expected} is required")]
    UnexpectedElementType {
        expected: ElementType,
        found: ElementType,
    },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Mesh format error: {0}")]
    CoreError(#[from] fstr_mesh_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Attach the 1-based input line an error was raised on.
    ///
    /// Format errors that already know their line are left alone.
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::AtLine { .. } | Error::Io(_) => self,
            Error::CoreError(inner) => Error::CoreError(inner.at_line(line)),
            other => Error::AtLine {
                line,
                source: Box::new(other),
            },
        }
    }
}
