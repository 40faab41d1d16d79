// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FSTR-Mesh Refine
//!
//! Conversion engine between linear (341) and quadratic (342) FrontSTR
//! tetrahedral meshes.
//!
//! - [`linearize`]: 341 to 342, inserting one shared node per mesh edge
//! - [`subdivide`]: 342 to 341, splitting every element into eight with
//!   quality checks on the result
//! - [`to_adventure`]: export to the Adventure `.msh` layout
//!
//! Both converters stream: they read classified lines from
//! [`fstr_mesh_core::LineClassifier`] and write output as they go, keeping
//! only nodes (and, for refinement, edges) in memory.
//!
//! ## Example
//!
//! ```rust
//! use fstr_mesh_refine::{linearize, ConvertOptions};
//!
//! let mesh = "\
//! !NODE
//! 1,0.0,0.0,0.0
//! 2,1.0,0.0,0.0
//! 3,0.0,1.0,0.0
//! 4,0.0,0.0,1.0
//! !ELEMENT, TYPE=341
//! 1,1,2,3,4
//! ";
//!
//! let mut out = Vec::new();
//! let options = ConvertOptions::default().without_banner();
//! let summary = linearize(mesh.as_bytes(), &mut out, &options).unwrap();
//!
//! assert_eq!(summary.midpoints, 6);
//! assert!(String::from_utf8(out).unwrap().ends_with("1,1,2,3,4,5,6,7,8,9,10\n"));
//! ```

pub mod adventure;
pub mod edge_registry;
pub mod element_store;
pub mod error;
pub mod geometry;
pub mod linearize;
pub mod node_store;
pub mod options;
pub mod quality;
pub mod spool;
pub mod subdivide;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use adventure::{to_adventure, AdventureSummary, MeshData};
pub use edge_registry::{EdgeRegistry, EdgeStats};
pub use element_store::{ElementRef, ElementStore, IdSequence};
pub use error::{Error, Result};
pub use linearize::{linearize, LinearizeSummary, Linearizer, Phase, MIDPOINT_EDGES};
pub use node_store::{Node, NodeStore};
pub use options::{ConvertOptions, QualityConfig};
pub use quality::{QualityReport, QualityTracker, RangeStat};
pub use spool::Spool;
pub use subdivide::{child_ids, split_tet, subdivide, Diagonal, Split, SubdivideSummary, Subdivider};
