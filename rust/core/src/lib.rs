// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FSTR-Mesh Core
//!
//! Streaming reader and record codec for FrontSTR tetrahedral mesh files.
//!
//! ## Overview
//!
//! A FrontSTR mesh is a line-oriented text file:
//!
//! - `#...` and `!!...` lines are comments
//! - `!NODE`, `!ELEMENT, TYPE=341`, `!NGROUP`, `!EGROUP` (and any other
//!   `!KEYWORD`) lines open a section
//! - every other line is a comma-separated record of the active section
//!
//! This crate provides:
//!
//! - **Line classification**: [`LineClassifier`] tags each line as comment,
//!   header or data and tracks the active [`SectionKind`]
//! - **Element types**: [`ElementType`] (`341` / `342`) resolved once per
//!   `!ELEMENT` header, with header rewriting for conversions
//! - **Record codec**: allocation-free decoding of node, element and group
//!   records, and the matching output formatting
//! - **Counting**: per-section record counts without decoding
//!
//! ## Quick Start
//!
//! ```rust
//! use fstr_mesh_core::{parse_node_record, LineClassifier, LineMode, SectionKind};
//!
//! let content = "!NODE\n1,0.0,0.0,0.0\n2,1.0,0.0,0.0\n";
//! let mut lines = LineClassifier::new(content.as_bytes());
//!
//! let mut ids = Vec::new();
//! while let Some(line) = lines.next_line().unwrap() {
//!     if line.mode == LineMode::Data && line.section == SectionKind::Node {
//!         ids.push(parse_node_record(line.text).unwrap().id);
//!     }
//! }
//! assert_eq!(ids, vec![1, 2]);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for section and element types

pub mod classifier;
pub mod count;
pub mod element_type;
pub mod error;
pub mod format;
pub mod record;

pub use classifier::{header_kind, line_mode, Line, LineClassifier, LineMode, SectionKind, MAX_LINE_LEN};
pub use count::{count_records, MeshCounts};
pub use element_type::{ElementHeader, ElementType};
pub use error::{Error, Result};
pub use format::{write_element_record, write_node_record, write_verbatim};
pub use record::{
    parse_element_record, parse_id_record, parse_int_fields,
    parse_node_record, ElemId, ElementRecord, IntFields, NodeId, NodeList, NodeRecord,
    MAX_RECORD_FIELDS,
};
