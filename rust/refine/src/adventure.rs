// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adventure `.msh` export
//!
//! The Adventure format lists elements by file-local, 0-based node positions,
//! followed by bare node coordinates in the same order. The whole mesh is
//! read first so that positions are known before any element is written.

use std::io::{BufRead, Write};

use fstr_mesh_core::{
    parse_element_record, parse_node_record, ElementHeader, ElementType, LineClassifier,
    LineMode, NodeId, SectionKind,
};

use crate::element_store::ElementStore;
use crate::error::{Error, Result};
use crate::node_store::NodeStore;

/// Adventure node order of a 342 element, as slots of the FrontSTR record
pub const QUADRATIC_ORDER: [usize; 10] = [3, 1, 0, 2, 8, 7, 9, 6, 5, 4];

/// Adventure node order of a 341 element
pub const LINEAR_ORDER: [usize; 4] = [3, 1, 0, 2];

/// Node order for `element_type`
pub fn adventure_order(element_type: ElementType) -> &'static [usize] {
    match element_type {
        ElementType::Linear4 => &LINEAR_ORDER,
        ElementType::Quadratic10 => &QUADRATIC_ORDER,
    }
}

/// Result of an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdventureSummary {
    pub nodes: usize,
    pub elements: usize,
    pub element_type: Option<ElementType>,
}

/// A mesh held in memory for export
#[derive(Debug, Default)]
pub struct MeshData {
    pub nodes: NodeStore,
    pub elements: Option<ElementStore>,
}

impl MeshData {
    /// Read nodes and elements; comments and other sections are skipped
    pub fn read<R: BufRead>(input: R) -> Result<Self> {
        let mut lines = LineClassifier::new(input);
        let mut mesh = MeshData::default();

        while let Some(line) = lines.next_line()? {
            let number = line.number;
            mesh.read_line(line.mode, line.section, line.text)
                .map_err(|e| e.at_line(number))?;
        }

        tracing::info!(
            nodes = mesh.nodes.count(),
            elements = mesh.elements.as_ref().map_or(0, ElementStore::count),
            "Mesh read"
        );
        Ok(mesh)
    }

    fn read_line(&mut self, mode: LineMode, section: SectionKind, text: &str) -> Result<()> {
        match (mode, section) {
            (LineMode::Header, SectionKind::Element) => {
                let header = ElementHeader::parse(text)?;
                match &self.elements {
                    Some(store) if store.element_type() != header.element_type => {
                        return Err(Error::UnexpectedElementType {
                            expected: store.element_type(),
                            found: header.element_type,
                        });
                    }
                    Some(_) => {}
                    None => {
                        tracing::debug!(element_type = %header.element_type, "Reading ELEMENT section");
                        self.elements = Some(ElementStore::new(header.element_type));
                    }
                }
            }
            (LineMode::Data, SectionKind::Node) => {
                self.nodes.append_record(parse_node_record(text)?);
            }
            (LineMode::Data, SectionKind::Element) => {
                let store = self.elements.as_mut().ok_or(Error::NoNodes)?;
                let record = parse_element_record(text, store.element_type())?;
                store.append(record.id, &record.nodes)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Write the mesh in Adventure format
    pub fn write_adventure<W: Write>(&mut self, out: &mut W) -> Result<AdventureSummary> {
        self.nodes.ensure_sorted();
        let element_type = self.elements.as_ref().map(ElementStore::element_type);

        match &self.elements {
            Some(store) => {
                writeln!(out, "{}", store.count())?;
                let order = adventure_order(store.element_type());
                let nodes = &mut self.nodes;
                let local = |id: NodeId| nodes.local_index(id).map(|index| index as NodeId);
                for element in store.remapped(local) {
                    let (_, ids) = element?;
                    let mut first = true;
                    for &slot in order {
                        if !first {
                            out.write_all(b" ")?;
                        }
                        write!(out, "{}", ids[slot])?;
                        first = false;
                    }
                    writeln!(out)?;
                }
            }
            None => writeln!(out, "0")?,
        }

        writeln!(out, "{}", self.nodes.count())?;
        for node in self.nodes.iter() {
            writeln!(out, "{:.6} {:.6} {:.6}", node.x, node.y, node.z)?;
        }
        out.flush()?;

        Ok(AdventureSummary {
            nodes: self.nodes.count(),
            elements: self.elements.as_ref().map_or(0, ElementStore::count),
            element_type,
        })
    }
}

/// Convert a 341 or 342 mesh to Adventure `.msh`
pub fn to_adventure<R: BufRead, W: Write>(input: R, mut out: W) -> Result<AdventureSummary> {
    let mut mesh = MeshData::read(input)?;
    mesh.write_adventure(&mut out)
}
