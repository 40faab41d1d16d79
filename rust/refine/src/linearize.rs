// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 341 to 342 refinement
//!
//! Every linear tetrahedron gets a node at the midpoint of each of its six
//! edges. Shared edges produce one midpoint, found through the
//! [`EdgeRegistry`]. New nodes are written to the output as soon as they are
//! created, which keeps them in the node section; the refined elements go to
//! a [`Spool`] and are replayed when the element section ends.

use std::io::{BufRead, Write};

use fstr_mesh_core::{
    parse_element_record, parse_node_record, write_element_record, write_node_record,
    write_verbatim, ElementHeader, ElementType, Line, LineClassifier, LineMode, NodeId,
    SectionKind,
};

use crate::edge_registry::{EdgeRegistry, EdgeStats};
use crate::element_store::IdSequence;
use crate::error::{Error, Result};
use crate::node_store::{Node, NodeStore};
use crate::options::ConvertOptions;
use crate::spool::Spool;

/// Corner pairs whose midpoints fill slots 4..=9 of a 342 element
pub const MIDPOINT_EDGES: [(usize, usize); 6] = [(1, 2), (0, 2), (0, 1), (0, 3), (1, 3), (2, 3)];

/// Where the converter is in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ExpectHeader,
    NodeSection,
    ElementSection,
    /// Any other section (groups, materials, ...), copied through
    OtherSection,
    Done,
}

/// Resolve an `!ELEMENT` header that must carry `expected`'s type code
///
/// Only the expected code is searched for. When it is absent but the other
/// code is present, the error names both types.
pub(crate) fn expect_element_header(text: &str, expected: ElementType) -> Result<ElementHeader> {
    match ElementHeader::find(text, expected) {
        Ok(header) => Ok(header),
        Err(missing) => match ElementHeader::parse(text) {
            Ok(other) => Err(Error::UnexpectedElementType {
                expected,
                found: other.element_type,
            }),
            Err(_) => Err(missing.into()),
        },
    }
}

/// Result of a refinement run
#[derive(Debug, Clone, PartialEq)]
pub struct LinearizeSummary {
    pub source_nodes: usize,
    pub elements: usize,
    pub midpoints: usize,
    pub edge_stats: Option<EdgeStats>,
}

/// Streaming 341 to 342 converter
///
/// Feed it classified lines with [`process_line`](Self::process_line) and
/// call [`finish`](Self::finish) at end of input.
pub struct Linearizer<W: Write> {
    out: W,
    nodes: NodeStore,
    edges: Option<EdgeRegistry>,
    spool: Spool,
    phase: Phase,
    /// Section of the last header written straight to `out`
    output_section: SectionKind,
    element_order: IdSequence,
    source_nodes: usize,
    elements: usize,
    options: ConvertOptions,
}

impl<W: Write> Linearizer<W> {
    pub fn new(out: W, options: &ConvertOptions) -> Self {
        Self {
            out,
            nodes: NodeStore::new(),
            edges: None,
            spool: Spool::new(),
            phase: Phase::ExpectHeader,
            output_section: SectionKind::None,
            element_order: IdSequence::new(),
            source_nodes: 0,
            elements: 0,
            options: options.clone(),
        }
    }

    pub fn write_banner(&mut self) -> Result<()> {
        let rule = "#".repeat(62);
        writeln!(self.out, "{}", rule)?;
        writeln!(
            self.out,
            "# FrontSTR 342 mesh file refined by {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out, "# Original 341 mesh: {}", self.options.source_name)?;
        writeln!(self.out, "# CAUTION: BCs are not applied on middle nodes.")?;
        writeln!(self.out, "{}", rule)?;
        Ok(())
    }

    pub fn process_line(&mut self, line: &Line<'_>) -> Result<()> {
        match line.mode {
            LineMode::Comment => {
                if self.phase == Phase::ElementSection {
                    write_verbatim(&mut self.spool, line.text)?;
                } else {
                    write_verbatim(&mut self.out, line.text)?;
                }
            }
            LineMode::Header => {
                self.leave_section(line.section)?;
                self.enter_section(line.section, line.text)?;
            }
            LineMode::Data => match line.section {
                SectionKind::Node => self.node_record(line.text)?,
                SectionKind::Element => self.element_record(line.text)?,
                _ => write_verbatim(&mut self.out, line.text)?,
            },
        }
        Ok(())
    }

    fn leave_section(&mut self, next: SectionKind) -> Result<()> {
        match self.phase {
            Phase::NodeSection if next != SectionKind::Node => {
                tracing::info!(nodes = self.source_nodes, "NODE section complete");
            }
            Phase::ElementSection if next != SectionKind::Element => {
                self.drain_spool()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn enter_section(&mut self, kind: SectionKind, text: &str) -> Result<()> {
        match kind {
            SectionKind::Node => {
                if self.phase != Phase::NodeSection {
                    tracing::debug!("Reading NODE section");
                }
                write_verbatim(&mut self.out, text)?;
                self.output_section = SectionKind::Node;
                self.phase = Phase::NodeSection;
            }
            SectionKind::Element => {
                let header = expect_element_header(text, ElementType::Linear4)?;
                if self.edges.is_none() {
                    self.nodes.reduce();
                    self.edges = Some(EdgeRegistry::new(&mut self.nodes)?);
                    tracing::debug!(
                        nodes = self.nodes.count(),
                        capacity = self.nodes.capacity(),
                        "Edge registry ready"
                    );
                }
                if self.phase != Phase::ElementSection {
                    tracing::debug!("Reading ELEMENT section");
                }
                let rewritten = header.rewrite(text, header.element_type.counterpart());
                write_verbatim(&mut self.spool, &rewritten)?;
                self.phase = Phase::ElementSection;
            }
            other => {
                write_verbatim(&mut self.out, text)?;
                self.output_section = other;
                self.phase = Phase::OtherSection;
            }
        }
        Ok(())
    }

    fn node_record(&mut self, text: &str) -> Result<()> {
        let record = parse_node_record(text)?;
        self.nodes.append_record(record);
        self.source_nodes += 1;
        write_node_record(&mut self.out, record.id, record.x, record.y, record.z)?;
        Ok(())
    }

    fn element_record(&mut self, text: &str) -> Result<()> {
        let record = parse_element_record(text, ElementType::Linear4)?;
        self.element_order.advance(record.id)?;
        let edges = self.edges.as_mut().ok_or(Error::NoNodes)?;

        let mut n: [NodeId; 10] = [0; 10];
        n[..4].copy_from_slice(&record.nodes);
        for (slot, &(a, b)) in MIDPOINT_EDGES.iter().enumerate() {
            let (midpoint, created) = edges.register_or_find(&mut self.nodes, n[a], n[b])?;
            n[4 + slot] = midpoint;
            if created {
                if let Some(node) = self.nodes.last_midpoint() {
                    emit_midpoint(&mut self.out, &mut self.output_section, node)?;
                }
            }
        }

        write_element_record(&mut self.spool, record.id, &n)?;
        self.elements += 1;
        Ok(())
    }

    fn drain_spool(&mut self) -> Result<()> {
        tracing::info!(
            elements = self.elements,
            midpoints = self.nodes.midpoint_count(),
            "ELEMENT section complete"
        );
        if let Some(edges) = &self.edges {
            tracing::debug!("Edge statistics:\n{}", edges.stats(&self.nodes));
        }
        let lines = self.spool.lines();
        let bytes = self.spool.drain_into(&mut self.out)?;
        tracing::debug!(lines, bytes, "Replayed element section");
        self.output_section = SectionKind::Element;
        Ok(())
    }

    /// Flush any pending element output and return the summary and writer
    pub fn finish(mut self) -> Result<(LinearizeSummary, W)> {
        if self.phase == Phase::ElementSection {
            self.drain_spool()?;
        }
        self.phase = Phase::Done;
        self.out.flush()?;

        let summary = LinearizeSummary {
            source_nodes: self.source_nodes,
            elements: self.elements,
            midpoints: self.nodes.midpoint_count(),
            edge_stats: self.edges.as_ref().map(|edges| edges.stats(&self.nodes)),
        };
        tracing::info!(
            source_nodes = summary.source_nodes,
            elements = summary.elements,
            midpoints = summary.midpoints,
            "Refinement complete"
        );
        Ok((summary, self.out))
    }
}

/// Write a new midpoint node, opening a NODE block first if needed
fn emit_midpoint<W: Write>(
    out: &mut W,
    output_section: &mut SectionKind,
    node: &Node,
) -> Result<()> {
    if *output_section != SectionKind::Node {
        out.write_all(b"!NODE\n")?;
        *output_section = SectionKind::Node;
    }
    write_node_record(out, node.id, node.x, node.y, node.z)?;
    Ok(())
}

/// Refine a 341 mesh read from `input` into a 342 mesh written to `out`
pub fn linearize<R: BufRead, W: Write>(
    input: R,
    out: W,
    options: &ConvertOptions,
) -> Result<LinearizeSummary> {
    let mut lines = LineClassifier::new(input);
    let mut engine = Linearizer::new(out, options);
    if options.banner {
        engine.write_banner()?;
    }

    while let Some(line) = lines.next_line()? {
        let number = line.number;
        engine
            .process_line(&line)
            .map_err(|e| e.at_line(number))?;
    }

    let (summary, _) = engine.finish()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> Result<(LinearizeSummary, String)> {
        let mut out = Vec::new();
        let options = ConvertOptions::default().without_banner();
        let summary = linearize(input.as_bytes(), &mut out, &options)?;
        Ok((summary, String::from_utf8(out).unwrap()))
    }

    const TWO_TETS: &str = "\
!NODE
1,0.0,0.0,0.0
2,1.0,0.0,0.0
3,0.0,1.0,0.0
4,0.0,0.0,1.0
5,1.0,1.0,1.0
!ELEMENT, TYPE=341, EGRP=ALL
1,1,2,3,4
2,2,3,4,5
!END
";

    #[test]
    fn test_shared_face_midpoints_reused() {
        let (summary, out) = run(TWO_TETS).unwrap();
        // 6 + 6 edges, 3 of them on the shared face
        assert_eq!(summary.midpoints, 9);
        assert_eq!(summary.elements, 2);
        assert_eq!(summary.source_nodes, 5);

        let lines: Vec<&str> = out.lines().collect();
        let element_at = lines.iter().position(|l| l.starts_with("!ELEMENT")).unwrap();
        assert_eq!(lines[element_at], "!ELEMENT, TYPE=342, EGRP=ALL");
        assert_eq!(lines[element_at + 1], "1,1,2,3,4,6,7,8,9,10,11");
        // (3,4) (2,4) (2,3) come from element 1
        assert_eq!(lines[element_at + 2], "2,2,3,4,5,11,10,6,12,13,14");
        assert_eq!(lines.last(), Some(&"!END"));

        // every node record sits before the element header
        let node_lines = lines[..element_at]
            .iter()
            .filter(|l| !l.starts_with('!'))
            .count();
        assert_eq!(node_lines, 5 + 9);
    }

    #[test]
    fn test_comment_in_element_section_stays_with_elements() {
        let input = "\
!NODE
1,0,0,0
2,1,0,0
3,0,1,0
4,0,0,1
!ELEMENT, TYPE=341
# first element
1,1,2,3,4
";
        let (_, out) = run(input).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let comment_at = lines.iter().position(|l| *l == "# first element").unwrap();
        assert_eq!(lines[comment_at - 1], "!ELEMENT, TYPE=342");
        assert!(lines[comment_at + 1].starts_with("1,1,2,3,4,"));
    }

    #[test]
    fn test_node_header_reopened_after_other_section() {
        let input = "\
!NODE
1,0,0,0
2,1,0,0
3,0,1,0
4,0,0,1
!NGROUP, NGRP=FIX
1
!ELEMENT, TYPE=341
1,1,2,3,4
";
        let (_, out) = run(input).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        let group_at = lines.iter().position(|l| l.starts_with("!NGROUP")).unwrap();
        assert_eq!(lines[group_at + 1], "1");
        assert_eq!(lines[group_at + 2], "!NODE");
        assert!(lines[group_at + 3].starts_with("5,"));
    }

    #[test]
    fn test_second_element_section_keeps_order() {
        let input = "\
!NODE
1,0,0,0
2,1,0,0
3,0,1,0
4,0,0,1
5,1,1,1
!ELEMENT, TYPE=341
1,1,2,3,4
!EGROUP, EGRP=A
1
!ELEMENT, TYPE=341
2,2,3,4,5
";
        let (summary, out) = run(input).unwrap();
        assert_eq!(summary.elements, 2);
        let lines: Vec<&str> = out.lines().collect();
        let first = lines.iter().position(|l| l.starts_with("1,1,2,3,4")).unwrap();
        let group = lines.iter().position(|l| l.starts_with("!EGROUP")).unwrap();
        let second = lines.iter().position(|l| l.starts_with("2,2,3,4,5")).unwrap();
        assert!(first < group && group < second);
        // new midpoints of element 2 need a fresh NODE block after the group
        assert_eq!(lines[group + 2], "!NODE");
    }

    #[test]
    fn test_wrong_element_type_rejected() {
        let input = "!NODE\n1,0,0,0\n!ELEMENT, TYPE=342\n";
        let err = run(input).unwrap_err();
        assert!(matches!(
            err,
            Error::AtLine { line: 3, ref source }
                if matches!(**source, Error::UnexpectedElementType { .. })
        ));
    }

    #[test]
    fn test_group_name_with_other_code() {
        let input = TWO_TETS.replace("TYPE=341, EGRP=ALL", "EGRP=PART342, TYPE=341");
        let (summary, out) = run(&input).unwrap();
        assert_eq!(summary.elements, 2);
        assert!(out.contains("\n!ELEMENT, EGRP=PART342, TYPE=342\n"));
    }

    #[test]
    fn test_text_after_last_node_ignored() {
        let input = TWO_TETS.replace("1,1,2,3,4\n", "1,1,2,3,4 first\n");
        let (summary, out) = run(&input).unwrap();
        assert_eq!(summary.elements, 2);
        assert!(out.contains("\n1,1,2,3,4,6,7,8,9,10,11\n"));
    }

    #[test]
    fn test_header_without_type_code() {
        let err = run("!NODE\n1,0,0,0\n!ELEMENT, TYPE=361\n").unwrap_err();
        assert!(matches!(
            err,
            Error::CoreError(fstr_mesh_core::Error::AtLine { line: 3, ref source })
                if matches!(**source, fstr_mesh_core::Error::MissingElementType { .. })
        ));
    }

    #[test]
    fn test_element_without_nodes_rejected() {
        let err = run("!ELEMENT, TYPE=341\n1,1,2,3,4\n").unwrap_err();
        assert!(err.to_string().contains("no nodes"), "{}", err);
    }

    #[test]
    fn test_unknown_node_reported_with_line() {
        let input = "!NODE\n1,0,0,0\n2,1,0,0\n3,0,1,0\n!ELEMENT, TYPE=341\n1,1,9,2,3\n";
        let err = run(input).unwrap_err();
        assert_eq!(err.to_string(), "line 6: node 9 not found");
    }

    #[test]
    fn test_element_order_enforced() {
        let input = "\
!NODE
1,0,0,0
2,1,0,0
3,0,1,0
4,0,0,1
!ELEMENT, TYPE=341
2,1,2,3,4
1,1,2,3,4
";
        let err = run(input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 8: element id 1 does not follow previous id 2"
        );
    }

    #[test]
    fn test_banner() {
        let mut out = Vec::new();
        let options = ConvertOptions::default().with_source_name("tet.msh");
        linearize("!NODE\n".as_bytes(), &mut out, &options).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("#####"));
        assert!(text.contains("# Original 341 mesh: tet.msh\n"));
        assert!(text.ends_with("!NODE\n"));
    }
}
