// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 342 to 341 subdivision
//!
//! A quadratic tetrahedron is split into eight linear ones using its edge
//! midpoints as vertices: four corner tetrahedra, plus four around the
//! shortest of the three inner octahedron diagonals. Element `e` becomes
//! elements `8e-7 ..= 8e`, so element groups are rewritten the same way.

use std::io::{BufRead, Write};
use std::ops::RangeInclusive;

use fstr_mesh_core::{
    parse_element_record, parse_id_record, parse_node_record, write_element_record,
    write_node_record, write_verbatim, ElemId, ElementType, Line, LineClassifier,
    LineMode, NodeId, SectionKind,
};
use nalgebra::Point3;

use crate::element_store::IdSequence;
use crate::error::{Error, Result};
use crate::geometry::signed_tet_volume;
use crate::linearize::{expect_element_header, Phase};
use crate::node_store::{Node, NodeStore};
use crate::options::ConvertOptions;
use crate::quality::{QualityReport, QualityTracker};

/// Local node slots of the four corner tetrahedra
pub const CORNER_TETS: [[usize; 4]; 4] = [[0, 6, 5, 7], [6, 1, 4, 8], [5, 4, 2, 9], [7, 8, 9, 3]];

/// Inner octahedron diagonal, named by its two midpoint slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagonal {
    N4N7,
    N5N8,
    N6N9,
}

impl Diagonal {
    /// Pick the shortest diagonal from squared lengths
    ///
    /// `4-7` needs to be strictly shortest; otherwise `5-8` wins unless
    /// `6-9` is not longer. Returns the diagonal and the aspect ratio, the
    /// longer discarded length over the chosen one.
    pub fn choose(d47: f64, d58: f64, d69: f64) -> (Self, f64) {
        if d47 < d58 && d47 < d69 {
            (Diagonal::N4N7, d58.max(d69) / d47)
        } else if d58 < d69 {
            (Diagonal::N5N8, d47.max(d69) / d58)
        } else {
            (Diagonal::N6N9, d47.max(d58) / d69)
        }
    }

    /// Local node slots of the four tetrahedra around this diagonal
    pub const fn octahedron_tets(self) -> [[usize; 4]; 4] {
        match self {
            Diagonal::N4N7 => [[4, 7, 5, 6], [4, 7, 6, 8], [4, 7, 8, 9], [4, 7, 9, 5]],
            Diagonal::N5N8 => [[5, 8, 6, 4], [5, 8, 4, 9], [5, 8, 9, 7], [5, 8, 7, 6]],
            Diagonal::N6N9 => [[6, 9, 4, 5], [6, 9, 5, 7], [6, 9, 7, 8], [6, 9, 8, 4]],
        }
    }
}

/// Split of one quadratic element into eight linear ones
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub diagonal: Diagonal,
    pub aspect_ratio: f64,
    /// Local node slots, corner tetrahedra first
    pub tets: [[usize; 4]; 8],
}

/// Choose the split of a quadratic tetrahedron from its ten node positions
pub fn split_tet(points: &[Point3<f64>; 10]) -> Split {
    let d47 = nalgebra::distance_squared(&points[4], &points[7]);
    let d58 = nalgebra::distance_squared(&points[5], &points[8]);
    let d69 = nalgebra::distance_squared(&points[6], &points[9]);
    let (diagonal, aspect_ratio) = Diagonal::choose(d47, d58, d69);

    let mut tets = [[0usize; 4]; 8];
    tets[..4].copy_from_slice(&CORNER_TETS);
    tets[4..].copy_from_slice(&diagonal.octahedron_tets());
    Split {
        diagonal,
        aspect_ratio,
        tets,
    }
}

/// IDs of the eight elements replacing element `id`
#[inline]
pub fn child_ids(id: ElemId) -> Result<RangeInclusive<ElemId>> {
    let last = id
        .checked_mul(8)
        .ok_or(Error::ElementIdOverflow { id })?;
    let first = last
        .checked_sub(7)
        .ok_or(Error::ElementIdOverflow { id })?;
    Ok(first..=last)
}

/// Result of a subdivision run
#[derive(Debug, Clone, PartialEq)]
pub struct SubdivideSummary {
    pub nodes: usize,
    pub source_elements: usize,
    pub output_elements: usize,
    pub group_entries: usize,
    pub quality: QualityReport,
}

/// Streaming 342 to 341 converter
pub struct Subdivider<W: Write> {
    out: W,
    nodes: NodeStore,
    phase: Phase,
    element_order: IdSequence,
    quality: QualityTracker,
    source_elements: usize,
    group_entries: usize,
    options: ConvertOptions,
}

impl<W: Write> Subdivider<W> {
    pub fn new(out: W, options: &ConvertOptions) -> Self {
        Self {
            out,
            nodes: NodeStore::new(),
            phase: Phase::ExpectHeader,
            element_order: IdSequence::new(),
            quality: QualityTracker::new(options.quality.clone()),
            source_elements: 0,
            group_entries: 0,
            options: options.clone(),
        }
    }

    pub fn write_banner(&mut self) -> Result<()> {
        let rule = "#".repeat(62);
        writeln!(self.out, "{}", rule)?;
        writeln!(
            self.out,
            "# FrontSTR 341 mesh file subdivided by {} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(self.out, "# Original 342 mesh: {}", self.options.source_name)?;
        writeln!(self.out, "# CAUTION: The mesh may be wrong if you have BCs on surface.")?;
        writeln!(self.out, "{}", rule)?;
        Ok(())
    }

    pub fn process_line(&mut self, line: &Line<'_>) -> Result<()> {
        match line.mode {
            LineMode::Comment => write_verbatim(&mut self.out, line.text)?,
            LineMode::Header => self.header(line.section, line.text)?,
            LineMode::Data => match line.section {
                SectionKind::Node => {
                    let record = parse_node_record(line.text)?;
                    self.nodes.append_record(record);
                    write_node_record(&mut self.out, record.id, record.x, record.y, record.z)?;
                }
                SectionKind::Element => self.element_record(line.text)?,
                SectionKind::EGroup => {
                    let id = parse_id_record(line.text)?;
                    for child in child_ids(id)? {
                        writeln!(self.out, "{}", child)?;
                    }
                    self.group_entries += 1;
                }
                _ => write_verbatim(&mut self.out, line.text)?,
            },
        }
        Ok(())
    }

    fn header(&mut self, kind: SectionKind, text: &str) -> Result<()> {
        match (self.phase, kind) {
            (Phase::NodeSection, k) if k != SectionKind::Node => {
                tracing::info!(nodes = self.nodes.count(), "NODE section complete");
            }
            (Phase::ElementSection, k) if k != SectionKind::Element => {
                tracing::info!(elements = self.source_elements, "ELEMENT section complete");
            }
            _ => {}
        }

        match kind {
            SectionKind::Node => {
                if self.phase != Phase::NodeSection {
                    tracing::debug!("Reading NODE section");
                }
                write_verbatim(&mut self.out, text)?;
                self.phase = Phase::NodeSection;
            }
            SectionKind::Element => {
                let header = expect_element_header(text, ElementType::Quadratic10)?;
                if self.phase != Phase::ElementSection {
                    tracing::debug!("Reading ELEMENT section");
                }
                let rewritten = header.rewrite(text, header.element_type.counterpart());
                write_verbatim(&mut self.out, &rewritten)?;
                self.phase = Phase::ElementSection;
            }
            _ => {
                write_verbatim(&mut self.out, text)?;
                self.phase = Phase::OtherSection;
            }
        }
        Ok(())
    }

    fn element_record(&mut self, text: &str) -> Result<()> {
        let record = parse_element_record(text, ElementType::Quadratic10)?;
        let id = record.id;
        self.element_order.advance(id)?;
        let child_range = child_ids(id)?;

        let mut nodes = [Node {
            id: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }; 10];
        for (slot, &node_id) in nodes.iter_mut().zip(record.nodes.iter()) {
            *slot = *self.nodes.lookup(node_id)?;
        }
        let points = nodes.map(|node| node.position());
        let split = split_tet(&points);

        self.quality.begin_element();
        let parent = self.quality.check_volume(
            id,
            0,
            signed_tet_volume(&points[0], &points[1], &points[2], &points[3]),
        );

        let mut children = 0.0;
        for (part, (tet, child)) in split.tets.iter().zip(child_range).enumerate() {
            let ids: [NodeId; 4] = tet.map(|slot| nodes[slot].id);
            write_element_record(&mut self.out, child, &ids)?;

            let volume = signed_tet_volume(
                &points[tet[0]],
                &points[tet[1]],
                &points[tet[2]],
                &points[tet[3]],
            );
            children += self.quality.check_volume(id, part + 1, volume);
        }

        self.quality
            .record_ratios(id, split.aspect_ratio, children / parent);
        self.quality.finish_element(id, &nodes);
        self.source_elements += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<(SubdivideSummary, W)> {
        if self.phase == Phase::ElementSection {
            tracing::info!(elements = self.source_elements, "ELEMENT section complete");
        }
        self.phase = Phase::Done;
        self.out.flush()?;

        let summary = SubdivideSummary {
            nodes: self.nodes.count(),
            source_elements: self.source_elements,
            output_elements: 8 * self.source_elements,
            group_entries: self.group_entries,
            quality: self.quality.into_report(),
        };
        tracing::info!(
            elements = summary.source_elements,
            output_elements = summary.output_elements,
            problems = summary.quality.errors,
            "Subdivision complete"
        );
        if summary.source_elements > 0 {
            tracing::info!("Quality:\n{}", summary.quality);
        }
        Ok((summary, self.out))
    }
}

/// Subdivide a 342 mesh read from `input` into a 341 mesh written to `out`
pub fn subdivide<R: BufRead, W: Write>(
    input: R,
    out: W,
    options: &ConvertOptions,
) -> Result<SubdivideSummary> {
    let mut lines = LineClassifier::new(input);
    let mut engine = Subdivider::new(out, options);
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
