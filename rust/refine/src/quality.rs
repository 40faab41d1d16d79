// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subdivision quality tracking
//!
//! Degenerate output is reported, never fatal. Each subdivided element
//! contributes one aspect ratio (longest discarded diagonal over the chosen
//! one, squared lengths) and one volume ratio (sum of sub-volumes over the
//! parent volume). Inverted sub-tetrahedra and out-of-range ratios flag the
//! element, and flagged elements are dumped for inspection when a dump
//! directory is configured.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use fstr_mesh_core::ElemId;

use crate::node_store::Node;
use crate::options::QualityConfig;

/// Extreme value and the element it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub value: f64,
    pub elem_id: ElemId,
}

/// Running min/max with element attribution
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RangeStat {
    pub min: Option<Extremum>,
    pub max: Option<Extremum>,
}

impl RangeStat {
    pub fn update(&mut self, value: f64, elem_id: ElemId) {
        if value.is_nan() {
            return;
        }
        if self.min.map_or(true, |m| value < m.value) {
            self.min = Some(Extremum { value, elem_id });
        }
        if self.max.map_or(true, |m| value > m.value) {
            self.max = Some(Extremum { value, elem_id });
        }
    }
}

impl fmt::Display for RangeStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(
                f,
                "min = {:.6} (elemID: {}), max = {:.6} (elemID: {})",
                min.value, min.elem_id, max.value, max.elem_id
            ),
            _ => f.write_str("no elements"),
        }
    }
}

/// Summary of the quality checks of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QualityReport {
    pub aspect_ratio: RangeStat,
    pub volume_ratio: RangeStat,
    /// Individual problems: inverted tets and out-of-range ratios
    pub errors: usize,
    pub inverted: usize,
    /// Elements with at least one problem
    pub flagged_elements: usize,
    pub dumps_written: usize,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "aspect ratio: {}", self.aspect_ratio)?;
        writeln!(f, "volume ratio: {}", self.volume_ratio)?;
        write!(
            f,
            "problems: {} ({} inverted) in {} elements",
            self.errors, self.inverted, self.flagged_elements
        )
    }
}

/// Accumulates quality statistics while elements are subdivided
#[derive(Debug)]
pub struct QualityTracker {
    config: QualityConfig,
    report: QualityReport,
    element_errors: usize,
}

impl QualityTracker {
    pub fn new(config: QualityConfig) -> Self {
        Self {
            config,
            report: QualityReport::default(),
            element_errors: 0,
        }
    }

    /// Start checking a new parent element
    pub fn begin_element(&mut self) {
        self.element_errors = 0;
    }

    /// Check one tetrahedron volume
    ///
    /// `part` is 0 for the parent and 1..=8 for the sub-tetrahedra.
    pub fn check_volume(&mut self, elem_id: ElemId, part: usize, volume: f64) -> f64 {
        if volume <= 0.0 {
            tracing::warn!(elem_id, part, volume, "Non-positive tetrahedron volume");
            self.report.inverted += 1;
            self.flag();
        }
        volume
    }

    /// Record the ratios of a subdivided element
    pub fn record_ratios(&mut self, elem_id: ElemId, aspect_ratio: f64, volume_ratio: f64) {
        if aspect_ratio > self.config.aspect_ratio_limit {
            tracing::warn!(elem_id, aspect_ratio, "Big aspect ratio");
            self.flag();
        }
        self.report.aspect_ratio.update(aspect_ratio, elem_id);

        if !self.config.volume_ratio_ok(volume_ratio) {
            tracing::warn!(elem_id, volume_ratio, "Strange volume ratio");
            self.flag();
        }
        self.report.volume_ratio.update(volume_ratio, elem_id);
    }

    /// Close the current element, dumping it if anything was flagged
    ///
    /// Returns whether the element was flagged.
    pub fn finish_element(&mut self, elem_id: ElemId, nodes: &[Node; 10]) -> bool {
        if self.element_errors == 0 {
            return false;
        }
        self.report.flagged_elements += 1;

        if let Some(dir) = &self.config.dump_dir {
            match write_element_dump(dir, elem_id, nodes) {
                Ok(path) => {
                    tracing::debug!(path = %path.display(), "Wrote element dump");
                    self.report.dumps_written += 1;
                }
                Err(e) => {
                    tracing::warn!(elem_id, error = %e, "Failed to write element dump");
                }
            }
        }
        true
    }

    fn flag(&mut self) {
        self.report.errors += 1;
        self.element_errors += 1;
    }

    pub fn into_report(self) -> QualityReport {
        self.report
    }
}

/// Path of the dump file for `elem_id` inside `dir`
pub fn dump_path(dir: &Path, elem_id: ElemId) -> PathBuf {
    dir.join(format!("e{}.inp", elem_id))
}

/// Write the ten nodes of a quadratic element as an AVS UCD file
pub fn write_element_dump(dir: &Path, elem_id: ElemId, nodes: &[Node; 10]) -> io::Result<PathBuf> {
    let path = dump_path(dir, elem_id);
    let mut out = BufWriter::new(File::create(&path)?);
    write_ucd(&mut out, nodes)?;
    out.flush()?;
    Ok(path)
}

fn write_ucd<W: Write>(out: &mut W, nodes: &[Node; 10]) -> io::Result<()> {
    out.write_all(b"1\ndata\nstep1\n10 1\n")?;
    for (i, node) in nodes.iter().enumerate() {
        writeln!(out, "{} {:.6} {:.6} {:.6}", i + 1, node.x, node.y, node.z)?;
    }
    // UCD tet2 connectivity of the local nodes
    out.write_all(b"1 0 tet2 1 2 4 3 7 8 6 9 10 5\n1 0\n1 1\nID,\n")?;
    for (i, node) in nodes.iter().enumerate() {
        writeln!(out, "{} {}", i + 1, node.id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes() -> [Node; 10] {
        let mut nodes = [Node {
            id: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }; 10];
        for (i, node) in nodes.iter_mut().enumerate() {
            node.id = 100 + i as i64;
            node.x = i as f64;
        }
        nodes
    }

    #[test]
    fn test_range_stat() {
        let mut stat = RangeStat::default();
        assert_eq!(stat.to_string(), "no elements");
        stat.update(2.0, 1);
        stat.update(1.0, 2);
        stat.update(f64::NAN, 3);
        stat.update(3.0, 4);
        assert_eq!(stat.min, Some(Extremum { value: 1.0, elem_id: 2 }));
        assert_eq!(stat.max, Some(Extremum { value: 3.0, elem_id: 4 }));
        assert_eq!(
            stat.to_string(),
            "min = 1.000000 (elemID: 2), max = 3.000000 (elemID: 4)"
        );
    }

    #[test]
    fn test_clean_element() {
        let mut tracker = QualityTracker::new(QualityConfig::default());
        tracker.begin_element();
        tracker.check_volume(1, 0, 1.0);
        tracker.record_ratios(1, 1.0, 1.0);
        assert!(!tracker.finish_element(1, &nodes()));
        assert!(tracker.into_report().is_clean());
    }

    #[test]
    fn test_flagged_element() {
        let mut tracker = QualityTracker::new(QualityConfig::default());
        tracker.begin_element();
        tracker.check_volume(7, 3, -0.5);
        tracker.check_volume(7, 4, 0.0);
        tracker.record_ratios(7, 600.0, 3.0);
        assert!(tracker.finish_element(7, &nodes()));

        let report = tracker.into_report();
        assert_eq!(report.errors, 4);
        assert_eq!(report.inverted, 2);
        assert_eq!(report.flagged_elements, 1);
        assert_eq!(report.dumps_written, 0);
    }

    #[test]
    fn test_flags_reset_per_element() {
        let mut tracker = QualityTracker::new(QualityConfig::default());
        tracker.begin_element();
        tracker.record_ratios(1, 1.0, 0.1);
        assert!(tracker.finish_element(1, &nodes()));
        tracker.begin_element();
        tracker.record_ratios(2, 1.0, 1.0);
        assert!(!tracker.finish_element(2, &nodes()));
        assert_eq!(tracker.into_report().flagged_elements, 1);
    }

    #[test]
    fn test_ucd_layout() {
        let mut out = Vec::new();
        write_ucd(&mut out, &nodes()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4 + 10 + 4 + 10);
        assert_eq!(lines[3], "10 1");
        assert_eq!(lines[4], "1 0.000000 0.000000 0.000000");
        assert_eq!(lines[13], "10 9.000000 0.000000 0.000000");
        assert_eq!(lines[14], "1 0 tet2 1 2 4 3 7 8 6 9 10 5");
        assert_eq!(lines[17], "ID,");
        assert_eq!(lines[18], "1 100");
        assert_eq!(lines[27], "10 109");
    }

    #[test]
    fn test_dump_written_to_dir() {
        let dir = std::env::temp_dir().join(format!("fstr-mesh-quality-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let config = QualityConfig {
            dump_dir: Some(dir.clone()),
            ..QualityConfig::default()
        };
        let mut tracker = QualityTracker::new(config);
        tracker.begin_element();
        tracker.check_volume(42, 1, -1.0);
        assert!(tracker.finish_element(42, &nodes()));
        assert_eq!(tracker.into_report().dumps_written, 1);

        let path = dump_path(&dir, 42);
        assert!(path.ends_with("e42.inp"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("1\ndata\nstep1\n"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_dump_failure_is_not_fatal() {
        let config = QualityConfig {
            dump_dir: Some(PathBuf::from("/nonexistent/fstr-mesh/dumps")),
            ..QualityConfig::default()
        };
        let mut tracker = QualityTracker::new(config);
        tracker.begin_element();
        tracker.check_volume(1, 0, 0.0);
        assert!(tracker.finish_element(1, &nodes()));
        assert_eq!(tracker.into_report().dumps_written, 0);
    }
}
