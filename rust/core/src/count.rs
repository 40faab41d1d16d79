// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record counting without decoding

use std::io::BufRead;

use rustc_hash::FxHashMap;

use crate::classifier::{LineClassifier, LineMode, SectionKind};
use crate::error::Result;

/// Number of data records per section kind
#[derive(Debug, Clone, Default)]
pub struct MeshCounts {
    by_section: FxHashMap<SectionKind, usize>,
}

impl MeshCounts {
    /// Data records seen in sections of `kind`
    pub fn get(&self, kind: SectionKind) -> usize {
        self.by_section.get(&kind).copied().unwrap_or(0)
    }

    /// Number of node records
    pub fn nodes(&self) -> usize {
        self.get(SectionKind::Node)
    }

    /// Number of element records
    pub fn elements(&self) -> usize {
        self.get(SectionKind::Element)
    }
}

/// Count data records per section
pub fn count_records<R: BufRead>(reader: R) -> Result<MeshCounts> {
    let mut lines = LineClassifier::new(reader);
    let mut counts = MeshCounts::default();

    while let Some(line) = lines.next_line()? {
        if line.mode == LineMode::Data {
            *counts.by_section.entry(line.section).or_insert(0) += 1;
        }
    }

    Ok(counts)
}
