// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion options

use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Aspect ratio above which a subdivided element is reported
pub const DEFAULT_ASPECT_RATIO_LIMIT: f64 = 500.0;

/// Accepted sum-of-sub-volumes / parent-volume range
pub const DEFAULT_VOLUME_RATIO_RANGE: RangeInclusive<f64> = 0.5..=2.0;

/// Thresholds and side output of the subdivision quality checks
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    pub aspect_ratio_limit: f64,
    pub volume_ratio_min: f64,
    pub volume_ratio_max: f64,
    /// Where `e<id>.inp` dumps of flagged elements go; `None` disables them
    pub dump_dir: Option<PathBuf>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            aspect_ratio_limit: DEFAULT_ASPECT_RATIO_LIMIT,
            volume_ratio_min: *DEFAULT_VOLUME_RATIO_RANGE.start(),
            volume_ratio_max: *DEFAULT_VOLUME_RATIO_RANGE.end(),
            dump_dir: None,
        }
    }
}

impl QualityConfig {
    /// Whether `ratio` lies inside the accepted volume ratio range.
    /// NaN never does.
    pub fn volume_ratio_ok(&self, ratio: f64) -> bool {
        (self.volume_ratio_min..=self.volume_ratio_max).contains(&ratio)
    }
}

/// Options shared by the converters
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Source name recorded in the output banner
    pub source_name: String,
    /// Write the `#` banner at the top of the output
    pub banner: bool,
    pub quality: QualityConfig,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            source_name: "stdin".to_string(),
            banner: true,
            quality: QualityConfig::default(),
        }
    }
}

impl ConvertOptions {
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    pub fn without_banner(mut self) -> Self {
        self.banner = false;
        self
    }

    pub fn with_quality(mut self, quality: QualityConfig) -> Self {
        self.quality = quality;
        self
    }
}
