// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Converter configuration loaded from environment variables.

use std::path::PathBuf;

use fstr_mesh_refine::options::{DEFAULT_ASPECT_RATIO_LIMIT, DEFAULT_VOLUME_RATIO_RANGE};
use fstr_mesh_refine::QualityConfig;

/// Value of `FSTR_MESH_DUMP_DIR` that turns element dumps off.
const DUMP_OFF: &str = "off";

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for `e<id>.inp` dumps of flagged elements, if enabled.
    pub dump_dir: Option<PathBuf>,
    /// Aspect ratio above which a subdivided element is reported.
    pub aspect_ratio_limit: f64,
    /// Lower bound of the accepted volume ratio.
    pub volume_ratio_min: f64,
    /// Upper bound of the accepted volume ratio.
    pub volume_ratio_max: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(var: F) -> Self {
        let parse_or = |key: &str, default: f64| {
            var(key)
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite())
                .unwrap_or(default)
        };

        Self {
            dump_dir: match var("FSTR_MESH_DUMP_DIR") {
                Some(dir) if dir.eq_ignore_ascii_case(DUMP_OFF) => None,
                Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
                _ => Some(PathBuf::from(".")),
            },
            aspect_ratio_limit: parse_or("FSTR_MESH_ASPECT_LIMIT", DEFAULT_ASPECT_RATIO_LIMIT),
            volume_ratio_min: parse_or(
                "FSTR_MESH_VOLUME_RATIO_MIN",
                *DEFAULT_VOLUME_RATIO_RANGE.start(),
            ),
            volume_ratio_max: parse_or(
                "FSTR_MESH_VOLUME_RATIO_MAX",
                *DEFAULT_VOLUME_RATIO_RANGE.end(),
            ),
        }
    }

    /// Quality thresholds for the subdivision engine.
    pub fn quality(&self) -> QualityConfig {
        QualityConfig {
            aspect_ratio_limit: self.aspect_ratio_limit,
            volume_ratio_min: self.volume_ratio_min,
            volume_ratio_max: self.volume_ratio_max,
            dump_dir: self.dump_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.dump_dir, Some(PathBuf::from(".")));
        assert_eq!(config.aspect_ratio_limit, 500.0);
        assert_eq!(config.volume_ratio_min, 0.5);
        assert_eq!(config.volume_ratio_max, 2.0);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("FSTR_MESH_DUMP_DIR", "/tmp/dumps"),
            ("FSTR_MESH_ASPECT_LIMIT", "50"),
            ("FSTR_MESH_VOLUME_RATIO_MAX", " 1.5 "),
        ]);
        assert_eq!(config.dump_dir, Some(PathBuf::from("/tmp/dumps")));
        assert_eq!(config.aspect_ratio_limit, 50.0);
        assert_eq!(config.volume_ratio_max, 1.5);
        assert_eq!(config.quality().aspect_ratio_limit, 50.0);
    }

    #[test]
    fn test_dumps_off_and_bad_values() {
        let config = config(&[
            ("FSTR_MESH_DUMP_DIR", "OFF"),
            ("FSTR_MESH_ASPECT_LIMIT", "lots"),
            ("FSTR_MESH_VOLUME_RATIO_MIN", "NaN"),
        ]);
        assert!(config.dump_dir.is_none());
        assert_eq!(config.aspect_ratio_limit, 500.0);
        assert_eq!(config.volume_ratio_min, 0.5);
    }
}
