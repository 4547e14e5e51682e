//! Pipeline configuration.
//!
//! [`PipelineConfig`] is loaded from JSON with camelCase option names
//! (`minSpotRadius`, `maxLinkingDistance`, ...) and validated before any
//! image is touched.
//!
//! ```rust
//! use fluotrack::PipelineConfig;
//!
//! let cfg = PipelineConfig::from_json_str(r#"{ "fluorescenceThreshold": 600.0 }"#).unwrap();
//! assert_eq!(cfg.fluorescence_threshold, 600.0);
//! assert_eq!(cfg.max_linking_distance, 15.0);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::features::FeatureKind;
use crate::tracker::LinkerConfig;

/// Which spot detector to run on each plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DetectorKind {
    /// One spot per pre-drawn overlay region of the frame.
    #[default]
    Overlay,
    /// Local intensity maxima above `threshold`.
    LocalMaxima { threshold: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Spot radius in pixels. Default: 7.5.
    pub min_spot_radius: f64,
    /// Channel spots are detected and tracked on. Default: 0.
    pub target_channel: usize,
    /// Depth slice detection and features are sampled on. Default: 0.
    pub target_depth: usize,
    /// Channel fluorescence is measured on. Default: 1.
    pub fluorescence_channel: usize,
    /// Default: 15.0.
    pub max_linking_distance: f64,
    /// Default: true.
    pub allow_splitting: bool,
    /// Default: 45.0.
    pub splitting_max_distance: f64,
    /// Default: 550.0.
    pub fluorescence_threshold: f64,
    pub detector: DetectorKind,
    pub feature: FeatureKind,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_spot_radius: 7.5,
            target_channel: 0,
            target_depth: 0,
            fluorescence_channel: 1,
            max_linking_distance: 15.0,
            allow_splitting: true,
            splitting_max_distance: 45.0,
            fluorescence_threshold: 550.0,
            detector: DetectorKind::default(),
            feature: FeatureKind::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values that cannot be used; nothing is coerced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("minSpotRadius", self.min_spot_radius)?;
        check_non_negative("maxLinkingDistance", self.max_linking_distance)?;
        check_non_negative("fluorescenceThreshold", self.fluorescence_threshold)?;

        if self.allow_splitting {
            check_non_negative("splittingMaxDistance", self.splitting_max_distance)?;
            if self.splitting_max_distance < self.max_linking_distance {
                return Err(ConfigError::invalid_value(
                    "splittingMaxDistance",
                    "must be >= maxLinkingDistance when splitting is allowed",
                ));
            }
        }

        if let DetectorKind::LocalMaxima { threshold } = self.detector
            && !threshold.is_finite()
        {
            return Err(ConfigError::invalid_value(
                "detector.threshold",
                "must be finite",
            ));
        }
        Ok(())
    }

    pub fn linker_config(&self) -> LinkerConfig {
        LinkerConfig {
            max_linking_distance: self.max_linking_distance,
            allow_splitting: self.allow_splitting,
            splitting_max_distance: self.splitting_max_distance,
        }
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be a finite value >= 0.0, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn json_round_trip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let original = PipelineConfig {
            detector: DetectorKind::LocalMaxima { threshold: 200.0 },
            allow_splitting: false,
            ..PipelineConfig::default()
        };
        original.to_json(&path).unwrap();
        let loaded = PipelineConfig::from_json(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn camel_case_keys() {
        let cfg = PipelineConfig::from_json_str(
            r#"{
                "minSpotRadius": 3.0,
                "targetChannel": 2,
                "maxLinkingDistance": 5.0,
                "allowSplitting": true,
                "splittingMaxDistance": 20.0,
                "fluorescenceThreshold": 550.0,
                "detector": { "kind": "localMaxima", "threshold": 10.0 },
                "feature": "totalIntensity"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.min_spot_radius, 3.0);
        assert_eq!(cfg.target_channel, 2);
        assert_eq!(cfg.detector, DetectorKind::LocalMaxima { threshold: 10.0 });
        assert_eq!(cfg.feature, FeatureKind::TotalIntensity);
    }

    #[test]
    fn negative_threshold_is_invalid() {
        let cfg = PipelineConfig {
            fluorescence_threshold: -1.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue {
                field: "fluorescenceThreshold",
                ..
            })
        ));
    }

    #[test]
    fn negative_distance_is_invalid() {
        let cfg = PipelineConfig {
            max_linking_distance: -5.0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn splitting_distance_below_linking_is_invalid() {
        let cfg = PipelineConfig {
            max_linking_distance: 20.0,
            splitting_max_distance: 10.0,
            ..PipelineConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = PipelineConfig {
            allow_splitting: false,
            ..cfg
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn non_finite_detector_threshold_is_invalid() {
        let cfg = PipelineConfig {
            detector: DetectorKind::LocalMaxima {
                threshold: f32::NAN,
            },
            ..PipelineConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue {
                field: "detector.threshold",
                ..
            })
        ));
    }

    #[test]
    fn invalid_json_is_rejected() {
        assert!(matches!(
            PipelineConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(PipelineConfig::from_json_str(r#"{ "minSpotRadius": -2.0 }"#).is_err());
    }
}
