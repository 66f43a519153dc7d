//! Configuration management for the stylist core

use crate::constants::{
    DEFAULT_CLASH_PENALTY, DEFAULT_COLD_THRESHOLD_C, DEFAULT_CONFIDENCE_FLOOR, DEFAULT_EXTRACTOR_TIMEOUT_MS,
    DEFAULT_FIT_WEIGHT, DEFAULT_FUSION_TOLERANCE, DEFAULT_HEAT_THRESHOLD_C, DEFAULT_MIN_DETECTED_FRACTION,
    DEFAULT_MIN_GLOBAL_CONFIDENCE, DEFAULT_REFERENCE_SPAN_CM, DEFAULT_SINGLE_ANGLE_CAP, DEFAULT_TOP_K,
    DEFAULT_WEATHER_WEIGHT,
};
use crate::clothing::{ColorFamily, PatternClass};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Library configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Capture pipeline configuration
    pub capture: CaptureConfig,

    /// Multi-angle fusion configuration
    pub fusion: FusionConfig,

    /// Recommendation engine configuration
    pub recommend: RecommendConfig,
}

/// Capture pipeline parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Per-point confidence floor (0.0-1.0)
    pub confidence_floor: f64,

    /// Minimum fraction of expected landmarks that must clear the floor (0.0-1.0)
    pub min_detected_fraction: f64,

    /// Extractor call deadline in milliseconds
    pub extractor_timeout_ms: u64,

    /// Confidence ceiling for single-angle captures (0.0-1.0)
    pub single_angle_confidence_cap: f64,
}

/// Multi-angle fusion parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Positional disagreement tolerance in normalized coordinates
    pub tolerance: f64,

    /// Minimum global confidence required to persist a record (0.0-1.0)
    pub min_global_confidence: f64,

    /// Real-world ear-to-ear span used for scale calibration, in centimeters
    pub reference_span_cm: f64,
}

/// Recommendation engine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Number of outfit combinations returned
    pub top_k: usize,

    /// Weight of per-item fit scores in the combination score
    pub fit_weight: f64,

    /// Weight of per-item weather scores in the combination score
    pub weather_weight: f64,

    /// Penalty subtracted per clashing item pair
    pub clash_penalty: f64,

    /// Temperature below which outerwear becomes mandatory, in Celsius
    pub cold_threshold_c: f64,

    /// Temperature above which warm garments are penalized, in Celsius
    pub heat_threshold_c: f64,

    /// Pairwise color/pattern clash rule table
    #[serde(default)]
    pub clash_rules: ClashRules,
}

/// Rule table for pairwise item clashes.
///
/// A combination is penalized `clash_penalty` once per matching pair: two
/// items whose patterns form one of `pattern_pairs` (unordered), or whose
/// primary colors are two different members of the same `color_groups` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClashRules {
    /// Pattern pairs that compete when worn together
    pub pattern_pairs: Vec<(PatternClass, PatternClass)>,

    /// Color families whose distinct members clash as primary colors
    pub color_groups: Vec<Vec<ColorFamily>>,
}

impl Default for ClashRules {
    fn default() -> Self {
        Self {
            pattern_pairs: vec![
                (PatternClass::Graphic, PatternClass::Graphic),
                (PatternClass::Striped, PatternClass::Checked),
            ],
            color_groups: vec![vec![ColorFamily::Red, ColorFamily::Orange, ColorFamily::Pink]],
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
            min_detected_fraction: DEFAULT_MIN_DETECTED_FRACTION,
            extractor_timeout_ms: DEFAULT_EXTRACTOR_TIMEOUT_MS,
            single_angle_confidence_cap: DEFAULT_SINGLE_ANGLE_CAP,
        }
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_FUSION_TOLERANCE,
            min_global_confidence: DEFAULT_MIN_GLOBAL_CONFIDENCE,
            reference_span_cm: DEFAULT_REFERENCE_SPAN_CM,
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            fit_weight: DEFAULT_FIT_WEIGHT,
            weather_weight: DEFAULT_WEATHER_WEIGHT,
            clash_penalty: DEFAULT_CLASH_PENALTY,
            cold_threshold_c: DEFAULT_COLD_THRESHOLD_C,
            heat_threshold_c: DEFAULT_HEAT_THRESHOLD_C,
            clash_rules: ClashRules::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.capture.confidence_floor) {
            return Err(Error::ConfigError(
                "Confidence floor must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.capture.min_detected_fraction) {
            return Err(Error::ConfigError(
                "Minimum detected fraction must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.capture.extractor_timeout_ms == 0 {
            return Err(Error::ConfigError(
                "Extractor timeout must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.capture.single_angle_confidence_cap) {
            return Err(Error::ConfigError(
                "Single-angle confidence cap must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.fusion.tolerance <= 0.0 {
            return Err(Error::ConfigError("Fusion tolerance must be positive".to_string()));
        }
        if !(0.0..=1.0).contains(&self.fusion.min_global_confidence) {
            return Err(Error::ConfigError(
                "Minimum global confidence must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.fusion.min_global_confidence > self.capture.single_angle_confidence_cap {
            return Err(Error::ConfigError(
                "Single-angle cap below minimum global confidence would reject every single-photo capture".to_string(),
            ));
        }
        if self.fusion.reference_span_cm <= 0.0 {
            return Err(Error::ConfigError("Reference span must be positive".to_string()));
        }

        if self.recommend.top_k == 0 {
            return Err(Error::ConfigError("top_k must be greater than 0".to_string()));
        }
        if self.recommend.fit_weight < 0.0 || self.recommend.weather_weight < 0.0 {
            return Err(Error::ConfigError("Score weights must be non-negative".to_string()));
        }
        if self.recommend.fit_weight + self.recommend.weather_weight <= 0.0 {
            return Err(Error::ConfigError(
                "At least one score weight must be positive".to_string(),
            ));
        }
        if self.recommend.clash_penalty < 0.0 {
            return Err(Error::ConfigError("Clash penalty must be non-negative".to_string()));
        }
        if self.recommend.cold_threshold_c >= self.recommend.heat_threshold_c {
            return Err(Error::ConfigError(
                "Cold threshold must be below heat threshold".to_string(),
            ));
        }
        if self.recommend.clash_rules.color_groups.iter().any(|group| group.len() < 2) {
            return Err(Error::ConfigError(
                "Clash color groups need at least two families".to_string(),
            ));
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Stylist Core Configuration

# Capture pipeline parameters
capture:
  confidence_floor: 0.25
  min_detected_fraction: 0.5
  extractor_timeout_ms: 5000
  single_angle_confidence_cap: 0.4

# Multi-angle fusion parameters
fusion:
  tolerance: 0.08
  min_global_confidence: 0.3
  reference_span_cm: 16.0

# Recommendation engine parameters
recommend:
  top_k: 5
  fit_weight: 0.6
  weather_weight: 0.4
  clash_penalty: 0.15
  cold_threshold_c: 12.0
  heat_threshold_c: 26.0
  # Pairwise clash rule table: unordered pattern pairs, and color groups
  # whose distinct members clash as primary colors
  clash_rules:
    pattern_pairs:
      - [graphic, graphic]
      - [striped, checked]
    color_groups:
      - [red, orange, pink]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.recommend.top_k, 5);
    }

    #[test]
    fn test_clash_rules_are_tunable() {
        let yaml = r"
recommend:
  top_k: 5
  fit_weight: 0.6
  weather_weight: 0.4
  clash_penalty: 0.15
  cold_threshold_c: 12.0
  heat_threshold_c: 26.0
  clash_rules:
    pattern_pairs:
      - [checked, checked]
    color_groups:
      - [green, cyan]
";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.recommend.clash_rules.pattern_pairs,
            vec![(PatternClass::Checked, PatternClass::Checked)]
        );
        assert_eq!(
            config.recommend.clash_rules.color_groups,
            vec![vec![ColorFamily::Green, ColorFamily::Cyan]]
        );
    }

    #[test]
    fn test_single_member_color_group_rejected() {
        let mut config = Config::default();
        config.recommend.clash_rules.color_groups = vec![vec![ColorFamily::Red]];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut config = Config::default();
        config.capture.confidence_floor = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.recommend.cold_threshold_c = 30.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.capture.single_angle_confidence_cap = 0.1;
        assert!(config.validate().is_err());
    }
}
