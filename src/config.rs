//! Field configuration.
//!
//! [`FieldConfig`] can be built in code with `with_*` methods or loaded from
//! JSON. Missing JSON keys fall back to the defaults, so a file containing
//! only `{ "particle_count": 400 }` is valid.
//!
//! ```ignore
//! let config = FieldConfig::new()
//!     .with_particle_count(300)
//!     .with_link_distance(120.0)
//!     .with_edge_scan(EdgeScan::Grid)
//!     .with_seed(42);
//! config.validate()?;
//! ```

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::visuals::{default_backdrop, ColorStop, OverlayConfig, Rgba};

/// Inclusive-exclusive range a per-particle value is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRange {
    pub min: f32,
    pub max: f32,
}

impl SampleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `min + u * (max - min)` with `u` uniform in `[0, 1)`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.min + rng.gen::<f32>() * (self.max - self.min)
    }

    fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// How the renderer finds particle pairs closer than the link distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeScan {
    /// Test every unordered pair. O(n²).
    #[default]
    BruteForce,
    /// Bucket particles into cells one link distance wide and only test
    /// neighbouring cells. Produces the same links in the same order.
    Grid,
}

/// Everything that shapes a particle field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Number of particles, fixed for an activation.
    pub particle_count: usize,
    /// Pairs closer than this are linked.
    pub link_distance: f32,
    /// Stroke width of links.
    pub link_width: f32,
    pub radius: SampleRange,
    /// Sampled opacity; values above 1.0 are clamped when painting.
    pub opacity: SampleRange,
    /// Per-axis velocity range, in units per frame.
    pub speed: SampleRange,
    pub particle_color: Rgba,
    pub link_color: Rgba,
    /// Stops of the corner-to-corner backdrop gradient.
    pub backdrop: Vec<ColorStop>,
    /// Pulsing radial tint over the field; `None` disables it.
    pub overlay: Option<OverlayConfig>,
    pub edge_scan: EdgeScan,
    /// Seed for reproducible particle sets. Random when unset.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 200,
            link_distance: 100.0,
            link_width: 0.8,
            radius: SampleRange::new(2.0, 4.0),
            opacity: SampleRange::new(0.8, 1.3),
            speed: SampleRange::new(-1.0, 1.0),
            particle_color: Rgba::WHITE,
            link_color: Rgba::WHITE,
            backdrop: default_backdrop(),
            overlay: Some(OverlayConfig::default()),
            edge_scan: EdgeScan::BruteForce,
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_link_distance(mut self, distance: f32) -> Self {
        self.link_distance = distance;
        self
    }

    pub fn with_link_width(mut self, width: f32) -> Self {
        self.link_width = width;
        self
    }

    pub fn with_radius(mut self, min: f32, max: f32) -> Self {
        self.radius = SampleRange::new(min, max);
        self
    }

    pub fn with_opacity(mut self, min: f32, max: f32) -> Self {
        self.opacity = SampleRange::new(min, max);
        self
    }

    pub fn with_speed(mut self, min: f32, max: f32) -> Self {
        self.speed = SampleRange::new(min, max);
        self
    }

    pub fn with_colors(mut self, particle: Rgba, link: Rgba) -> Self {
        self.particle_color = particle;
        self.link_color = link;
        self
    }

    pub fn with_backdrop(mut self, stops: Vec<ColorStop>) -> Self {
        self.backdrop = stops;
        self
    }

    pub fn with_overlay(mut self, overlay: Option<OverlayConfig>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_edge_scan(mut self, scan: EdgeScan) -> Self {
        self.edge_scan = scan;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Parse a JSON document. Does not validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !(self.link_distance.is_finite() && self.link_distance > 0.0) {
            return invalid(format!("link_distance must be positive, got {}", self.link_distance));
        }
        if !(self.link_width.is_finite() && self.link_width > 0.0) {
            return invalid(format!("link_width must be positive, got {}", self.link_width));
        }
        for (name, range) in [("radius", self.radius), ("opacity", self.opacity), ("speed", self.speed)] {
            if !range.is_ordered() {
                return invalid(format!("{} range {}..{} is not ordered", name, range.min, range.max));
            }
        }
        if self.radius.min <= 0.0 {
            return invalid("radius must be greater than zero".into());
        }
        if self.opacity.min <= 0.0 {
            return invalid("opacity must be greater than zero".into());
        }
        if self.backdrop.is_empty() {
            return invalid("backdrop needs at least one colour stop".into());
        }
        let mut previous = 0.0;
        for stop in &self.backdrop {
            if !(0.0..=1.0).contains(&stop.offset) || stop.offset < previous {
                return invalid(format!(
                    "backdrop stop offsets must ascend within 0..=1, got {}",
                    stop.offset
                ));
            }
            previous = stop.offset;
        }
        if let Some(overlay) = &self.overlay {
            if !(overlay.period.is_finite() && overlay.period > 0.0) {
                return invalid(format!("overlay period must be positive, got {}", overlay.period));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = FieldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.particle_count, 200);
        assert_eq!(config.link_distance, 100.0);
        assert_eq!(config.edge_scan, EdgeScan::BruteForce);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = FieldConfig::from_json_str(
            r#"{ "particle_count": 42, "edge_scan": "grid", "overlay": null }"#,
        )
        .unwrap();
        assert_eq!(config.particle_count, 42);
        assert_eq!(config.edge_scan, EdgeScan::Grid);
        assert!(config.overlay.is_none());
        assert_eq!(config.link_width, 0.8);
        assert_eq!(config.backdrop.len(), 3);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = FieldConfig::from_json_str("{ particle_count: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            FieldConfig::new().with_link_distance(0.0),
            FieldConfig::new().with_link_distance(f32::NAN),
            FieldConfig::new().with_link_width(-1.0),
            FieldConfig::new().with_radius(0.0, 4.0),
            FieldConfig::new().with_radius(4.0, 2.0),
            FieldConfig::new().with_opacity(0.0, 1.0),
            FieldConfig::new().with_speed(1.0, -1.0),
            FieldConfig::new().with_backdrop(Vec::new()),
            FieldConfig::new().with_backdrop(vec![
                ColorStop::new(0.6, Rgba::WHITE),
                ColorStop::new(0.2, Rgba::BLACK),
            ]),
            FieldConfig::new().with_overlay(Some(OverlayConfig {
                period: 0.0,
                ..OverlayConfig::default()
            })),
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "accepted {:?}",
                config
            );
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = FieldConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
