//! Segmented progress configuration
//!
//! Every field except `radius` has a default, so a minimal TOML file is:
//!
//! ```toml
//! radius = 100
//! ```
//!
//! A fuller example:
//!
//! ```toml
//! radius = 100
//! stroke_width = 14
//! segments = 4
//! segments_gap = 30
//! progress_color = "#000"
//!
//! [indicator]
//! show = true
//! radius = 12
//! stroke_width = 4
//!
//! [timing]
//! total_duration_ms = 1200
//! initial_delay_ms = 10
//! easing = "linear"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::easing::Easing;
use crate::error::{ConfigError, Result};

/// Appearance and timing of one segmented progress indicator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Circle radius
    pub radius: f64,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    /// Color of the unfilled track
    #[serde(default = "default_base_color")]
    pub base_color: Color,
    /// Color of the filled arcs and the indicator
    #[serde(default = "default_progress_color")]
    pub progress_color: Color,
    /// Number of arcs the circle is split into
    #[serde(default = "default_segments")]
    pub segments: usize,
    /// Spacing between adjacent arcs
    #[serde(default)]
    pub segments_gap: f64,
    #[serde(default)]
    pub indicator: Option<IndicatorConfig>,
    #[serde(default)]
    pub timing: TimingConfig,
}

fn default_stroke_width() -> f64 {
    10.0
}

fn default_base_color() -> Color {
    Color::from_hex(0xFFEDE1)
}

fn default_progress_color() -> Color {
    Color::from_hex(0xF39E93)
}

fn default_segments() -> usize {
    3
}

/// Floating glyph (circle + percentage label) at the tip of the filled arc
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default)]
    pub show: bool,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub stroke_width: f64,
    /// Stroke of the glyph; the progress color when unset
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Vertical distance from the glyph center to the label baseline
    #[serde(default = "default_label_offset_y")]
    pub label_offset_y: f64,
}

fn default_font_size() -> f64 {
    18.0
}

fn default_label_offset_y() -> f64 {
    5.0
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            show: false,
            radius: 0.0,
            stroke_width: 0.0,
            color: None,
            font_size: default_font_size(),
            label_offset_y: default_label_offset_y(),
        }
    }
}

/// Animation constants
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Top of the progress scale
    #[serde(default = "default_max")]
    pub max: f64,
    /// Duration of a full 0..100 sweep
    #[serde(default = "default_total_duration_ms")]
    pub total_duration_ms: f64,
    /// Delay before the first segment and the indicator start
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: f64,
    #[serde(default)]
    pub easing: Easing,
}

fn default_max() -> f64 {
    100.0
}

fn default_total_duration_ms() -> f64 {
    1200.0
}

fn default_initial_delay_ms() -> f64 {
    10.0
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max: default_max(),
            total_duration_ms: default_total_duration_ms(),
            initial_delay_ms: default_initial_delay_ms(),
            easing: Easing::default(),
        }
    }
}

impl TimingConfig {
    /// Duration of a transition covering `amount` of the 0..100 scale
    pub fn duration_for(&self, amount: f64) -> f64 {
        (self.total_duration_ms * amount / 100.0).max(0.0)
    }
}

impl ProgressConfig {
    /// Configuration with the given radius and every other field defaulted
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            stroke_width: default_stroke_width(),
            base_color: default_base_color(),
            progress_color: default_progress_color(),
            segments: default_segments(),
            segments_gap: 0.0,
            indicator: None,
            timing: TimingConfig::default(),
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ProgressConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded progress config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The indicator settings when the indicator is shown
    pub fn visible_indicator(&self) -> Option<&IndicatorConfig> {
        self.indicator.as_ref().filter(|indicator| indicator.show)
    }

    /// Check ranges that a config file could get wrong
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::InvalidValue {
                field,
                reason: reason.into(),
            }
        }

        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(invalid("radius", format!("must be positive, got {}", self.radius)));
        }
        if self.stroke_width < 0.0 {
            return Err(invalid("stroke_width", "must not be negative"));
        }
        if self.segments == 0 {
            return Err(invalid("segments", "must be at least 1"));
        }
        if self.segments_gap < 0.0 || !self.segments_gap.is_finite() {
            return Err(invalid("segments_gap", "must be a non-negative number"));
        }
        if !(self.timing.max > 0.0) || !self.timing.max.is_finite() {
            return Err(invalid("timing.max", "must be positive"));
        }
        if self.timing.total_duration_ms < 0.0 {
            return Err(invalid("timing.total_duration_ms", "must not be negative"));
        }
        if self.timing.initial_delay_ms < 0.0 {
            return Err(invalid("timing.initial_delay_ms", "must not be negative"));
        }
        if let Some(indicator) = &self.indicator {
            if indicator.radius < 0.0 || indicator.stroke_width < 0.0 {
                return Err(invalid("indicator", "radius and stroke_width must not be negative"));
            }
        }
        Ok(())
    }
}
