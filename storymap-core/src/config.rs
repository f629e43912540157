//! View configuration.
//!
//! Parsed from a TOML file where every key is optional:
//!
//! ```toml
//! default_center = { lat = 52.52, lng = 13.405 }
//! default_zoom = 12
//! min_zoom = 3
//! max_zoom = 18
//! scroll_debounce_ms = 100
//! visibility_policy = "windowed"
//! focus_reference_line = "top"
//!
//! [default_time_range]
//! start = "1930-01-01"
//! end = "1945-12-31"
//! ```

use crate::focus::ReferenceLine;
use crate::moment::Moment;
use crate::story::Position;
use crate::temporal::TimeRange;
use crate::visibility::VisibilityPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Errors from loading or validating a [`ViewConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the view core needs to know about its surroundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Map center when there is nothing to frame.
    pub default_center: Position,

    /// Map zoom when there is nothing to frame.
    pub default_zoom: i32,

    /// Lowest zoom the framer may produce.
    pub min_zoom: i32,

    /// Highest zoom the framer may produce.
    pub max_zoom: i32,

    /// Zoom used when every framed story sits on the same point.
    pub single_point_zoom: i32,

    /// Quiet period before a scroll-driven focus candidate is applied.
    pub scroll_debounce_ms: u64,

    /// How long a focus change may stay `Applying` without the renderer
    /// acknowledging it.
    pub propagation_timeout_ms: u64,

    /// Whether the time control filters the list or only recolors it.
    pub visibility_policy: VisibilityPolicy,

    /// Which line of the list viewport picks the scroll-driven focus.
    pub focus_reference_line: ReferenceLine,

    /// Time-control bounds used when the collection carries no dates.
    pub default_time_range: TimeRange,

    /// Where the time control starts.
    pub initial_moment: Moment,
}

fn date(year: i32, month: u32, day: u32) -> Moment {
    Moment::from_ymd(year, month, day).unwrap_or_default()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_center: Position {
                lat: 52.52,
                lng: 13.405,
            },
            default_zoom: 12,
            min_zoom: 3,
            max_zoom: 18,
            single_point_zoom: 15,
            scroll_debounce_ms: 100,
            propagation_timeout_ms: 600,
            visibility_policy: VisibilityPolicy::Unfiltered,
            focus_reference_line: ReferenceLine::Center,
            default_time_range: TimeRange::new(date(1930, 1, 1), date(1945, 12, 31)),
            initial_moment: date(1930, 1, 1),
        }
    }
}

impl ViewConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file and validate it.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).await?;
        Self::from_toml_str(&text)
    }

    /// Check that the values are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_zoom > self.max_zoom {
            return Err(ConfigError::Invalid(format!(
                "min_zoom ({}) is greater than max_zoom ({})",
                self.min_zoom, self.max_zoom
            )));
        }
        if !self.default_center.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "default_center {} is not a valid coordinate",
                self.default_center
            )));
        }
        let range = self.default_time_range;
        if range.start > range.end {
            return Err(ConfigError::Invalid(format!(
                "default_time_range start ({}) is after its end ({})",
                range.start, range.end
            )));
        }
        Ok(())
    }

    /// Set the fallback map center.
    pub fn with_default_center(mut self, center: Position) -> Self {
        self.default_center = center;
        self
    }

    /// Set the fallback map zoom.
    pub fn with_default_zoom(mut self, zoom: i32) -> Self {
        self.default_zoom = zoom;
        self
    }

    /// Set the zoom clamp range.
    pub fn with_zoom_bounds(mut self, min: i32, max: i32) -> Self {
        self.min_zoom = min;
        self.max_zoom = max;
        self
    }

    /// Set the zoom for single-point framing.
    pub fn with_single_point_zoom(mut self, zoom: i32) -> Self {
        self.single_point_zoom = zoom;
        self
    }

    /// Set the scroll debounce interval.
    pub fn with_scroll_debounce(mut self, interval: Duration) -> Self {
        self.scroll_debounce_ms = interval.as_millis() as u64;
        self
    }

    /// Set the propagation timeout.
    pub fn with_propagation_timeout(mut self, timeout: Duration) -> Self {
        self.propagation_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the visibility policy.
    pub fn with_visibility_policy(mut self, policy: VisibilityPolicy) -> Self {
        self.visibility_policy = policy;
        self
    }

    /// Set the focus reference line.
    pub fn with_reference_line(mut self, line: ReferenceLine) -> Self {
        self.focus_reference_line = line;
        self
    }

    /// Set the fallback time-control bounds.
    pub fn with_default_time_range(mut self, range: TimeRange) -> Self {
        self.default_time_range = range;
        self
    }

    /// Set the starting moment of the time control.
    pub fn with_initial_moment(mut self, moment: Moment) -> Self {
        self.initial_moment = moment;
        self
    }

    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }

    pub fn propagation_timeout(&self) -> Duration {
        Duration::from_millis(self.propagation_timeout_ms)
    }

    /// Clamp a zoom level into `[min_zoom, max_zoom]`.
    pub fn clamp_zoom(&self, zoom: i32) -> i32 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewConfig::default();
        assert_eq!(config.default_center, Position { lat: 52.52, lng: 13.405 });
        assert_eq!(config.default_zoom, 12);
        assert_eq!(config.scroll_debounce(), Duration::from_millis(100));
        assert_eq!(config.visibility_policy, VisibilityPolicy::Unfiltered);
        assert_eq!(config.initial_moment.to_string(), "1930-01-01");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ViewConfig::from_toml_str(
            r#"
            min_zoom = 5
            visibility_policy = "windowed"
            focus_reference_line = "top"

            [default_time_range]
            start = "1961-08-13"
            end = "1989-11-09"
            "#,
        )
        .unwrap();

        assert_eq!(config.min_zoom, 5);
        assert_eq!(config.max_zoom, 18);
        assert_eq!(config.visibility_policy, VisibilityPolicy::Windowed);
        assert_eq!(config.focus_reference_line, ReferenceLine::Top);
        assert_eq!(config.default_time_range.start.to_string(), "1961-08-13");
        assert_eq!(config.default_zoom, 12);
    }

    #[test]
    fn test_rejects_inverted_zoom_bounds() {
        let result = ViewConfig::from_toml_str("min_zoom = 19\nmax_zoom = 4");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_bad_center() {
        let result = ViewConfig::from_toml_str("default_center = { lat = 120.0, lng = 0.0 }");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_reversed_time_range() {
        let result = ViewConfig::from_toml_str(
            r#"
            [default_time_range]
            start = "1989-11-09"
            end = "1961-08-13"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let single_day = ViewConfig::from_toml_str(
            r#"
            [default_time_range]
            start = "1961-08-13"
            end = "1961-08-13"
            "#,
        );
        assert!(single_day.is_ok());
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let result = ViewConfig::from_toml_str("visibility_policy = \"sometimes\"");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[tokio::test]
    async fn test_load_shipped_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../storymap.toml");
        let config = ViewConfig::load(path).await.unwrap();
        assert_eq!(config.initial_moment.to_string(), "1933-01-01");
        assert_eq!(config.default_time_range, ViewConfig::default().default_time_range);

        assert!(matches!(
            ViewConfig::load("/nonexistent/storymap.toml").await,
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_clamp_zoom() {
        let config = ViewConfig::new().with_zoom_bounds(4, 16);
        assert_eq!(config.clamp_zoom(2), 4);
        assert_eq!(config.clamp_zoom(20), 16);
        assert_eq!(config.clamp_zoom(10), 10);
    }
}
