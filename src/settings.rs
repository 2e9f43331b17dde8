use crate::draw::model::{DrawColor, StrokeStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const SETTINGS_FILE: &str = "review_settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Suffix of the storage keys (`comments_v<N>`, `drawings_v<N>`).
    /// Changing it starts from fresh slots.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// When enabled the logger is initialised at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    /// Optional log file. Logs go to stdout when unset.
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_stroke_color")]
    pub stroke_color: DrawColor,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,
    #[serde(default = "default_quick_colors")]
    pub quick_colors: Vec<DrawColor>,
    /// Milliseconds the player chrome stays up after the last tap.
    #[serde(default = "default_overlay_hide_ms")]
    pub overlay_hide_ms: u64,
    /// How often the host should call `poll` on the session.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Step of the skip buttons in seconds.
    #[serde(default = "default_skip_seconds")]
    pub skip_seconds: f64,
}

fn default_schema_version() -> u32 {
    3
}

fn default_stroke_color() -> DrawColor {
    DrawColor::RED
}

fn default_stroke_width() -> f32 {
    3.0
}

fn default_quick_colors() -> Vec<DrawColor> {
    vec![DrawColor::RED, DrawColor::GREEN]
}

fn default_overlay_hide_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_skip_seconds() -> f64 {
    10.0
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            debug_logging: false,
            log_file: None,
            stroke_color: default_stroke_color(),
            stroke_width: default_stroke_width(),
            quick_colors: default_quick_colors(),
            overlay_hide_ms: default_overlay_hide_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            skip_seconds: default_skip_seconds(),
        }
    }
}

impl ReviewSettings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(&content)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Replace values the session cannot work with by their defaults.
    pub fn sanitize(&mut self) {
        if self.schema_version == 0 {
            tracing::warn!("schema_version 0 is reserved; using {}", default_schema_version());
            self.schema_version = default_schema_version();
        }
        if !self.stroke_width.is_finite() || self.stroke_width <= 0.0 {
            self.stroke_width = default_stroke_width();
        }
        if self.quick_colors.is_empty() {
            self.quick_colors = default_quick_colors();
        }
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = default_poll_interval_ms();
        }
        if !self.skip_seconds.is_finite() || self.skip_seconds <= 0.0 {
            self.skip_seconds = default_skip_seconds();
        }
    }

    /// Install the global logger as configured here.
    pub fn init_logging(&self) {
        crate::logging::init(self.debug_logging, self.log_file.as_ref().map(PathBuf::from));
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.stroke_width,
            color: self.stroke_color,
        }
    }

    pub fn overlay_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_hide_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE);
        let loaded = ReviewSettings::load(&path.to_string_lossy()).expect("load");
        assert_eq!(loaded, ReviewSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r##"{"schema_version": 4, "stroke_color": "#22C55E"}"##)
            .expect("write");

        let loaded = ReviewSettings::load(&path.to_string_lossy()).expect("load");
        assert_eq!(loaded.schema_version, 4);
        assert_eq!(loaded.stroke_color, DrawColor::GREEN);
        assert_eq!(loaded.overlay_hide_ms, 3000);
        assert_eq!(loaded.poll_interval_ms, 500);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE).to_string_lossy().to_string();
        let mut settings = ReviewSettings::default();
        settings.stroke_width = 6.5;
        settings.skip_seconds = 5.0;
        settings.save(&path).expect("save");

        assert_eq!(ReviewSettings::load(&path).expect("load"), settings);
    }

    #[test]
    fn sanitize_repairs_unusable_values() {
        let mut settings = ReviewSettings {
            schema_version: 0,
            stroke_width: -1.0,
            quick_colors: Vec::new(),
            poll_interval_ms: 0,
            skip_seconds: f64::NAN,
            ..ReviewSettings::default()
        };
        settings.sanitize();
        assert_eq!(settings, ReviewSettings::default());
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{").expect("write");
        assert!(ReviewSettings::load(&path.to_string_lossy()).is_err());
    }
}
