//! Runtime settings for the `carbonfmt` binary.
//!
//! Settings come from built-in defaults, then an optional TOML file, then
//! `CARBONFMT_*` environment variables. Command line flags override all of
//! them. Without `utc_offset_secs`, csv timestamps use the host's local zone.
//!
//! ```toml
//! format = "json"
//! max_points = 500
//! utc_offset_secs = 3600
//! log_level = "info"
//! ```

use std::path::Path;

use chrono::FixedOffset;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::encode::{CsvZone, Format, RenderOptions};

/// Settings for rendering a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Output format.
    pub format: Format,
    /// Point budget per series, `0` disables downsampling.
    pub max_points: usize,
    /// Offset from UTC, in seconds, for csv timestamps. Unset means local time.
    pub utc_offset_secs: Option<i32>,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: Format::Json,
            max_points: 0,
            utc_offset_secs: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix("CARBONFMT"))
            .build()?
            .try_deserialize()
    }

    /// The csv time zone, or an error if the configured offset is out of range.
    pub fn csv_zone(&self) -> Result<CsvZone, ConfigError> {
        let Some(secs) = self.utc_offset_secs else {
            return Ok(CsvZone::Local);
        };
        FixedOffset::east_opt(secs)
            .map(CsvZone::Fixed)
            .ok_or_else(|| ConfigError::Message(format!("utc_offset_secs out of range: {secs}")))
    }

    /// Encoder options for these settings.
    pub fn render_options(&self) -> Result<RenderOptions, ConfigError> {
        Ok(RenderOptions {
            max_points: self.max_points,
            csv_zone: self.csv_zone()?,
        })
    }
}
