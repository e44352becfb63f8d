//! Output encoders for batches of series.
//!
//! Each encoder is a standalone function over a batch. The text encoders
//! (csv, raw) cannot fail. The serializer-backed ones (json, pickle,
//! protobuf) return [`EncodeError`] when the underlying library rejects the
//! batch.
//!
//! Only the JSON encoder reads the consolidated view; the others emit the raw
//! samples as fetched.

pub mod csv;
pub mod json;
pub mod pickle;
pub mod protobuf;
pub mod raw;

use std::fmt;
use std::str::FromStr;

use chrono::{FixedOffset, Local};
use serde::Deserialize;
use thiserror::Error;

use crate::error::{ConsolidationError, EncodeError};
use crate::planner::consolidate;
use crate::series::MetricData;

pub use self::csv::marshal_csv;
pub use self::json::{marshal_json, marshal_json_with};
pub use self::pickle::marshal_pickle;
pub use self::protobuf::marshal_protobuf;
pub use self::raw::marshal_raw;

/// An encoded batch together with the series that could not be consolidated.
#[derive(Debug, Default)]
pub struct Rendered {
    /// The encoded payload.
    pub body: Vec<u8>,
    /// Per-series consolidation failures. Those series are left out of `body`.
    pub errors: Vec<ConsolidationError>,
}

impl Rendered {
    fn complete(body: Vec<u8>) -> Self {
        Self {
            body,
            errors: Vec::new(),
        }
    }
}

/// Output format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Csv,
    #[default]
    Json,
    Pickle,
    Protobuf,
    Raw,
}

impl Format {
    /// MIME type for HTTP responses carrying this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Csv => "text/csv",
            Format::Json => "application/json",
            Format::Pickle => "application/pickle",
            Format::Protobuf => "application/x-protobuf",
            Format::Raw => "text/plain",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Pickle => "pickle",
            Format::Protobuf => "protobuf",
            Format::Raw => "raw",
        };
        f.write_str(name)
    }
}

/// The format name is not one of the supported encoders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown output format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for Format {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "pickle" => Ok(Format::Pickle),
            "protobuf" | "proto" | "carbonapi_v3_pb" => Ok(Format::Protobuf),
            "raw" => Ok(Format::Raw),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// Time zone for csv timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvZone {
    /// The host's local zone, daylight saving included.
    #[default]
    Local,
    /// A fixed offset from UTC.
    Fixed(FixedOffset),
}

/// Options shared by the encoders behind [`render`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Point budget per series, `0` disables downsampling.
    pub max_points: usize,
    /// Zone used for csv timestamps.
    pub csv_zone: CsvZone,
}

/// Downsample a batch if requested and encode it in `format`.
pub fn render(
    format: Format,
    results: &mut [MetricData],
    options: &RenderOptions,
) -> Result<Rendered, EncodeError> {
    consolidate(options.max_points, results);

    let rendered = match format {
        Format::Csv => Rendered::complete(match options.csv_zone {
            CsvZone::Local => marshal_csv(results, &Local),
            CsvZone::Fixed(offset) => marshal_csv(results, &offset),
        }),
        Format::Json => marshal_json(results)?,
        Format::Pickle => Rendered::complete(marshal_pickle(results)?),
        Format::Protobuf => Rendered::complete(marshal_protobuf(results)?),
        Format::Raw => Rendered::complete(marshal_raw(results)),
    };
    tracing::debug!(
        %format,
        series = results.len(),
        bytes = rendered.body.len(),
        errors = rendered.errors.len(),
        "rendered batch"
    );
    Ok(rendered)
}

/// Append a number the way the text formats expect: shortest round-trip
/// decimal without exponent, `+Inf`/`-Inf` for infinities.
pub(crate) fn push_float(out: &mut String, v: f64) {
    if v.is_infinite() {
        out.push_str(if v > 0.0 { "+Inf" } else { "-Inf" });
    } else {
        out.push_str(&v.to_string());
    }
}
