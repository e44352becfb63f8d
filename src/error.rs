//! Error types for consolidation and encoding.

use thiserror::Error;

/// A series could not be consolidated.
///
/// This is a per-series configuration problem: callers report it and keep
/// encoding the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidationError {
    /// The series names a consolidation function with no implementation.
    #[error("unknown consolidation function {name:?} for series {series:?}")]
    UnknownFunction {
        /// Name of the series that failed.
        series: String,
        /// The consolidation function name as it appears on the series.
        name: String,
    },
}

impl ConsolidationError {
    /// Name of the series this error belongs to.
    pub fn series(&self) -> &str {
        match self {
            ConsolidationError::UnknownFunction { series, .. } => series,
        }
    }
}

/// The underlying serializer rejected a batch.
///
/// The encode call is aborted; no partial buffer is returned.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// JSON serialization failed.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Pickle serialization failed.
    #[error("pickle encoding failed: {0}")]
    Pickle(#[from] serde_pickle::Error),

    /// Protocol buffer serialization failed.
    #[error("protobuf encoding failed: {0}")]
    Protobuf(#[from] prost::EncodeError),
}

/// Input bytes could not be turned into series.
#[derive(Debug, Error)]
pub enum InputError {
    /// The JSON document is malformed or has the wrong shape.
    #[error("failed to parse JSON series: {0}")]
    Json(#[from] serde_json::Error),

    /// The protocol buffer message is malformed.
    #[error("failed to decode protobuf series: {0}")]
    Protobuf(#[from] prost::DecodeError),
}
