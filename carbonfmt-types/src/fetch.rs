//! Fetch response records.

/// One series as returned by a storage backend.
///
/// Field numbers follow the carbonapi v3 schema so buffers stay compatible
/// with existing producers and consumers.
#[derive(Clone, PartialEq, prost::Message)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct FetchResponse {
    /// Series name, also used as the display target.
    #[prost(string, tag = "1")]
    pub name: String,

    /// The query expression that matched this series.
    #[prost(string, tag = "2")]
    pub path_expression: String,

    /// Name of the function used to consolidate points.
    #[prost(string, tag = "3")]
    pub consolidation_func: String,

    /// First timestamp, seconds since epoch.
    #[prost(int64, tag = "4")]
    pub start_time: i64,

    /// End timestamp (exclusive), seconds since epoch.
    #[prost(int64, tag = "5")]
    pub stop_time: i64,

    /// Seconds between samples.
    #[prost(int64, tag = "6")]
    pub step_time: i64,

    /// Ratio of known values required for a consolidated point.
    #[prost(float, tag = "7")]
    pub x_files_factor: f32,

    #[prost(bool, tag = "8")]
    pub high_precision_timestamps: bool,

    /// Samples; NaN marks a missing value.
    #[prost(double, repeated, tag = "9")]
    pub values: Vec<f64>,

    /// Functions the backend already applied to the series.
    #[prost(string, repeated, tag = "10")]
    pub applied_functions: Vec<String>,

    #[prost(int64, tag = "11")]
    pub request_start_time: i64,

    #[prost(int64, tag = "12")]
    pub request_stop_time: i64,
}

impl FetchResponse {
    /// Number of samples in the record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the record carries no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A batch of fetch responses, the top-level message of a render reply.
#[derive(Clone, PartialEq, prost::Message)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiFetchResponse {
    #[prost(message, repeated, tag = "1")]
    pub metrics: Vec<FetchResponse>,
}

impl MultiFetchResponse {
    /// Number of series in the batch.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
