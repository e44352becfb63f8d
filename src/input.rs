//! Parsing fetched series out of input documents.
//!
//! Two shapes are accepted: a JSON array of series objects, and an encoded
//! protobuf `MultiFetchResponse`.
//!
//! ```json
//! [{"name": "a.b", "start": 0, "step": 10, "values": [1.0, null, 3.0],
//!   "consolidationFunc": "sum", "tags": {"dc": "ams"}}]
//! ```

use std::collections::BTreeMap;

use carbonfmt_types::MultiFetchResponse;
use prost::Message;
use serde::Deserialize;

use crate::error::InputError;
use crate::series::MetricData;

/// One series in a JSON input document. `null` values are missing samples.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInput {
    pub name: String,
    pub start: i64,
    pub step: i64,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
    #[serde(default)]
    pub consolidation_func: Option<String>,
    #[serde(default)]
    pub path_expression: Option<String>,
    #[serde(default)]
    pub x_files_factor: f32,
    /// Extra tags, merged over the ones extracted from the name.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl From<SeriesInput> for MetricData {
    fn from(input: SeriesInput) -> Self {
        let values: Vec<f64> = input
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();

        let mut builder = MetricData::builder(input.name)
            .values(values)
            .step(input.step)
            .start(input.start)
            .x_files_factor(input.x_files_factor);
        if let Some(func) = input.consolidation_func {
            builder = builder.consolidation_func(func);
        }
        if let Some(expr) = input.path_expression {
            builder = builder.path_expression(expr);
        }
        for (key, value) in input.tags {
            builder = builder.tag(key, value);
        }
        builder.build()
    }
}

/// Parse a JSON array of series.
pub fn parse_json_series(bytes: &[u8]) -> Result<Vec<MetricData>, InputError> {
    let inputs: Vec<SeriesInput> = serde_json::from_slice(bytes)?;
    Ok(inputs.into_iter().map(MetricData::from).collect())
}

/// Decode a protobuf `MultiFetchResponse` into series.
pub fn parse_protobuf_series(bytes: &[u8]) -> Result<Vec<MetricData>, InputError> {
    let response = MultiFetchResponse::decode(bytes)?;
    Ok(response
        .metrics
        .into_iter()
        .map(MetricData::from_fetch_response)
        .collect())
}
