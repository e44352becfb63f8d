//! Python pickle, as consumed by graphite-web.
//!
//! The batch is a list of dicts with the keys `name`, `pathExpression`,
//! `consolidationFunc`, `start`, `end`, `step`, `xFilesFactor` and `values`.
//! Missing samples are encoded as `None`. Raw values are used, never the
//! consolidated view.

use serde::Serialize;
use serde_pickle::SerOptions;

use crate::error::EncodeError;
use crate::series::MetricData;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PickleSeries<'a> {
    name: &'a str,
    path_expression: &'a str,
    consolidation_func: &'a str,
    start: i64,
    end: i64,
    step: i64,
    x_files_factor: f32,
    values: Vec<Option<f64>>,
}

impl<'a> From<&'a MetricData> for PickleSeries<'a> {
    fn from(r: &'a MetricData) -> Self {
        Self {
            name: &r.name,
            path_expression: &r.path_expression,
            consolidation_func: &r.consolidation_func,
            start: r.start_time,
            end: r.stop_time,
            step: r.step,
            x_files_factor: r.x_files_factor,
            values: r
                .values()
                .iter()
                .map(|v| (!v.is_nan()).then_some(*v))
                .collect(),
        }
    }
}

/// Encode a batch as a protocol 2 pickle. An empty batch yields no bytes.
pub fn marshal_pickle(results: &[MetricData]) -> Result<Vec<u8>, EncodeError> {
    if results.is_empty() {
        return Ok(Vec::new());
    }

    let batch: Vec<PickleSeries<'_>> = results.iter().map(PickleSeries::from).collect();
    let bytes = serde_pickle::to_vec(&batch, SerOptions::new().proto_v2())?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_pickle::{DeOptions, HashableValue, Value};
    use std::collections::BTreeMap;

    fn decode(bytes: &[u8]) -> Vec<BTreeMap<HashableValue, Value>> {
        match serde_pickle::value_from_slice(bytes, DeOptions::new()).unwrap() {
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Dict(d) => d,
                    other => panic!("expected dict, got {other:?}"),
                })
                .collect(),
            other => panic!("expected list, got {other:?}"),
        }
    }

    fn key(k: &str) -> HashableValue {
        HashableValue::String(k.to_string())
    }

    #[test]
    fn missing_values_become_none() {
        let batch = vec![MetricData::new("a", vec![1.0, f64::NAN, 3.0], 10, 0)];
        let decoded = decode(&marshal_pickle(&batch).unwrap());

        assert_eq!(
            decoded[0][&key("values")],
            Value::List(vec![Value::F64(1.0), Value::None, Value::F64(3.0)])
        );
    }

    #[test]
    fn carries_series_metadata() {
        let batch = vec![MetricData::builder("servers.web01.cpu")
            .values(vec![2.0])
            .step(60)
            .start(120)
            .path_expression("servers.*.cpu")
            .consolidation_func("max")
            .x_files_factor(0.5)
            .build()];
        let decoded = decode(&marshal_pickle(&batch).unwrap());
        let series = &decoded[0];

        assert_eq!(series.len(), 8);
        assert_eq!(
            series[&key("name")],
            Value::String("servers.web01.cpu".to_string())
        );
        assert_eq!(
            series[&key("pathExpression")],
            Value::String("servers.*.cpu".to_string())
        );
        assert_eq!(
            series[&key("consolidationFunc")],
            Value::String("max".to_string())
        );
        assert_eq!(series[&key("start")], Value::I64(120));
        assert_eq!(series[&key("end")], Value::I64(180));
        assert_eq!(series[&key("step")], Value::I64(60));
        assert_eq!(series[&key("xFilesFactor")], Value::F64(0.5));
    }

    #[test]
    fn uses_raw_values_not_the_consolidated_view() {
        let mut batch = vec![MetricData::builder("a")
            .values(vec![1.0, 2.0, 3.0, 4.0])
            .step(10)
            .consolidation_func("sum")
            .build()];
        batch[0].set_values_per_point(2);
        batch[0].aggregated_values().unwrap();
        let decoded = decode(&marshal_pickle(&batch).unwrap());

        match &decoded[0][&key("values")] {
            Value::List(values) => assert_eq!(values.len(), 4),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn empty_series_has_empty_values() {
        let batch = vec![MetricData::new("a", vec![], 10, 0)];
        let decoded = decode(&marshal_pickle(&batch).unwrap());
        assert_eq!(decoded[0][&key("values")], Value::List(vec![]));
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(marshal_pickle(&[]).unwrap().is_empty());
    }
}
