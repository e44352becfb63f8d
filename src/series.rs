//! The series entity and its consolidation cache.
//!
//! A [`MetricData`] owns its raw samples and a lazily computed reduced view.
//! The reduced view depends on two pieces of state: the grouping factor
//! (`values_per_point`) and the reducer bound to the series. Changing either
//! clears the cache, so a cached view always matches the current settings.

use std::collections::BTreeMap;

use carbonfmt_types::FetchResponse;
use tracing::{debug, trace};

use crate::consolidation::{AggregateFn, BuiltinConsolidations, ConsolidationLookup};
use crate::error::ConsolidationError;
use crate::tags::extract_tags;

/// Resolution state of the reducer bound to a series.
///
/// A failed lookup is remembered: the name is not looked up again and every
/// later attempt to consolidate reports the same error.
#[derive(Debug, Clone, Default)]
pub enum AggregateFunction {
    /// Not looked up yet.
    #[default]
    Unresolved,
    /// Bound to a reducer.
    Resolved(AggregateFn),
    /// The lookup failed for this consolidation function name.
    Unknown(String),
}

impl AggregateFunction {
    /// The bound reducer, if resolution succeeded.
    pub fn resolved(&self) -> Option<AggregateFn> {
        match self {
            AggregateFunction::Resolved(f) => Some(*f),
            _ => None,
        }
    }
}

/// One named, evenly spaced time series.
#[derive(Debug, Clone)]
pub struct MetricData {
    /// Series name, also the display target.
    pub name: String,
    pub path_expression: String,
    /// Consolidation function name, resolved case-insensitively.
    pub consolidation_func: String,
    /// First timestamp, seconds since epoch.
    pub start_time: i64,
    /// End timestamp (exclusive), seconds since epoch.
    pub stop_time: i64,
    /// Seconds between raw samples.
    pub step: i64,
    pub x_files_factor: f32,
    pub high_precision_timestamps: bool,
    pub applied_functions: Vec<String>,
    pub request_start_time: i64,
    pub request_stop_time: i64,
    /// Tags, iterated in key order.
    pub tags: BTreeMap<String, String>,

    values: Vec<f64>,
    values_per_point: usize,
    aggregated_values: Option<Vec<f64>>,
    aggregate_function: AggregateFunction,
}

impl MetricData {
    /// Create a series, deriving its stop time and tags.
    ///
    /// No consolidation function is set; downsampling such a series reports
    /// an unknown function until one is named or bound.
    ///
    /// # Example
    ///
    /// ```rust
    /// use carbonfmt::MetricData;
    ///
    /// let series = MetricData::new("servers.web01.cpu;dc=ams", vec![1.0, 2.0, 3.0], 60, 1_700_000_000);
    /// assert_eq!(series.stop_time, 1_700_000_180);
    /// assert_eq!(series.tags["dc"], "ams");
    /// ```
    pub fn new(name: impl Into<String>, values: Vec<f64>, step: i64, start: i64) -> Self {
        let name = name.into();
        let tags = extract_tags(&name);
        Self::with_tags(name, values, step, start, tags)
    }

    /// Create a series with a pre-built tag map.
    pub fn with_tags(
        name: impl Into<String>,
        values: Vec<f64>,
        step: i64,
        start: i64,
        tags: BTreeMap<String, String>,
    ) -> Self {
        let stop = start + values.len() as i64 * step;
        Self {
            name: name.into(),
            path_expression: String::new(),
            consolidation_func: String::new(),
            start_time: start,
            stop_time: stop,
            step,
            x_files_factor: 0.0,
            high_precision_timestamps: false,
            applied_functions: Vec::new(),
            request_start_time: 0,
            request_stop_time: 0,
            tags,
            values,
            values_per_point: 0,
            aggregated_values: None,
            aggregate_function: AggregateFunction::Unresolved,
        }
    }

    /// Create a builder for a series.
    pub fn builder(name: impl Into<String>) -> MetricDataBuilder {
        MetricDataBuilder::new(name)
    }

    /// Create a series from a stored wire record.
    ///
    /// Every field is taken verbatim; tags are extracted from the name.
    pub fn from_fetch_response(record: FetchResponse) -> Self {
        let tags = extract_tags(&record.name);
        Self {
            tags,
            values: record.values,
            values_per_point: 0,
            aggregated_values: None,
            aggregate_function: AggregateFunction::Unresolved,
            name: record.name,
            path_expression: record.path_expression,
            consolidation_func: record.consolidation_func,
            start_time: record.start_time,
            stop_time: record.stop_time,
            step: record.step_time,
            x_files_factor: record.x_files_factor,
            high_precision_timestamps: record.high_precision_timestamps,
            applied_functions: record.applied_functions,
            request_start_time: record.request_start_time,
            request_stop_time: record.request_stop_time,
        }
    }

    /// Build the wire record for this series from its raw data.
    pub fn to_fetch_response(&self) -> FetchResponse {
        FetchResponse {
            name: self.name.clone(),
            path_expression: self.path_expression.clone(),
            consolidation_func: self.consolidation_func.clone(),
            start_time: self.start_time,
            stop_time: self.stop_time,
            step_time: self.step,
            x_files_factor: self.x_files_factor,
            high_precision_timestamps: self.high_precision_timestamps,
            values: self.values.clone(),
            applied_functions: self.applied_functions.clone(),
            request_start_time: self.request_start_time,
            request_stop_time: self.request_stop_time,
        }
    }

    /// Raw samples as fetched.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of raw samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Timestamp of the raw sample at `index`.
    pub fn timestamp(&self, index: usize) -> i64 {
        self.start_time + index as i64 * self.step
    }

    /// Current grouping factor. `0` and `1` both mean no consolidation.
    pub fn values_per_point(&self) -> usize {
        self.values_per_point
    }

    /// Set the grouping factor and drop the cached reduced view.
    pub fn set_values_per_point(&mut self, values_per_point: usize) {
        self.values_per_point = values_per_point;
        self.aggregated_values = None;
    }

    /// Resolution state of the bound reducer.
    pub fn aggregate_function(&self) -> &AggregateFunction {
        &self.aggregate_function
    }

    /// Bind a reducer directly, bypassing name lookup.
    pub fn set_aggregate_function(&mut self, f: AggregateFn) {
        self.aggregate_function = AggregateFunction::Resolved(f);
        self.aggregated_values = None;
    }

    /// Seconds between points of the reduced view.
    pub fn aggregated_time_step(&self) -> i64 {
        if self.values_per_point <= 1 {
            self.step
        } else {
            self.step * self.values_per_point as i64
        }
    }

    /// Timestamp of the reduced point at `index`.
    pub fn aggregated_timestamp(&self, index: usize) -> i64 {
        self.start_time + index as i64 * self.aggregated_time_step()
    }

    /// The reduced view, computed with the builtin consolidation functions.
    pub fn aggregated_values(&mut self) -> Result<&[f64], ConsolidationError> {
        self.aggregated_values_with(&BuiltinConsolidations)
    }

    /// The reduced view, resolving the reducer through `lookup` if needed.
    ///
    /// The view is cached until the grouping factor or the reducer changes.
    pub fn aggregated_values_with<L>(&mut self, lookup: &L) -> Result<&[f64], ConsolidationError>
    where
        L: ConsolidationLookup + ?Sized,
    {
        let values = match self.aggregated_values.take() {
            Some(cached) => cached,
            None => self.compute_aggregated(lookup)?,
        };
        Ok(self.aggregated_values.insert(values).as_slice())
    }

    /// Fill the cache without borrowing the result.
    pub fn aggregate_values<L>(&mut self, lookup: &L) -> Result<(), ConsolidationError>
    where
        L: ConsolidationLookup + ?Sized,
    {
        self.aggregated_values_with(lookup).map(|_| ())
    }

    /// The reduced view if it has already been computed.
    pub fn cached_aggregated_values(&self) -> Option<&[f64]> {
        self.aggregated_values.as_deref()
    }

    fn compute_aggregated<L>(&mut self, lookup: &L) -> Result<Vec<f64>, ConsolidationError>
    where
        L: ConsolidationLookup + ?Sized,
    {
        if self.values_per_point <= 1 {
            return Ok(self.values.clone());
        }

        let reduce = self.resolve_aggregate_function(lookup)?;
        trace!(
            series = %self.name,
            values_per_point = self.values_per_point,
            "consolidating series"
        );
        Ok(self.values.chunks(self.values_per_point).map(reduce).collect())
    }

    /// Resolve the reducer once, remembering failures.
    fn resolve_aggregate_function<L>(&mut self, lookup: &L) -> Result<AggregateFn, ConsolidationError>
    where
        L: ConsolidationLookup + ?Sized,
    {
        match &self.aggregate_function {
            AggregateFunction::Resolved(f) => return Ok(*f),
            AggregateFunction::Unknown(name) => {
                return Err(ConsolidationError::UnknownFunction {
                    series: self.name.clone(),
                    name: name.clone(),
                })
            }
            AggregateFunction::Unresolved => {}
        }

        match lookup.lookup(&self.consolidation_func.to_lowercase()) {
            Some(f) => {
                self.aggregate_function = AggregateFunction::Resolved(f);
                Ok(f)
            }
            None => {
                debug!(
                    series = %self.name,
                    consolidation_func = %self.consolidation_func,
                    "no consolidation function with this name"
                );
                self.aggregate_function =
                    AggregateFunction::Unknown(self.consolidation_func.clone());
                Err(ConsolidationError::UnknownFunction {
                    series: self.name.clone(),
                    name: self.consolidation_func.clone(),
                })
            }
        }
    }
}

impl From<FetchResponse> for MetricData {
    fn from(record: FetchResponse) -> Self {
        Self::from_fetch_response(record)
    }
}

/// Builder for `MetricData`.
#[derive(Debug)]
pub struct MetricDataBuilder {
    name: String,
    values: Vec<f64>,
    step: i64,
    start: i64,
    consolidation_func: Option<String>,
    path_expression: Option<String>,
    x_files_factor: f32,
    tags: BTreeMap<String, String>,
}

impl MetricDataBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            step: 1,
            start: 0,
            consolidation_func: None,
            path_expression: None,
            x_files_factor: 0.0,
            tags: BTreeMap::new(),
        }
    }

    /// Set the raw samples.
    pub fn values(mut self, values: impl Into<Vec<f64>>) -> Self {
        self.values = values.into();
        self
    }

    /// Set the step in seconds.
    pub fn step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    /// Set the start timestamp.
    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    /// Set the consolidation function name.
    pub fn consolidation_func(mut self, name: impl Into<String>) -> Self {
        self.consolidation_func = Some(name.into());
        self
    }

    /// Set the path expression.
    pub fn path_expression(mut self, expr: impl Into<String>) -> Self {
        self.path_expression = Some(expr.into());
        self
    }

    /// Set the x-files factor.
    pub fn x_files_factor(mut self, xff: f32) -> Self {
        self.x_files_factor = xff;
        self
    }

    /// Add a tag on top of the ones extracted from the name.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Build the series.
    pub fn build(self) -> MetricData {
        let mut tags = extract_tags(&self.name);
        tags.extend(self.tags);

        let mut series = MetricData::with_tags(self.name, self.values, self.step, self.start, tags);
        if let Some(func) = self.consolidation_func {
            series.consolidation_func = func;
        }
        if let Some(expr) = self.path_expression {
            series.path_expression = expr;
        }
        series.x_files_factor = self.x_files_factor;
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn series(values: Vec<f64>) -> MetricData {
        MetricData::builder("metric")
            .values(values)
            .step(10)
            .consolidation_func("sum")
            .build()
    }

    #[test]
    fn new_derives_stop_time_and_tags() {
        let s = MetricData::new("a.b;env=prod", vec![1.0, 2.0], 60, 1000);
        assert_eq!(s.start_time, 1000);
        assert_eq!(s.stop_time, 1120);
        assert_eq!(s.step, 60);
        assert_eq!(s.tags["name"], "a.b");
        assert_eq!(s.tags["env"], "prod");
        assert!(s.consolidation_func.is_empty());
        assert_eq!(s.values_per_point(), 0);
        assert!(s.cached_aggregated_values().is_none());
    }

    #[test]
    fn empty_series_has_equal_bounds() {
        let s = MetricData::new("empty", vec![], 60, 1000);
        assert!(s.is_empty());
        assert_eq!(s.stop_time, s.start_time);
    }

    #[test]
    fn identity_consolidation_copies_values() {
        for vpp in [0, 1] {
            let mut s = series(vec![1.0, f64::NAN, 3.0]);
            s.set_values_per_point(vpp);
            let agg = s.aggregated_values().unwrap().to_vec();
            assert_eq!(agg.len(), 3);
            assert_eq!(agg[0], 1.0);
            assert!(agg[1].is_nan());
            assert_eq!(agg[2], 3.0);
            assert_eq!(s.aggregated_time_step(), 10);
        }
    }

    #[test]
    fn identity_consolidation_ignores_unknown_function() {
        let mut s = MetricData::builder("m")
            .values(vec![1.0, 2.0])
            .consolidation_func("bogus")
            .build();
        assert_eq!(s.aggregated_values().unwrap(), &[1.0, 2.0]);
        assert!(matches!(s.aggregate_function(), AggregateFunction::Unresolved));
    }

    #[test]
    fn groups_from_the_front_with_short_tail() {
        let mut s = series(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        s.set_values_per_point(3);
        assert_eq!(s.aggregated_values().unwrap(), &[6.0, 15.0, 7.0]);
        assert_eq!(s.aggregated_time_step(), 30);
    }

    #[test]
    fn exact_multiple_has_no_short_group() {
        let mut s = series(vec![1.0, 2.0, 3.0, 4.0]);
        s.set_values_per_point(2);
        assert_eq!(s.aggregated_values().unwrap(), &[3.0, 7.0]);
    }

    #[test]
    fn factor_larger_than_series_gives_one_point() {
        let mut s = series(vec![1.0, 2.0]);
        s.set_values_per_point(10);
        assert_eq!(s.aggregated_values().unwrap(), &[3.0]);
    }

    #[test]
    fn empty_series_consolidates_to_nothing() {
        let mut s = series(vec![]);
        s.set_values_per_point(4);
        assert!(s.aggregated_values().unwrap().is_empty());
    }

    #[test]
    fn function_name_is_case_insensitive() {
        let mut s = MetricData::builder("m")
            .values(vec![1.0, 5.0])
            .consolidation_func("MAX")
            .build();
        s.set_values_per_point(2);
        assert_eq!(s.aggregated_values().unwrap(), &[5.0]);
        assert!(s.aggregate_function().resolved().is_some());
    }

    #[test]
    fn cache_is_reused_until_factor_changes() {
        thread_local!(static CALLS: Cell<usize> = const { Cell::new(0) });
        fn counting_sum(v: &[f64]) -> f64 {
            CALLS.with(|c| c.set(c.get() + 1));
            v.iter().sum()
        }

        let mut s = series(vec![1.0, 2.0, 3.0, 4.0]);
        s.set_aggregate_function(counting_sum);
        s.set_values_per_point(2);

        assert_eq!(s.aggregated_values().unwrap(), &[3.0, 7.0]);
        assert_eq!(CALLS.with(Cell::get), 2);
        assert_eq!(s.aggregated_values().unwrap(), &[3.0, 7.0]);
        assert_eq!(CALLS.with(Cell::get), 2);

        s.set_values_per_point(4);
        assert!(s.cached_aggregated_values().is_none());
        assert_eq!(s.aggregated_values().unwrap(), &[10.0]);
        assert_eq!(CALLS.with(Cell::get), 3);
    }

    #[test]
    fn unknown_function_is_reported_and_remembered() {
        let mut s = MetricData::builder("servers.db")
            .values(vec![1.0, 2.0, 3.0])
            .consolidation_func("Nope")
            .build();
        s.set_values_per_point(2);

        let err = s.aggregated_values().unwrap_err();
        assert_eq!(
            err,
            ConsolidationError::UnknownFunction {
                series: "servers.db".to_string(),
                name: "Nope".to_string(),
            }
        );
        assert_eq!(err.series(), "servers.db");
        assert!(matches!(s.aggregate_function(), AggregateFunction::Unknown(n) if n == "Nope"));
        assert!(s.cached_aggregated_values().is_none());

        // the failed lookup is not retried, even with a lookup that knows the name
        let permissive = |_: &str| -> Option<AggregateFn> { Some(crate::consolidation::sum) };
        assert!(s.aggregated_values_with(&permissive).is_err());

        // binding a reducer explicitly recovers
        s.set_aggregate_function(crate::consolidation::sum);
        assert_eq!(s.aggregated_values().unwrap(), &[3.0, 3.0]);
    }

    #[test]
    fn new_series_without_function_cannot_be_downsampled() {
        let mut s = MetricData::new("a", vec![1.0, 2.0], 10, 0);
        s.set_values_per_point(2);
        assert_eq!(
            s.aggregated_values().unwrap_err(),
            ConsolidationError::UnknownFunction {
                series: "a".to_string(),
                name: String::new(),
            }
        );
        assert!(matches!(s.aggregate_function(), AggregateFunction::Unknown(n) if n.is_empty()));
    }

    #[test]
    fn custom_lookup_is_used_once() {
        let mut s = MetricData::builder("m")
            .values(vec![2.0, 4.0])
            .consolidation_func("Product")
            .build();
        s.set_values_per_point(2);
        let lookup = |name: &str| -> Option<AggregateFn> {
            (name == "product").then_some(crate::consolidation::multiply as AggregateFn)
        };
        assert_eq!(s.aggregated_values_with(&lookup).unwrap(), &[8.0]);

        // already resolved, the builtin table is never consulted
        s.set_values_per_point(1);
        s.set_values_per_point(2);
        assert_eq!(s.aggregated_values().unwrap(), &[8.0]);
    }

    #[test]
    fn aggregated_timestamps_follow_the_reduced_step() {
        let mut s = MetricData::new("m", vec![0.0; 10], 15, 600);
        assert_eq!(s.aggregated_timestamp(3), 645);
        s.set_values_per_point(4);
        for i in 0..3 {
            assert_eq!(s.aggregated_timestamp(i), 600 + i as i64 * 60);
        }
    }

    #[test]
    fn fetch_response_roundtrip_is_lossless() {
        let record = FetchResponse {
            name: "a.b;dc=ams".to_string(),
            path_expression: "a.*".to_string(),
            consolidation_func: "max".to_string(),
            start_time: 100,
            stop_time: 130,
            step_time: 10,
            x_files_factor: 0.25,
            high_precision_timestamps: true,
            values: vec![1.0, 2.0, 3.0],
            applied_functions: vec!["alias".to_string()],
            request_start_time: 90,
            request_stop_time: 140,
        };
        let s = MetricData::from(record.clone());
        assert_eq!(s.tags["dc"], "ams");
        assert_eq!(s.step, 10);
        assert_eq!(s.to_fetch_response(), record);
    }

    #[test]
    fn builder_merges_explicit_tags() {
        let s = MetricData::builder("cpu;host=a")
            .values(vec![1.0])
            .step(60)
            .start(120)
            .path_expression("cpu")
            .x_files_factor(0.5)
            .tag("team", "infra")
            .build();
        assert_eq!(s.stop_time, 180);
        assert_eq!(s.path_expression, "cpu");
        assert_eq!(s.x_files_factor, 0.5);
        assert_eq!(s.tags["host"], "a");
        assert_eq!(s.tags["team"], "infra");
        assert_eq!(s.tags["name"], "cpu");
    }

    #[test]
    fn metric_data_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MetricData>();
    }
}
