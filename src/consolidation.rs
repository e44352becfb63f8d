//! Reduction functions used to consolidate groups of samples.
//!
//! Every reducer receives one non-empty group of consecutive raw values and
//! returns a single value. NaN inputs mean "no data" and are skipped; a group
//! without any real value reduces to NaN. `avg_zero` is the exception and
//! counts missing values as zero.

use std::collections::HashMap;

/// A reducer over one group of samples.
pub type AggregateFn = fn(&[f64]) -> f64;

/// Resolves a lower-cased consolidation function name to a reducer.
pub trait ConsolidationLookup {
    /// Look up a reducer by name. `None` means the name is unknown.
    fn lookup(&self, name: &str) -> Option<AggregateFn>;
}

/// The standard graphite consolidation functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConsolidations;

impl ConsolidationLookup for BuiltinConsolidations {
    fn lookup(&self, name: &str) -> Option<AggregateFn> {
        let f: AggregateFn = match name {
            "average" | "avg" => average,
            "avg_zero" => average_zero,
            "median" => median,
            "sum" | "total" => sum,
            "max" | "maximum" => max,
            "min" | "minimum" => min,
            "first" => first,
            "last" | "current" => last,
            "count" => count,
            "diff" => diff,
            "multiply" => multiply,
            "range" | "rangeof" => range,
            "stddev" => stddev,
            _ => return None,
        };
        Some(f)
    }
}

impl ConsolidationLookup for HashMap<String, AggregateFn> {
    fn lookup(&self, name: &str) -> Option<AggregateFn> {
        self.get(name).copied()
    }
}

impl<F> ConsolidationLookup for F
where
    F: Fn(&str) -> Option<AggregateFn>,
{
    fn lookup(&self, name: &str) -> Option<AggregateFn> {
        self(name)
    }
}

fn known(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.iter().copied().filter(|v| !v.is_nan())
}

/// Arithmetic mean of the known values.
pub fn average(values: &[f64]) -> f64 {
    let (total, n) = known(values).fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        total / n as f64
    }
}

/// Mean over the whole group with missing values counted as zero.
pub fn average_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let total: f64 = known(values).sum();
    total / values.len() as f64
}

/// Median of the known values, interpolating between the middle pair.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = known(values).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Sum of the known values.
pub fn sum(values: &[f64]) -> f64 {
    known(values).reduce(|a, b| a + b).unwrap_or(f64::NAN)
}

pub fn max(values: &[f64]) -> f64 {
    known(values).reduce(f64::max).unwrap_or(f64::NAN)
}

pub fn min(values: &[f64]) -> f64 {
    known(values).reduce(f64::min).unwrap_or(f64::NAN)
}

/// First known value in the group.
pub fn first(values: &[f64]) -> f64 {
    known(values).next().unwrap_or(f64::NAN)
}

/// Last known value in the group.
pub fn last(values: &[f64]) -> f64 {
    values
        .iter()
        .rev()
        .copied()
        .find(|v| !v.is_nan())
        .unwrap_or(f64::NAN)
}

/// Number of known values.
pub fn count(values: &[f64]) -> f64 {
    match known(values).count() {
        0 => f64::NAN,
        n => n as f64,
    }
}

/// First known value minus every following known value.
pub fn diff(values: &[f64]) -> f64 {
    known(values).reduce(|a, b| a - b).unwrap_or(f64::NAN)
}

/// Product of the known values.
pub fn multiply(values: &[f64]) -> f64 {
    known(values).reduce(|a, b| a * b).unwrap_or(f64::NAN)
}

/// Spread between the largest and smallest known value.
pub fn range(values: &[f64]) -> f64 {
    max(values) - min(values)
}

/// Population standard deviation of the known values.
pub fn stddev(values: &[f64]) -> f64 {
    let mean = average(values);
    if mean.is_nan() {
        return f64::NAN;
    }
    let (squares, n) = known(values).fold((0.0, 0usize), |(s, n), v| {
        let d = v - mean;
        (s + d * d, n + 1)
    });
    (squares / n as f64).sqrt()
}
