//! Downsample planning for a batch of series rendered together.

use tracing::debug;

use crate::series::MetricData;

/// Pick a grouping factor for every series so none exceeds `max_points`.
///
/// The time range is taken over the whole batch (earliest start to latest
/// stop), not per series, so series rendered together end up at comparable
/// resolution. Series that already fit are left untouched. An empty batch, a
/// non-positive range or a `max_points` of zero is a no-op.
///
/// # Example
///
/// ```rust
/// use carbonfmt::{consolidate, MetricData};
///
/// let mut batch = vec![
///     MetricData::new("short", vec![1.0; 10], 10, 0),
///     MetricData::new("long", vec![1.0; 20], 10, 0),
/// ];
/// consolidate(10, &mut batch);
///
/// assert_eq!(batch[0].values_per_point(), 2);
/// assert_eq!(batch[1].values_per_point(), 2);
/// ```
pub fn consolidate(max_points: usize, results: &mut [MetricData]) {
    if max_points == 0 {
        return;
    }

    let Some(start) = results.iter().map(|r| r.start_time).min() else {
        return;
    };
    let stop = results.iter().map(|r| r.stop_time).max().unwrap_or(start);
    let time_range = stop - start;
    if time_range <= 0 {
        debug!(start, stop, "empty time range, nothing to consolidate");
        return;
    }

    for r in results.iter_mut() {
        if r.step <= 0 {
            continue;
        }
        let points = (time_range / r.step) as usize;
        if points > max_points {
            let values_per_point = points.div_ceil(max_points);
            debug!(
                series = %r.name,
                points,
                max_points,
                values_per_point,
                "consolidating series"
            );
            r.set_values_per_point(values_per_point);
        }
    }
}
