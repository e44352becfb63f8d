//! # carbonfmt
//!
//! Consolidation and output encoding for fetched graphite metric series.
//!
//! A batch of [`MetricData`] goes through an optional downsampling pass
//! ([`consolidate`]) and is then handed to exactly one encoder:
//!
//! ```text
//! ┌────────────┐    ┌─────────────┐    ┌───────────────────────────────┐
//! │ MetricData │───▶│ consolidate │───▶│ csv | json | pickle | pb | raw │──▶ bytes
//! │  (series)  │    │  (planner)  │    └───────────────────────────────┘
//! └────────────┘    └─────────────┘
//! ```
//!
//! - **[`series`]**: the series entity, its grouping factor and the cached
//!   consolidated view
//! - **[`consolidation`]**: reducers (`avg`, `sum`, `max`, ...) and the
//!   name lookup seam
//! - **[`planner`]**: picks grouping factors so a batch fits a point budget
//! - **[`encode`]**: the five output formats
//! - **[`tags`]**: default tag extraction from series names
//!
//! The library does no I/O and spawns nothing. Mutation (planning, filling
//! the cache) needs `&mut`; encoders over raw data only borrow.
//!
//! ## Example
//!
//! ```rust
//! use carbonfmt::{consolidate, marshal_json, marshal_raw, MetricData};
//!
//! let mut batch = vec![MetricData::new("a", vec![1.0, f64::NAN, 3.0], 10, 0)];
//!
//! let raw = marshal_raw(&batch);
//! assert_eq!(raw, b"a,0,30,10|1,None,3\n");
//!
//! consolidate(100, &mut batch);
//! let json = marshal_json(&mut batch).unwrap();
//! assert_eq!(
//!     json.body,
//!     br#"[{"target":"a","datapoints":[[1.0,0],[null,10],[3.0,20]],"tags":{"name":"a"}}]"#
//! );
//! ```

pub mod config;
pub mod consolidation;
pub mod encode;
pub mod error;
pub mod input;
pub mod planner;
pub mod series;
pub mod tags;

pub use config::Settings;
pub use consolidation::{AggregateFn, BuiltinConsolidations, ConsolidationLookup};
pub use encode::{
    marshal_csv, marshal_json, marshal_json_with, marshal_pickle, marshal_protobuf, marshal_raw,
    render, CsvZone, Format, RenderOptions, Rendered,
};
pub use error::{ConsolidationError, EncodeError, InputError};
pub use planner::consolidate;
pub use series::{AggregateFunction, MetricData, MetricDataBuilder};
pub use tags::extract_tags;

// Re-export the wire records for convenience
pub use carbonfmt_types::{FetchResponse, MultiFetchResponse};
