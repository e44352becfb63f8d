//! Graphite render JSON.
//!
//! ```json
//! [{"target":"a","datapoints":[[1.0,0],[null,10]],"tags":{"name":"a"}}]
//! ```
//!
//! This is the only encoder that reads the consolidated view: datapoints are
//! the aggregated values, stamped from the start time in steps of the
//! aggregated time step. NaN and infinities are written as `null`. Tags come
//! out in key order.
//!
//! Numbers are written in fixed-point notation and strings are escaped to
//! ASCII, so `1e21` renders as `1000000000000000000000.0` and `é` as `\u00e9`.

use std::collections::BTreeMap;
use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use tracing::trace;

use super::{push_float, Rendered};
use crate::consolidation::{BuiltinConsolidations, ConsolidationLookup};
use crate::error::EncodeError;
use crate::series::MetricData;

#[derive(Serialize)]
struct JsonSeries<'a> {
    target: &'a str,
    datapoints: Vec<(Option<f64>, i64)>,
    tags: &'a BTreeMap<String, String>,
}

/// Formatter with graphite's number and string conventions.
struct RenderFormatter;

impl Formatter for RenderFormatter {
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut out = String::new();
        push_float(&mut out, value);
        if !out.contains('.') {
            out.push_str(".0");
        }
        writer.write_all(out.as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        let mut run = 0;
        for (i, c) in fragment.char_indices() {
            if c.is_ascii() {
                continue;
            }
            writer.write_all(fragment[run..i].as_bytes())?;
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            run = i + c.len_utf8();
        }
        writer.write_all(fragment[run..].as_bytes())
    }
}

/// Encode a batch as render JSON using the builtin consolidation functions.
pub fn marshal_json(results: &mut [MetricData]) -> Result<Rendered, EncodeError> {
    marshal_json_with(results, &BuiltinConsolidations)
}

/// Encode a batch as render JSON, resolving consolidation functions through `lookup`.
///
/// A series whose consolidation function cannot be resolved is left out of
/// the body and reported in [`Rendered::errors`]; the rest of the batch is
/// still encoded.
pub fn marshal_json_with<L>(results: &mut [MetricData], lookup: &L) -> Result<Rendered, EncodeError>
where
    L: ConsolidationLookup + ?Sized,
{
    let mut body = vec![b'['];
    let mut errors = Vec::new();
    let mut first = true;

    for r in results.iter_mut() {
        if let Err(e) = r.aggregate_values(lookup) {
            errors.push(e);
            continue;
        }
        let values = r.cached_aggregated_values().unwrap_or_default();

        let series = JsonSeries {
            target: &r.name,
            datapoints: values
                .iter()
                .enumerate()
                .map(|(i, v)| (v.is_finite().then_some(*v), r.aggregated_timestamp(i)))
                .collect(),
            tags: &r.tags,
        };

        if !first {
            body.push(b',');
        }
        first = false;
        let mut ser = serde_json::Serializer::with_formatter(&mut body, RenderFormatter);
        series.serialize(&mut ser)?;
    }

    body.push(b']');
    trace!(bytes = body.len(), skipped = errors.len(), "encoded json");
    Ok(Rendered { body, errors })
}
