//! Comma separated values, one line per raw sample.
//!
//! ```text
//! "servers.web01.cpu",2023-11-14 22:13:20,1.5
//! "servers.web01.cpu",2023-11-14 22:14:20,
//! ```
//!
//! Missing values leave the last field empty.

use std::fmt::Display;

use chrono::TimeZone;

use super::push_float;
use crate::series::MetricData;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Encode the raw samples of every series, formatting timestamps in `tz`.
pub fn marshal_csv<Tz>(results: &[MetricData], tz: &Tz) -> Vec<u8>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();

    for r in results {
        let name = quote(&r.name);
        for (i, v) in r.values().iter().enumerate() {
            out.push_str(&name);
            out.push(',');
            if let Some(time) = tz.timestamp_opt(r.timestamp(i), 0).earliest() {
                out.push_str(&time.format(TIMESTAMP_FORMAT).to_string());
            }
            out.push(',');
            if !v.is_nan() {
                push_float(&mut out, *v);
            }
            out.push('\n');
        }
    }

    out.into_bytes()
}

/// Double-quote a field, doubling any embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
