//! Graphite's internal "raw" text format, one line per series:
//!
//! ```text
//! name,start,stop,step|v1,v2,...
//! ```
//!
//! Missing values are written as `None`. Readers split the header from the
//! right, so commas in the name (`sumSeries(a.b,c.d)`) are written as is.
//! Only `|`, newlines and backslashes are backslash-escaped.

use super::push_float;
use crate::series::MetricData;

/// Encode the raw samples of every series.
pub fn marshal_raw(results: &[MetricData]) -> Vec<u8> {
    let mut out = String::new();

    for r in results {
        push_escaped(&mut out, &r.name);
        out.push_str(&format!(",{},{},{}|", r.start_time, r.stop_time, r.step));

        for (i, v) in r.values().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            if v.is_nan() {
                out.push_str("None");
            } else {
                push_float(&mut out, *v);
            }
        }

        out.push('\n');
    }

    out.into_bytes()
}

fn push_escaped(out: &mut String, name: &str) {
    for c in name.chars() {
        match c {
            '\\' | '|' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
}
