//! Default tag extraction from series names.
//!
//! Graphite tagged series are written as `path;key=value;key2=value2`. The
//! path itself is stored under the `name` tag. Names that are still wrapped
//! in function calls (`sumSeries(a.b.c)`) are reduced to their first series
//! argument first.

use std::collections::BTreeMap;

/// Build the tag map for a series name.
pub fn extract_tags(name: &str) -> BTreeMap<String, String> {
    let mut segments = series_argument(name).split(';');
    let path = segments.next().unwrap_or_default();

    let mut tags = BTreeMap::new();
    for segment in segments {
        if let Some((key, value)) = segment.split_once('=') {
            if !key.is_empty() {
                tags.insert(key.to_string(), value.to_string());
            }
        }
    }
    tags.insert("name".to_string(), path.to_string());
    tags
}

/// Strip function calls around a series name, keeping the innermost first argument.
fn series_argument(name: &str) -> &str {
    let inner = match name.rfind('(') {
        Some(open) => &name[open + 1..],
        None => return name,
    };
    let end = inner.find([',', ')']).unwrap_or(inner.len());
    inner[..end].trim().trim_matches(['\'', '"'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_path_gets_name_tag() {
        let tags = extract_tags("servers.web01.cpu");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["name"], "servers.web01.cpu");
    }

    #[test]
    fn tagged_series() {
        let tags = extract_tags("disk.used;rack=a1;datacenter=dc1");
        assert_eq!(tags["name"], "disk.used");
        assert_eq!(tags["rack"], "a1");
        assert_eq!(tags["datacenter"], "dc1");
        let keys: Vec<&str> = tags.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["datacenter", "name", "rack"]);
    }

    #[test]
    fn function_wrapped_name() {
        assert_eq!(extract_tags("sumSeries(a.b.c)")["name"], "a.b.c");
        assert_eq!(extract_tags("scale(a.b.c, 2)")["name"], "a.b.c");
        assert_eq!(extract_tags("alias(sumSeries(a.*),'total')")["name"], "a.*");
    }

    #[test]
    fn malformed_segments_are_ignored() {
        let tags = extract_tags("cpu;novalue;=orphan;ok=1");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["ok"], "1");
    }

    #[test]
    fn path_wins_over_explicit_name_tag() {
        let tags = extract_tags("cpu;name=other");
        assert_eq!(tags["name"], "cpu");
    }

    #[test]
    fn empty_name() {
        let tags = extract_tags("");
        assert_eq!(tags["name"], "");
    }
}
