//! Field-path lookup into record attributes.
//!
//! Paths use the familiar `a.b[0].c` notation; quoted bracket segments
//! (`a["b.c"]`) address keys containing dots. A key that literally equals
//! the whole path wins over the nested interpretation.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Look up `path` in `root`.
///
/// Returns `None` if any segment is missing or the path is malformed.
pub fn lookup<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = root.get(path) {
        return Some(value);
    }

    let segments = parse(path)?;
    let (first, rest) = segments.split_first()?;
    let mut current = match first {
        Segment::Key(key) => root.get(key)?,
        Segment::Index(_) => return None,
    };

    for segment in rest {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
            // Objects keyed by digit strings are addressable with [n]
            (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
            _ => return None,
        };
    }

    Some(current)
}

/// Look up `path` and read it as a number.
///
/// Numeric strings are accepted, as they would be by a loosely typed caller.
pub fn lookup_f64(root: &Map<String, Value>, path: &str) -> Option<f64> {
    match lookup(root, path)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut chars = path.chars().peekable();
    let mut key = String::new();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
            }
            '[' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
                let mut inner = String::new();
                let quote = match chars.peek() {
                    Some(&q) if q == '"' || q == '\'' => {
                        chars.next();
                        Some(q)
                    }
                    _ => None,
                };
                loop {
                    match (chars.next()?, quote) {
                        (q, Some(open)) if q == open => {
                            if chars.next()? != ']' {
                                return None;
                            }
                            break;
                        }
                        (']', None) => break,
                        (other, _) => inner.push(other),
                    }
                }
                match quote {
                    Some(_) => segments.push(Segment::Key(inner)),
                    None => segments.push(Segment::Index(inner.trim().parse().ok()?)),
                }
            }
            other => key.push(other),
        }
    }

    if !key.is_empty() {
        segments.push(Segment::Key(key));
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixtures are objects"),
        }
    }

    #[test]
    fn test_top_level_key() {
        let data = map(json!({ "distance": 42 }));
        assert_eq!(lookup_f64(&data, "distance"), Some(42.0));
    }

    #[test]
    fn test_nested_path() {
        let data = map(json!({ "meta": { "lengths": [10, 20, { "value": 35.5 }] } }));
        assert_eq!(lookup_f64(&data, "meta.lengths[1]"), Some(20.0));
        assert_eq!(lookup_f64(&data, "meta.lengths[2].value"), Some(35.5));
    }

    #[test]
    fn test_quoted_bracket_segment() {
        let data = map(json!({ "meta": { "a.b": 7 } }));
        assert_eq!(lookup_f64(&data, "meta[\"a.b\"]"), Some(7.0));
        assert_eq!(lookup_f64(&data, "meta['a.b']"), Some(7.0));
    }

    #[test]
    fn test_literal_key_wins() {
        let data = map(json!({ "a.b": 1, "a": { "b": 2 } }));
        assert_eq!(lookup_f64(&data, "a.b"), Some(1.0));
    }

    #[test]
    fn test_numeric_string() {
        let data = map(json!({ "distance": " 12.5 " }));
        assert_eq!(lookup_f64(&data, "distance"), Some(12.5));
    }

    #[test]
    fn test_missing_and_malformed() {
        let data = map(json!({ "a": { "b": [1] } }));
        assert_eq!(lookup(&data, "a.c"), None);
        assert_eq!(lookup(&data, "a.b[3]"), None);
        assert_eq!(lookup(&data, "a.b[x]"), None);
        assert_eq!(lookup(&data, "a.b[0"), None);
        assert_eq!(lookup(&data, ""), None);
        assert_eq!(lookup_f64(&data, "a"), None);
    }
}
