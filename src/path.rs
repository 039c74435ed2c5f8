//! Dotted key-path access into nested JSON objects.
//!
//! `get_by_path(&v, "units.bitcoin")` walks `v["units"]["bitcoin"]`.
//! Lookups never fail on a missing segment; writes create the
//! intermediate objects they need.

use crate::types::Record;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by path writes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("empty key path")]
    Empty,

    #[error("segment '{segment}' of '{path}' is not an object")]
    NotAnObject { path: String, segment: String },
}

/// Look up the value at `path` inside `root`.
///
/// An empty path returns `root` itself.
pub fn get_by_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    match root {
        Value::Object(map) => get_in_record(map, path),
        _ => None,
    }
}

/// Look up the value at `path` inside a record.
pub fn get_in_record<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Assign `value` at `path` inside `root`, creating intermediate objects.
pub fn set_by_path(root: &mut Value, path: &str, value: Value) -> Result<(), PathError> {
    if root.is_null() {
        *root = Value::Object(Record::new());
    }
    match root {
        Value::Object(map) => set_in_record(map, path, value),
        _ => Err(PathError::NotAnObject {
            path: path.to_string(),
            segment: String::new(),
        }),
    }
}

/// Assign `value` at `path` inside a record, creating intermediate objects.
///
/// Missing or null intermediates are replaced by empty objects; any other
/// non-object intermediate is an error and leaves the record untouched
/// from that segment on.
pub fn set_in_record(record: &mut Record, path: &str, value: Value) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }

    let (parents, last) = match path.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, path),
    };

    let mut current = record;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Record::new()));
            if entry.is_null() {
                *entry = Value::Object(Record::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => {
                    return Err(PathError::NotAnObject {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    })
                }
            };
        }
    }

    current.insert(last.to_string(), value);
    Ok(())
}
