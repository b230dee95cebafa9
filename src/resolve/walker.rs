//! Deterministic depth-first traversal of JSON values.
//!
//! Objects are visited key by key in insertion order and arrays index by
//! index. The callback sees every non-null scalar together with the name of
//! the nearest enclosing field, so a `processorId` holding an array of IDs
//! reports `processorId` for each element. The immediate parent container
//! is handed over read-only alongside.

use crate::entity::Entity;
use serde_json::Value;
use std::fmt::{self, Write as _};

/// Where a visited scalar sits inside its parent container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position<'a> {
    Key(&'a str),
    Index(usize),
}

/// One step of the path from the root to a visited scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// The container holding a visited scalar, for callbacks that need to look
/// at sibling fields or elements.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'a> {
    Object(&'a Entity),
    Array(&'a [Value]),
}

/// Context handed to the callback for each scalar.
#[derive(Debug)]
pub struct Visit<'a> {
    /// Nearest enclosing object key; `None` only for elements of a root array
    /// or a scalar root.
    pub field: Option<&'a str>,
    /// Position inside the immediate parent; `None` for a scalar root.
    pub position: Option<Position<'a>>,
    /// Immediate parent, read-only; `None` for a scalar root.
    pub parent: Option<Parent<'a>>,
    /// Full path from the root.
    pub path: &'a [PathSegment],
    pub value: &'a Value,
}

impl Visit<'_> {
    /// Path rendered as `steps[0].processorId`.
    #[must_use]
    pub fn path_string(&self) -> String {
        render_path(self.path)
    }
}

/// Renders a path as dotted keys and bracketed indices.
#[must_use]
pub fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(i) => {
                let _ = write!(out, "[{i}]");
            }
        }
    }
    if out.is_empty() {
        out.push('$');
    }
    out
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

const fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

/// Walks `root`, replacing a scalar in place whenever `visit` returns
/// `Some(replacement)`.
///
/// # Errors
///
/// Stops at and returns the first error produced by `visit`.
pub fn walk<E, F>(root: &mut Value, mut visit: F) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<Option<Value>, E>,
{
    let mut path = Vec::new();
    match root {
        Value::Null => Ok(()),
        Value::Object(map) => walk_object(map, &mut path, &mut visit),
        Value::Array(items) => walk_array(items, None, &mut path, &mut visit),
        Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let replacement = visit(&Visit {
                field: None,
                position: None,
                parent: None,
                path: path.as_slice(),
                value: &*root,
            })?;
            if let Some(new_value) = replacement {
                *root = new_value;
            }
            Ok(())
        }
    }
}

/// [`walk`] over the fields of an entity.
///
/// # Errors
///
/// Stops at and returns the first error produced by `visit`.
pub fn walk_entity<E, F>(entity: &mut Entity, mut visit: F) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<Option<Value>, E>,
{
    let mut path = Vec::new();
    walk_object(entity, &mut path, &mut visit)
}

fn walk_object<E, F>(
    map: &mut Entity,
    path: &mut Vec<PathSegment>,
    visit: &mut F,
) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<Option<Value>, E>,
{
    let keys: Vec<String> = map.keys().cloned().collect();
    for key in keys {
        path.push(PathSegment::Key(key.clone()));
        let result = walk_member(map, &key, path, visit);
        path.pop();
        result?;
    }
    Ok(())
}

fn walk_member<E, F>(
    map: &mut Entity,
    key: &str,
    path: &mut Vec<PathSegment>,
    visit: &mut F,
) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<Option<Value>, E>,
{
    let replacement = match map.get(key) {
        Some(child) if is_scalar(child) => visit(&Visit {
            field: Some(key),
            position: Some(Position::Key(key)),
            parent: Some(Parent::Object(map)),
            path: path.as_slice(),
            value: child,
        })?,
        _ => None,
    };
    if let Some(new_value) = replacement {
        map.insert(key.to_string(), new_value);
        return Ok(());
    }
    match map.get_mut(key) {
        Some(Value::Object(child)) => walk_object(child, path, visit),
        Some(Value::Array(items)) => walk_array(items, Some(key), path, visit),
        _ => Ok(()),
    }
}

/// Elements inherit `field` from the array that holds them.
fn walk_array<E, F>(
    items: &mut [Value],
    field: Option<&str>,
    path: &mut Vec<PathSegment>,
    visit: &mut F,
) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<Option<Value>, E>,
{
    for i in 0..items.len() {
        path.push(PathSegment::Index(i));
        let result = walk_element(items, i, field, path, visit);
        path.pop();
        result?;
    }
    Ok(())
}

fn walk_element<E, F>(
    items: &mut [Value],
    i: usize,
    field: Option<&str>,
    path: &mut Vec<PathSegment>,
    visit: &mut F,
) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<Option<Value>, E>,
{
    if is_scalar(&items[i]) {
        let replacement = visit(&Visit {
            field,
            position: Some(Position::Index(i)),
            parent: Some(Parent::Array(items)),
            path: path.as_slice(),
            value: &items[i],
        })?;
        if let Some(new_value) = replacement {
            items[i] = new_value;
        }
        return Ok(());
    }
    match &mut items[i] {
        Value::Object(child) => walk_object(child, path, visit),
        Value::Array(nested) => walk_array(nested, field, path, visit),
        _ => Ok(()),
    }
}

/// Read-only counterpart of [`walk`] over the fields of an entity.
///
/// # Errors
///
/// Stops at and returns the first error produced by `visit`.
pub fn scan_entity<E, F>(entity: &Entity, mut visit: F) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<(), E>,
{
    let mut path = Vec::new();
    scan_object(entity, &mut path, &mut visit)
}

fn scan_object<E, F>(map: &Entity, path: &mut Vec<PathSegment>, visit: &mut F) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<(), E>,
{
    for (key, child) in map {
        path.push(PathSegment::Key(key.clone()));
        let result = scan_value(
            child,
            Some(key.as_str()),
            Some(Position::Key(key)),
            Some(Parent::Object(map)),
            path,
            visit,
        );
        path.pop();
        result?;
    }
    Ok(())
}

fn scan_value<E, F>(
    value: &Value,
    field: Option<&str>,
    position: Option<Position<'_>>,
    parent: Option<Parent<'_>>,
    path: &mut Vec<PathSegment>,
    visit: &mut F,
) -> Result<(), E>
where
    F: FnMut(&Visit<'_>) -> Result<(), E>,
{
    match value {
        Value::Null => Ok(()),
        Value::Object(map) => scan_object(map, path, visit),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                path.push(PathSegment::Index(i));
                let result = scan_value(
                    item,
                    field,
                    Some(Position::Index(i)),
                    Some(Parent::Array(items)),
                    path,
                    visit,
                );
                path.pop();
                result?;
            }
            Ok(())
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) => visit(&Visit {
            field,
            position,
            parent,
            path: path.as_slice(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;

    #[test]
    fn test_visits_scalars_depth_first_in_order() {
        let mut value = json!({
            "name": "Ingest",
            "steps": [{"processorId": "a"}, {"processorId": "b"}],
            "active": true,
            "owner": null
        });
        let mut seen = Vec::new();
        walk(&mut value, |v| {
            seen.push((v.field.map(str::to_string), v.path_string()));
            Ok::<_, Infallible>(None)
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (Some("name".into()), "name".into()),
                (Some("processorId".into()), "steps[0].processorId".into()),
                (Some("processorId".into()), "steps[1].processorId".into()),
                (Some("active".into()), "active".into()),
            ]
        );
    }

    #[test]
    fn test_array_elements_inherit_enclosing_field() {
        let mut value = json!({"processors": ["p1", "p2"]});
        let mut fields = Vec::new();
        walk(&mut value, |v| {
            let index = match v.position {
                Some(Position::Index(i)) => Some(i),
                _ => None,
            };
            fields.push((v.field.unwrap().to_string(), index));
            Ok::<_, Infallible>(None)
        })
        .unwrap();
        assert_eq!(
            fields,
            vec![
                ("processors".to_string(), Some(0)),
                ("processors".to_string(), Some(1)),
            ]
        );
    }

    #[test]
    fn test_replacement_is_written_in_place() {
        let mut value = json!({"seedId": "s-1", "other": "s-1", "list": ["s-1"]});
        walk(&mut value, |v| {
            Ok::<_, Infallible>((v.field == Some("seedId")).then(|| json!("replaced")))
        })
        .unwrap();
        assert_eq!(
            value,
            json!({"seedId": "replaced", "other": "s-1", "list": ["s-1"]})
        );
    }

    #[test]
    fn test_nulls_never_reach_the_callback() {
        let mut value = json!({"a": null, "b": [null, null]});
        let mut calls = 0;
        walk(&mut value, |_| {
            calls += 1;
            Ok::<_, Infallible>(None)
        })
        .unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_callback_error_aborts_traversal() {
        let mut value = json!({"a": "1", "b": "2", "c": "3"});
        let mut visited = Vec::new();
        let result = walk(&mut value, |v| {
            visited.push(v.value.as_str().unwrap().to_string());
            if v.field == Some("b") {
                Err("stop")
            } else {
                Ok(None)
            }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(visited, vec!["1", "2"]);
    }

    #[test]
    fn test_scalar_root_has_no_field_or_position() {
        let mut value = json!("lonely");
        walk(&mut value, |v| {
            assert!(v.field.is_none());
            assert!(v.position.is_none());
            assert_eq!(v.path_string(), "$");
            Ok::<_, Infallible>(Some(json!("changed")))
        })
        .unwrap();
        assert_eq!(value, json!("changed"));
    }

    #[test]
    fn test_parent_exposes_siblings() {
        let mut value = json!({
            "steps": [{"type": "ocr", "processorId": "a"}],
            "tags": ["x", "y"]
        });
        let mut seen = Vec::new();
        walk(&mut value, |v| {
            match (v.field, v.parent) {
                (Some("processorId"), Some(Parent::Object(step))) => {
                    seen.push(step["type"].as_str().unwrap().to_string());
                    return Ok::<_, Infallible>(Some(json!("b")));
                }
                (Some("tags"), Some(Parent::Array(items))) => seen.push(items.len().to_string()),
                _ => {}
            }
            Ok(None)
        })
        .unwrap();

        assert_eq!(seen, vec!["ocr", "2", "2"]);
        assert_eq!(value["steps"][0]["processorId"], "b");
    }

    #[test]
    fn test_scan_entity_sees_same_scalars_as_walk() {
        let value = json!({"x": {"y": [1, "two", false]}});
        let Value::Object(entity) = value else {
            unreachable!()
        };
        let mut paths = Vec::new();
        scan_entity(&entity, |v| {
            paths.push(v.path_string());
            Ok::<_, Infallible>(())
        })
        .unwrap();
        assert_eq!(paths, vec!["x.y[0]", "x.y[1]", "x.y[2]"]);
    }
}
