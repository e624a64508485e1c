//! Field paths and the nested path accessor.
//!
//! A [`FieldPath`] addresses a node in a values or includes tree: a sequence of
//! property names and array indices. [`get_path`] and [`set_path`] walk plain
//! `serde_json::Value` trees with those paths and never panic on shape mismatches.

use serde_json::{Map, Value};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Segment of a field path
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property access: `.name`
    Key(String),
    /// Array index access: `[0]`
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// Path into a values/includes tree (e.g. `customer.addresses[1].city`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: SmallVec<[PathSegment; 6]>,
}

impl FieldPath {
    /// The root path (empty)
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// New path with a property segment appended
    pub fn key(&self, name: &str) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Key(name.to_string()));
        new
    }

    /// New path with an index segment appended
    pub fn index(&self, idx: usize) -> Self {
        let mut new = self.clone();
        new.segments.push(PathSegment::Index(idx));
        new
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Last property name on the path, skipping indices
    pub fn last_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|s| match s {
            PathSegment::Key(k) => Some(k.as_str()),
            PathSegment::Index(_) => None,
        })
    }

    /// Parse dot/bracket notation: `a.b[0].c`. Empty input is the root path.
    pub fn parse(s: &str) -> Result<Self, PathParseError> {
        let mut segments = SmallVec::new();
        let mut current = String::new();
        let mut chars = s.trim().chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '.' => {
                    if current.is_empty() && !matches!(segments.last(), Some(PathSegment::Index(_))) {
                        return Err(PathParseError::new(s, "empty property name"));
                    }
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    }
                    let mut index_str = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        index_str.push(c);
                    }
                    if !closed {
                        return Err(PathParseError::new(s, "unclosed '['"));
                    }
                    let idx = index_str
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| PathParseError::new(s, "array index must be a non-negative integer"))?;
                    segments.push(PathSegment::Index(idx));
                    if let Some(&next) = chars.peek() {
                        if next != '.' && next != '[' {
                            return Err(PathParseError::new(s, "expected '.' or '[' after ']'"));
                        }
                    }
                }
                ']' => return Err(PathParseError::new(s, "unexpected ']'")),
                _ => current.push(ch),
            }
        }
        if !current.is_empty() {
            segments.push(PathSegment::Key(current));
        } else if s.trim().ends_with('.') {
            return Err(PathParseError::new(s, "empty property name"));
        }
        Ok(FieldPath { segments })
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldPath {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Key(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Key(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

/// Invalid field path notation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParseError {
    pub input: String,
    pub reason: &'static str,
}

impl PathParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        PathParseError {
            input: input.to_string(),
            reason,
        }
    }
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid field path '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for PathParseError {}

/// Walk `tree` along `path`.
///
/// A key segment needs an object containing the key, an index segment needs an
/// array with the index in range. Any mismatch yields `None`.
pub fn get_path<'a>(tree: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = tree;
    for seg in path.segments() {
        current = match (seg, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get(k)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// [`get_path`] with a fallback for missing nodes
pub fn get_or<'a>(tree: &'a Value, path: &FieldPath, default: &'a Value) -> &'a Value {
    get_path(tree, path).unwrap_or(default)
}

/// Mutable counterpart of [`get_path`]
pub fn get_path_mut<'a>(tree: &'a mut Value, path: &FieldPath) -> Option<&'a mut Value> {
    let mut current = tree;
    for seg in path.segments() {
        current = match (seg, current) {
            (PathSegment::Key(k), Value::Object(map)) => map.get_mut(k)?,
            (PathSegment::Index(i), Value::Array(arr)) => arr.get_mut(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

fn is_composite(v: &Value) -> bool {
    matches!(v, Value::Object(_) | Value::Array(_))
}

fn empty_container_for(next: &PathSegment) -> Value {
    match next {
        PathSegment::Key(_) => Value::Object(Map::new()),
        PathSegment::Index(_) => Value::Array(Vec::new()),
    }
}

/// Store `value` at `path`, creating intermediate containers.
///
/// - A missing object key on the way is created as an empty object.
/// - A missing array slot is padded with empty objects up to the index.
/// - An intermediate slot holding a scalar is replaced by an empty container
///   of the kind the next segment needs (its old content is lost).
/// - The final array index must be in bounds or equal to the length (append).
/// - An empty path replaces the whole tree.
///
/// Returns `false` when the path could not be applied (wrong container kind,
/// index past the end); the tree is left as far as it was walked.
pub fn set_path(tree: &mut Value, path: &FieldPath, value: Value) -> bool {
    let segs = path.segments();
    let Some((last, intermediate)) = segs.split_last() else {
        *tree = value;
        return true;
    };

    let mut current = tree;
    for (i, seg) in intermediate.iter().enumerate() {
        let next = &segs[i + 1];
        let slot = match (seg, current) {
            (PathSegment::Key(k), Value::Object(map)) => {
                map.entry(k.clone()).or_insert_with(|| Value::Object(Map::new()))
            }
            (PathSegment::Index(idx), Value::Array(arr)) => {
                while arr.len() <= *idx {
                    arr.push(Value::Object(Map::new()));
                }
                &mut arr[*idx]
            }
            _ => return false,
        };
        if !is_composite(slot) {
            *slot = empty_container_for(next);
        }
        current = slot;
    }

    match (last, current) {
        (PathSegment::Key(k), Value::Object(map)) => {
            map.insert(k.clone(), value);
            true
        }
        (PathSegment::Index(idx), Value::Array(arr)) => {
            if *idx < arr.len() {
                arr[*idx] = value;
                true
            } else if *idx == arr.len() {
                arr.push(value);
                true
            } else {
                false
            }
        }
        _ => false,
    }
}
