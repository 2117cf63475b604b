//! Member-access paths and path resolution
//!
//! A path is the sequence of member names leading from the observation root to a value.
//! Its text form joins the names with `.` and has no leading separator; the root itself
//! is the empty path.

use crate::error::{GraphError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Separator between segments in the text form
pub const SEPARATOR: char = '.';

/// Path from the observation root to a value
///
/// Uses SmallVec so typical shallow paths stay inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ObjectPath {
    segments: SmallVec<[String; 6]>,
}

impl ObjectPath {
    /// The empty path, designating the root itself
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from its segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments; the measure used when comparing alias lengths
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path of a member of the value at this path
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.segments.push(key.into());
        child
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.segments.push(key.into());
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Detach the last segment, `None` for the root
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Path of the enclosing value, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        let mut parent = self.clone();
        parent.segments.pop().map(|_| parent)
    }

    /// This path followed by `suffix`
    pub fn join(&self, suffix: &ObjectPath) -> Self {
        let mut joined = self.clone();
        joined.segments.extend(suffix.segments.iter().cloned());
        joined
    }

    /// `segment` followed by this path
    pub fn prepend(&mut self, segment: String) {
        self.segments.insert(0, segment);
    }

    /// Text form, segments joined by `.`
    pub fn to_path_string(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push_str(segment);
        }
        out
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_path_string())
    }
}

impl FromStr for ObjectPath {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = SmallVec::new();
        for (i, segment) in s.split(SEPARATOR).enumerate() {
            if segment.is_empty() {
                return Err(GraphError::InvalidPath {
                    path: s.to_string(),
                    reason: format!("empty segment at position {}", i),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }
}

impl From<ObjectPath> for String {
    fn from(path: ObjectPath) -> Self {
        path.to_path_string()
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = GraphError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Re-fetch the live value at `path` below `root`
///
/// Fails with `PathNotFound` when a segment is absent or walks through a primitive, and
/// with `MemberAccessDenied` when a segment's accessor throws.
pub fn resolve(root: &Value, path: &ObjectPath) -> Result<Value> {
    let mut current = root.clone();
    for segment in path.segments() {
        let object = match &current {
            Value::Object(object) => object.clone(),
            _ => return Err(GraphError::path_not_found(path)),
        };
        current = match object.get(segment) {
            Some(member) => member?,
            None => return Err(GraphError::path_not_found(path)),
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;

    fn sample() -> Value {
        let inner = Record::object().with("depth", 1).with_denied("locked");
        Record::object()
            .with("theme", Record::object().with("nested", inner.into_ref()).into_ref())
            .with("count", 3)
            .into_value()
    }

    #[test]
    fn test_parse_and_display() {
        let path: ObjectPath = "theme.nested.depth".parse().unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.last_segment(), Some("depth"));
        assert_eq!(path.to_string(), "theme.nested.depth");

        let root: ObjectPath = "".parse().unwrap();
        assert!(root.is_root());
        assert_eq!(root.to_string(), "");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(".a".parse::<ObjectPath>().is_err());
        assert!("a..b".parse::<ObjectPath>().is_err());
        assert!("a.".parse::<ObjectPath>().is_err());
    }

    #[test]
    fn test_child_parent_join() {
        let base = ObjectPath::from_segments(["a", "b"]);
        assert_eq!(base.child("c").to_string(), "a.b.c");
        assert_eq!(base.parent().unwrap().to_string(), "a");
        assert!(ObjectPath::root().parent().is_none());

        let joined = base.join(&ObjectPath::from_segments(["x"]));
        assert_eq!(joined.to_string(), "a.b.x");

        let mut prefixed = ObjectPath::from_segments(["y"]);
        prefixed.prepend("x".to_string());
        assert_eq!(prefixed.to_string(), "x.y");
    }

    #[test]
    fn test_resolve() {
        let root = sample();
        let depth = resolve(&root, &"theme.nested.depth".parse().unwrap()).unwrap();
        assert_eq!(depth.as_number(), Some(1.0));

        let itself = resolve(&root, &ObjectPath::root()).unwrap();
        assert!(itself.strict_eq(&root));
    }

    #[test]
    fn test_resolve_failures() {
        let root = sample();

        let missing = resolve(&root, &"theme.gone".parse().unwrap()).unwrap_err();
        assert!(matches!(missing, GraphError::PathNotFound { .. }));

        let through_primitive = resolve(&root, &"count.x".parse().unwrap()).unwrap_err();
        assert!(matches!(through_primitive, GraphError::PathNotFound { .. }));

        let denied = resolve(&root, &"theme.nested.locked".parse().unwrap()).unwrap_err();
        assert!(matches!(denied, GraphError::MemberAccessDenied { .. }));
    }

    #[test]
    fn test_serde_as_string() {
        let path = ObjectPath::from_segments(["a", "b"]);
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a.b\"");
        let back: ObjectPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
