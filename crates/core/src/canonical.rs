//! Canonical form, deep clone and value equality
//!
//! Equality between a stored value and its live counterpart is decided on a canonical
//! JSON text: object keys sorted, `undefined` members omitted (or `null` inside arrays),
//! non-finite numbers written as `null`, buffer views written as byte arrays. Values
//! containing functions, host handles, denied members or cycles have no canonical form.

use crate::error::{GraphError, Result};
use crate::record::Record;
use crate::value::{ObjectKind, ObjectRef, Value};
use ahash::AHashSet;
use serde_json::{Map, Number};

/// Nesting depth after which a value is treated as unserializable
pub const MAX_CANONICAL_DEPTH: usize = 1024;

/// Outcome of comparing two values by canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Same canonical text, or the same object
    Equal,
    /// Both serializable, different text
    Different,
    /// At least one side has no canonical form
    Incomparable(GraphError),
}

impl Comparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, Comparison::Equal)
    }
}

/// Tracks the objects on the current descent path to detect cycles
struct Descent {
    on_path: AHashSet<crate::value::ObjectId>,
}

impl Descent {
    fn new() -> Self {
        Self {
            on_path: AHashSet::new(),
        }
    }

    fn enter(&mut self, object: &ObjectRef) -> Result<()> {
        if object.kind().is_opaque() {
            let what = object.kind().tag_name().to_lowercase();
            return Err(GraphError::not_serializable(match object.label() {
                Some(label) => format!("{} `{}`", what, label),
                None => what,
            }));
        }
        if self.on_path.len() >= MAX_CANONICAL_DEPTH {
            return Err(GraphError::not_serializable("nesting too deep"));
        }
        if !self.on_path.insert(object.id()) {
            return Err(GraphError::not_serializable("cyclic reference"));
        }
        Ok(())
    }

    fn leave(&mut self, object: &ObjectRef) {
        self.on_path.remove(&object.id());
    }
}

fn member_error(key: &str, err: GraphError) -> GraphError {
    match err {
        GraphError::NotSerializable { .. } => err,
        _ => GraphError::not_serializable(format!("member '{}' is not accessible", key)),
    }
}

fn to_json_number(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return serde_json::Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn to_json(value: &Value, descent: &mut Descent) -> Result<serde_json::Value> {
    let object = match value {
        Value::Undefined | Value::Null => return Ok(serde_json::Value::Null),
        Value::Bool(b) => return Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => return Ok(to_json_number(*n)),
        Value::String(s) => return Ok(serde_json::Value::String(s.clone())),
        Value::Object(object) => object,
    };

    descent.enter(object)?;
    let json = match object.kind() {
        ObjectKind::BufferView => serde_json::Value::Array(
            object
                .bytes()
                .unwrap_or_default()
                .into_iter()
                .map(|b| serde_json::Value::Number(Number::from(b)))
                .collect(),
        ),
        ObjectKind::Array => {
            let mut items = Vec::new();
            for (key, member) in object.members() {
                let member = member.map_err(|e| member_error(&key, e))?;
                items.push(to_json(&member, descent)?);
            }
            serde_json::Value::Array(items)
        }
        _ => {
            let mut members = object.members();
            members.sort_by(|(a, _), (b, _)| a.cmp(b));

            let mut map = Map::new();
            for (key, member) in members {
                let member = member.map_err(|e| member_error(&key, e))?;
                if matches!(member, Value::Undefined) {
                    continue;
                }
                let json = to_json(&member, descent)?;
                map.insert(key, json);
            }
            serde_json::Value::Object(map)
        }
    };
    descent.leave(object);
    Ok(json)
}

/// Canonical text of a value, used purely for equality
pub fn stringify(value: &Value) -> Result<String> {
    if matches!(value, Value::Undefined) {
        return Ok("undefined".to_string());
    }
    let json = to_json(value, &mut Descent::new())?;
    serde_json::to_string(&json).map_err(|e| GraphError::not_serializable(e.to_string()))
}

fn clone_value(value: &Value, descent: &mut Descent) -> Result<Value> {
    let object = match value {
        Value::Object(object) => object,
        primitive => return Ok(primitive.clone()),
    };

    descent.enter(object)?;
    let copy = match object.kind() {
        ObjectKind::BufferView => Record::buffer(object.bytes().unwrap_or_default()),
        kind => {
            let copy = Record::of_kind(kind);
            for (key, member) in object.members() {
                let member = member.map_err(|e| member_error(&key, e))?;
                let child = clone_value(&member, descent)?;
                copy.insert(key, child);
            }
            copy
        }
    };
    descent.leave(object);
    Ok(copy.into_value())
}

/// Detached deep copy of a value
///
/// The copy shares nothing with the live graph, so later mutations of the host do not
/// show through it. Fails with `NotSerializable` on the same inputs as [`stringify`].
pub fn deep_clone(value: &Value) -> Result<Value> {
    clone_value(value, &mut Descent::new())
}

/// Compare two values by canonical form
///
/// Reference-identical objects are always equal, even when they have no canonical form.
pub fn compare(a: &Value, b: &Value) -> Comparison {
    if let (Value::Object(x), Value::Object(y)) = (a, b) {
        if x.ptr_eq(y) {
            return Comparison::Equal;
        }
    }

    let left = match stringify(a) {
        Ok(text) => text,
        Err(e) => return Comparison::Incomparable(e),
    };
    let right = match stringify(b) {
        Ok(text) => text,
        Err(e) => return Comparison::Incomparable(e),
    };

    if left == right {
        Comparison::Equal
    } else {
        Comparison::Different
    }
}
