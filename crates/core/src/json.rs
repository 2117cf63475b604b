//! Host graphs from JSON documents
//!
//! Plain JSON cannot express aliasing, cycles or opaque members, so single-key objects
//! whose key starts with `$` are read as directives:
//!
//! | directive | produces |
//! |-----------|----------|
//! | `{"$ref": "a.b"}` | the object found at `a.b` (aliases and cycles) |
//! | `{"$fn": "name"}` | an opaque function |
//! | `{"$handle": "name"}` | an opaque host handle |
//! | `{"$buffer": [1, 2]}` | a binary buffer view |
//! | `{"$denied": true}` | a member whose access throws |
//!
//! References are linked after the whole document is built, so they may point forward,
//! backward, or at an ancestor.

use crate::error::{GraphError, Result};
use crate::path::{resolve, ObjectPath};
use crate::record::Record;
use crate::value::{ObjectRef, Value};
use serde_json::Value as Json;
use std::sync::Arc;

/// A `$ref` waiting to be linked
struct PendingRef {
    owner: Arc<Record>,
    key: String,
    target: ObjectPath,
}

enum Built {
    Value(Value),
    Ref(ObjectPath),
    Denied,
}

fn directive(map: &serde_json::Map<String, Json>) -> Option<(&str, &Json)> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    key.starts_with('$').then_some((key.as_str(), value))
}

fn invalid(msg: impl Into<String>) -> GraphError {
    GraphError::InvalidGraph(msg.into())
}

fn build(doc: &Json, pending: &mut Vec<PendingRef>) -> Result<Built> {
    let value = match doc {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => {
            let record = Arc::new(Record::array());
            for (i, item) in items.iter().enumerate() {
                attach(&record, i.to_string(), build(item, pending)?, pending);
            }
            Value::Object(ObjectRef::from_arc(record))
        }
        Json::Object(map) => match directive(map) {
            Some(("$ref", Json::String(path))) => return Ok(Built::Ref(path.parse()?)),
            Some(("$fn", Json::String(name))) => Record::function(name.clone()).into_value(),
            Some(("$handle", Json::String(name))) => Record::handle(name.clone()).into_value(),
            Some(("$buffer", Json::Array(bytes))) => {
                let bytes = bytes
                    .iter()
                    .map(|b| {
                        b.as_u64()
                            .and_then(|b| u8::try_from(b).ok())
                            .ok_or_else(|| invalid(format!("buffer byte out of range: {}", b)))
                    })
                    .collect::<Result<Vec<u8>>>()?;
                Record::buffer(bytes).into_value()
            }
            Some(("$denied", Json::Bool(true))) => return Ok(Built::Denied),
            Some((name, _)) => return Err(invalid(format!("malformed directive {}", name))),
            None => {
                let record = Arc::new(Record::object());
                for (key, item) in map {
                    attach(&record, key.clone(), build(item, pending)?, pending);
                }
                Value::Object(ObjectRef::from_arc(record))
            }
        },
    };
    Ok(Built::Value(value))
}

fn attach(owner: &Arc<Record>, key: String, built: Built, pending: &mut Vec<PendingRef>) {
    match built {
        Built::Value(value) => owner.insert(key, value),
        Built::Denied => owner.deny(key),
        Built::Ref(target) => {
            // Reserve the enumeration slot now; linking fills it in.
            owner.insert(key.clone(), Value::Undefined);
            pending.push(PendingRef {
                owner: Arc::clone(owner),
                key,
                target,
            });
        }
    }
}

/// Build a host graph from a JSON document
///
/// References may go through other references; linking repeats until every reference
/// resolves, and fails with `InvalidGraph` when some never do.
pub fn load_graph(doc: &Json) -> Result<Value> {
    let mut pending = Vec::new();
    let root = match build(doc, &mut pending)? {
        Built::Value(value) => value,
        Built::Ref(_) | Built::Denied => return Err(invalid("root cannot be a directive")),
    };

    while !pending.is_empty() {
        let before = pending.len();
        let mut unresolved = Vec::new();
        for link in pending {
            match resolve(&root, &link.target) {
                Ok(target) if !matches!(target, Value::Undefined) => {
                    link.owner.insert(link.key, target)
                }
                _ => unresolved.push(link),
            }
        }
        if unresolved.len() == before {
            let targets: Vec<String> = unresolved.iter().map(|l| l.target.to_string()).collect();
            return Err(invalid(format!("unresolvable $ref: {}", targets.join(", "))));
        }
        pending = unresolved;
    }

    Ok(root)
}

/// Parse a JSON document and build its host graph
pub fn load_graph_str(text: &str) -> anyhow::Result<Value> {
    let doc: Json = serde_json::from_str(text)?;
    Ok(load_graph(&doc)?)
}

/// Plain JSON for a value that is wholly serializable
pub fn to_json(value: &Value) -> Result<Json> {
    let text = crate::canonical::stringify(value)?;
    if matches!(value, Value::Undefined) {
        return Ok(Json::Null);
    }
    serde_json::from_str(&text).map_err(|e| GraphError::not_serializable(e.to_string()))
}
