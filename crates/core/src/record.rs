//! In-memory host objects
//!
//! `Record` is the host family used by the CLI and by tests: an insertion-ordered member
//! list behind a lock, so graphs can be mutated between snapshots while the engine holds
//! shared handles to them.

use crate::error::{GraphError, Result};
use crate::value::{HostObject, Member, ObjectKind, ObjectRef, Value};
use parking_lot::RwLock;

/// Storage for one member
#[derive(Debug, Clone)]
pub enum Slot {
    /// Readable member
    Value(Value),
    /// Member whose accessor throws
    Denied,
}

/// Mutable in-memory host object
pub struct Record {
    kind: ObjectKind,
    label: Option<String>,
    bytes: Option<Vec<u8>>,
    slots: RwLock<Vec<(String, Slot)>>,
}

impl Record {
    fn with_kind(kind: ObjectKind) -> Self {
        Self {
            kind,
            label: None,
            bytes: None,
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Create an empty plain object
    pub fn object() -> Self {
        Self::with_kind(ObjectKind::Plain)
    }

    /// Create an empty array
    pub fn array() -> Self {
        Self::with_kind(ObjectKind::Array)
    }

    /// Create an opaque function object
    pub fn function(name: impl Into<String>) -> Self {
        Self {
            label: Some(name.into()),
            ..Self::with_kind(ObjectKind::Function)
        }
    }

    /// Create an opaque host handle
    pub fn handle(name: impl Into<String>) -> Self {
        Self {
            label: Some(name.into()),
            ..Self::with_kind(ObjectKind::Handle)
        }
    }

    /// Create a binary buffer view
    pub fn buffer(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            ..Self::with_kind(ObjectKind::BufferView)
        }
    }

    /// Create an empty record of the given kind
    pub fn of_kind(kind: ObjectKind) -> Self {
        Self::with_kind(kind)
    }

    /// Builder: add or replace a member
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value.into());
        self
    }

    /// Builder: add a member whose access is denied
    pub fn with_denied(self, key: impl Into<String>) -> Self {
        self.deny(key);
        self
    }

    /// Add or replace a member, keeping its enumeration position when it already exists
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.put(key.into(), Slot::Value(value));
    }

    /// Make a member throw on access
    pub fn deny(&self, key: impl Into<String>) {
        self.put(key.into(), Slot::Denied);
    }

    /// Append to an array-like record using the next index as key
    pub fn push(&self, value: Value) {
        let mut slots = self.slots.write();
        let key = slots.len().to_string();
        slots.push((key, Slot::Value(value)));
    }

    fn put(&self, key: String, slot: Slot) {
        let mut slots = self.slots.write();
        match slots.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = slot,
            None => slots.push((key, slot)),
        }
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef::new(self)
    }

    /// Wrap into a value
    pub fn into_value(self) -> Value {
        Value::Object(self.into_ref())
    }
}

fn read_slot(key: &str, slot: &Slot) -> Member {
    match slot {
        Slot::Value(value) => Ok(value.clone()),
        Slot::Denied => Err(GraphError::MemberAccessDenied {
            key: key.to_string(),
        }),
    }
}

impl HostObject for Record {
    fn kind(&self) -> ObjectKind {
        self.kind
    }

    fn members(&self) -> Vec<(String, Member)> {
        if let Some(bytes) = &self.bytes {
            return bytes
                .iter()
                .enumerate()
                .map(|(i, b)| (i.to_string(), Ok(Value::Number(*b as f64))))
                .collect();
        }

        // Values are copied out so no lock is held while callers recurse.
        self.slots
            .read()
            .iter()
            .map(|(key, slot)| (key.clone(), read_slot(key, slot)))
            .collect()
    }

    fn get(&self, key: &str) -> Option<Member> {
        if let Some(bytes) = &self.bytes {
            let index: usize = key.parse().ok()?;
            return bytes.get(index).map(|b| Ok(Value::Number(*b as f64)));
        }

        self.slots
            .read()
            .iter()
            .find(|(name, _)| name == key)
            .map(|(name, slot)| read_slot(name, slot))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        if self.kind.is_opaque() || self.bytes.is_some() {
            return Err(GraphError::Unsupported {
                kind: self.kind.to_string(),
                operation: "set",
            });
        }
        self.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<Value>> {
        if self.bytes.is_some() {
            return Err(GraphError::Unsupported {
                kind: self.kind.to_string(),
                operation: "remove",
            });
        }

        let mut slots = self.slots.write();
        let Some(pos) = slots.iter().position(|(name, _)| name == key) else {
            return Ok(None);
        };
        match slots.remove(pos).1 {
            Slot::Value(value) => Ok(Some(value)),
            Slot::Denied => Ok(None),
        }
    }

    fn bytes(&self) -> Option<Vec<u8>> {
        self.bytes.clone()
    }

    fn label(&self) -> Option<String> {
        self.label.clone()
    }
}
