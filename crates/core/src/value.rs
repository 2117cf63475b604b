//! Host value model
//!
//! The engine never reflects over host objects. Every host-object family exposes its
//! members through the [`HostObject`] capability trait, and the engine only ever sees
//! [`Value`]s: primitives by value, composites as shared [`ObjectRef`] handles.

use crate::error::{GraphError, Result};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Result of reading a single member
///
/// A member whose accessor throws yields `Err(GraphError::MemberAccessDenied)` without
/// failing the enumeration it belongs to.
pub type Member = Result<Value>;

/// Runtime category of a host object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Plain keyed container
    Plain,
    /// Index-keyed container
    Array,
    /// Callable, never serializable
    Function,
    /// Opaque host resource (window handle, socket, DOM node...)
    Handle,
    /// Fixed-size binary buffer view
    BufferView,
}

impl ObjectKind {
    /// Name used in `[object Kind]` type tags
    pub fn tag_name(&self) -> &'static str {
        match self {
            ObjectKind::Plain => "Object",
            ObjectKind::Array => "Array",
            ObjectKind::Function => "Function",
            ObjectKind::Handle => "Handle",
            ObjectKind::BufferView => "Uint8Array",
        }
    }

    /// Whether values of this kind can ever be cloned or canonicalized
    pub fn is_opaque(&self) -> bool {
        matches!(self, ObjectKind::Function | ObjectKind::Handle)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// Capability interface implemented by each host-object family
pub trait HostObject: Send + Sync {
    /// Runtime category of this object
    fn kind(&self) -> ObjectKind;

    /// Own and inherited enumerable members, in enumeration order
    ///
    /// Never fails as a whole; individual members may carry an access error.
    fn members(&self) -> Vec<(String, Member)>;

    /// Read a single member, `None` when absent
    fn get(&self, key: &str) -> Option<Member> {
        self.members()
            .into_iter()
            .find(|(name, _)| name == key)
            .map(|(_, member)| member)
    }

    /// Assign a member
    fn set(&self, _key: &str, _value: Value) -> Result<()> {
        Err(GraphError::Unsupported {
            kind: self.kind().to_string(),
            operation: "set",
        })
    }

    /// Delete a member, returning the previous value
    fn remove(&self, _key: &str) -> Result<Option<Value>> {
        Err(GraphError::Unsupported {
            kind: self.kind().to_string(),
            operation: "remove",
        })
    }

    /// Raw contents of a buffer view
    fn bytes(&self) -> Option<Vec<u8>> {
        None
    }

    /// Display label for opaque objects (function or handle name)
    fn label(&self) -> Option<String> {
        None
    }
}

/// Identity of a host object
///
/// Derived from the allocation address. Only meaningful while some handle keeps the
/// object alive, which the snapshot guarantees by holding every visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Shared handle to a host object
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn HostObject>);

impl ObjectRef {
    /// Wrap a host object
    pub fn new<T: HostObject + 'static>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Wrap an already shared host object
    pub fn from_arc(object: Arc<dyn HostObject>) -> Self {
        Self(object)
    }

    /// Reference identity of the underlying object
    pub fn id(&self) -> ObjectId {
        ObjectId(Arc::as_ptr(&self.0) as *const () as usize)
    }

    /// True when both handles point at the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        self.id() == other.id()
    }
}

impl Deref for ObjectRef {
    type Target = dyn HostObject;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

// Graphs are cyclic, so Debug must never descend into members.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({} @ {})", self.kind(), self.id())
    }
}

/// A value observed in the host graph
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(ObjectRef),
}

impl Value {
    /// Everything except objects is a primitive, including `Null` and the empty string
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Object(_))
    }

    /// Composite counterpart of [`Value::is_primitive`]
    pub fn is_composite(&self) -> bool {
        !self.is_primitive()
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Identity of composite values, `None` for primitives
    pub fn identity(&self) -> Option<ObjectId> {
        self.as_object().map(ObjectRef::id)
    }

    /// Runtime category, `None` for primitives
    pub fn object_kind(&self) -> Option<ObjectKind> {
        self.as_object().map(|object| object.kind())
    }

    /// Read a member of a composite value; primitives have no members
    pub fn get(&self, key: &str) -> Option<Member> {
        self.as_object().and_then(|object| object.get(key))
    }

    /// Enumerate members of a composite value; primitives yield nothing
    pub fn members(&self) -> Vec<(String, Member)> {
        self.as_object()
            .map(|object| object.members())
            .unwrap_or_default()
    }

    /// Strict equality: primitives by value (`NaN` is never equal), objects by identity
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// `[object Kind]` style type tag
    pub fn type_tag(&self) -> String {
        let name = match self {
            Value::Undefined => "Undefined",
            Value::Null => "Null",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Object(object) => object.kind().tag_name(),
        };
        format!("[object {}]", name)
    }
}

/// Render a number, dropping the fraction of integral values
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        // Covers negative zero
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Object(object) => match object.label() {
                Some(label) => write!(f, "[{} {}]", object.kind().tag_name().to_lowercase(), label),
                None => write!(f, "[object {}]", object.kind().tag_name()),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}
