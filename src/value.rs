//! Dynamic value representation.
//!
//! A tagged sum type with explicit coercions rather than runtime reflection,
//! sized for this interpreter's value model: no bigint, no bytes/sets/
//! generators, and aggregates are reference types (`Rc<RefCell<_>>`) the way
//! Go slices, maps, and struct pointers are reference types, which is what
//! lets pointer-receiver mutation stay observable in the caller.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved struct field holding the type name used for method dispatch.
pub const TYPE_FIELD: &str = "_type";

/// An ordered string-keyed mapping, backing both struct and map-literal values.
pub type StructFields = IndexMap<String, Value>;

/// An opaque handle referring to a registered native callable or module.
///
/// An opaque native handle, for registered callables/modules. Core
/// opcodes never construct these directly — they exist so a native callable
/// can hand a first-class reference to another native function or module back
/// into script code, which a host's callable contract may want to do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeHandle {
    Function(String),
    Module(String),
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(name) => write!(f, "<function {name}>"),
            Self::Module(name) => write!(f, "<module {name}>"),
        }
    }
}

/// A dynamically typed value.
///
/// Serializable so a host can export a variable snapshot (e.g. for
/// structured logging or an inspection endpoint) without round-tripping
/// through `Display`; aggregates deserialize into fresh, unshared `Rc`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Bool(bool),
    Nil,
    /// Ordered sequence of values. Reference type: cloning a `Value::Slice`
    /// clones the handle, not the contents (matches Go slice semantics).
    Slice(Rc<RefCell<Vec<Value>>>),
    /// Mapping from string to value, backing both `map[string]T` and struct values.
    Struct(Rc<RefCell<StructFields>>),
    Native(Rc<NativeHandle>),
}

impl Value {
    #[must_use]
    pub fn slice(items: Vec<Value>) -> Self {
        Self::Slice(Rc::new(RefCell::new(items)))
    }

    #[must_use]
    pub fn structure(fields: StructFields) -> Self {
        Self::Struct(Rc::new(RefCell::new(fields)))
    }

    #[must_use]
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Self::Str(s.into())
    }

    /// The advisory type-tag string for this value, used for `Context` slot annotations.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bool(_) => "bool",
            Self::Nil => "unknown",
            Self::Slice(_) => "slice",
            Self::Struct(_) => "struct",
            Self::Native(_) => "native",
        }
    }

    /// The struct's recorded `_type` name, if this is a struct value that has one.
    #[must_use]
    pub fn struct_type_name(&self) -> Option<String> {
        match self {
            Self::Struct(fields) => match fields.borrow().get(TYPE_FIELD) {
                Some(Self::Str(name)) => Some(name.to_string()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Truthiness rules: nil → false; bool → itself; zero/empty → false; else true.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::Slice(_) | Self::Struct(_) | Self::Native(_) => true,
        }
    }

    /// Deep structural equality.
    #[must_use]
    pub fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Nil, Self::Nil) => true,
            (Self::Slice(a), Self::Slice(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.deep_eq(y))
            }
            (Self::Struct(a), Self::Struct(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|bv| v.deep_eq(bv)))
            }
            (Self::Native(a), Self::Native(b)) => a == b,
            _ => false,
        }
    }

    /// Recursively clones aggregate contents into fresh `Rc`s.
    ///
    /// Used for value-receiver method calls: the caller's struct
    /// must be unreachable from the copy passed to the method.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Slice(items) => {
                let cloned = items.borrow().iter().map(Value::deep_clone).collect();
                Self::slice(cloned)
            }
            Self::Struct(fields) => {
                let cloned = fields.borrow().iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect();
                Self::structure(cloned)
            }
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => {
                let mut buf = ryu::Buffer::new();
                write!(f, "{}", buf.format(*x))
            }
            Self::Str(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "<nil>"),
            Self::Slice(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.borrow().iter().filter(|(k, _)| k.as_str() != TYPE_FIELD).enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                write!(f, "}}")
            }
            Self::Native(handle) => write!(f, "{handle}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_go_rules() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn deep_eq_structural() {
        let a = Value::slice(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::slice(vec![Value::Int(1), Value::Int(2)]);
        assert!(a.deep_eq(&b));

        let mut f1 = StructFields::new();
        f1.insert("x".to_string(), Value::Int(1));
        let mut f2 = StructFields::new();
        f2.insert("x".to_string(), Value::Int(1));
        assert!(Value::structure(f1).deep_eq(&Value::structure(f2)));
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut fields = StructFields::new();
        fields.insert("h".to_string(), Value::Int(5));
        let original = Value::structure(fields);
        let copy = original.deep_clone();
        if let (Value::Struct(orig), Value::Struct(dup)) = (&original, &copy) {
            dup.borrow_mut().insert("h".to_string(), Value::Int(99));
            assert_eq!(orig.borrow().get("h").unwrap().deep_eq(&Value::Int(5)), true);
        } else {
            unreachable!();
        }
    }
}
