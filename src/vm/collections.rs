//! Aggregate opcodes: structs, slices, indexing, and `LEN`.

use crate::{
    errors::Error,
    registry::FunctionRegistry,
    value::{Value, TYPE_FIELD},
};

/// `NEW_STRUCT typeName`: seeds every declared field with `nil`, then stamps
/// `_type`.
pub fn new_struct(registry: &FunctionRegistry, type_name: &str) -> Value {
    let mut fields = crate::value::StructFields::new();
    if let Some(declared) = registry.struct_fields(type_name) {
        for field in declared {
            fields.insert(field.clone(), Value::Nil);
        }
    }
    fields.insert(TYPE_FIELD.to_string(), Value::str(type_name.to_string()));
    Value::structure(fields)
}

/// `GET_FIELD name`: struct field read.
pub fn get_field(receiver: &Value, name: &str) -> Result<Value, Error> {
    match receiver {
        Value::Struct(fields) => Ok(fields.borrow().get(name).cloned().unwrap_or(Value::Nil)),
        other => Err(Error::type_mismatch("GET_FIELD", other.type_tag())),
    }
}

/// `SET_FIELD name`: pops receiver and value, mutates in place, pushes nothing.
pub fn set_field(receiver: &Value, name: &str, value: Value) -> Result<(), Error> {
    match receiver {
        Value::Struct(fields) => {
            fields.borrow_mut().insert(name.to_string(), value);
            Ok(())
        }
        other => Err(Error::type_mismatch("SET_FIELD", other.type_tag())),
    }
}

/// `SET_STRUCT_FIELD name`: the composite-literal variant — mutates the
/// struct left on the stack in place rather than popping/repushing it, for
/// the `T{f1: v1}` lowering of `NEW_STRUCT T` followed by repeated
/// `push struct; push value; SET_STRUCT_FIELD f`.
pub fn set_struct_field(receiver: &Value, name: &str, value: Value) -> Result<(), Error> {
    set_field(receiver, name, value)
}

/// `GET_INDEX`: slice indexing (bounds-checked — out-of-range is
/// `IndexOutOfRange`, not `nil`), or a keyed struct/map read (missing key
/// returns `nil` — there is no "out of range" for a keyed lookup).
pub fn get_index(receiver: &Value, index: &Value) -> Result<Value, Error> {
    match receiver {
        Value::Slice(items) => {
            let items = items.borrow();
            let idx = require_index(index, items.len())?;
            Ok(items[idx].clone())
        }
        Value::Struct(fields) => {
            let key = require_key(index)?;
            Ok(fields.borrow().get(key).cloned().unwrap_or(Value::Nil))
        }
        Value::Str(s) => {
            let bytes = s.as_bytes();
            let idx = require_index(index, bytes.len())?;
            Ok(Value::Int(i64::from(bytes[idx])))
        }
        other => Err(Error::type_mismatch("GET_INDEX", other.type_tag())),
    }
}

/// `SET_INDEX`: bounds-checked slice element write, or a keyed struct/map write.
pub fn set_index(receiver: &Value, index: &Value, value: Value) -> Result<(), Error> {
    match receiver {
        Value::Slice(items) => {
            let mut items = items.borrow_mut();
            let idx = require_index(index, items.len())?;
            items[idx] = value;
            Ok(())
        }
        Value::Struct(fields) => {
            let key = require_key(index)?.to_string();
            fields.borrow_mut().insert(key, value);
            Ok(())
        }
        other => Err(Error::type_mismatch("SET_INDEX", other.type_tag())),
    }
}

/// `LEN`: slice/string length, or struct field count excluding `_type`.
pub fn len(receiver: &Value) -> Result<Value, Error> {
    match receiver {
        Value::Slice(items) => Ok(Value::Int(items.borrow().len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.len() as i64)),
        Value::Struct(fields) => {
            let count = fields.borrow().keys().filter(|k| k.as_str() != TYPE_FIELD).count();
            Ok(Value::Int(count as i64))
        }
        other => Err(Error::type_mismatch("LEN", other.type_tag())),
    }
}

/// `GET_ELEMENT`: bounds-checked slice/string element read used by range
/// loops.
pub fn get_element(receiver: &Value, index: &Value) -> Result<Value, Error> {
    get_index(receiver, index)
}

fn require_index(index: &Value, len: usize) -> Result<usize, Error> {
    let Value::Int(i) = index else {
        return Err(Error::type_mismatch("index", index.type_tag()));
    };
    if *i < 0 || *i as usize >= len {
        return Err(Error::index_out_of_range(*i, len));
    }
    Ok(*i as usize)
}

fn require_key(index: &Value) -> Result<&str, Error> {
    match index {
        Value::Str(s) => Ok(s),
        other => Err(Error::type_mismatch("struct/map key", other.type_tag())),
    }
}
