//! A minimal `encoding/json` module: `Marshal` and `Unmarshal`.
//!
//! Built on `serde_json` rather than hand-rolled escaping, the same way the
//! value model leans on `ryu` for float formatting instead of writing its
//! own grisu variant. `Unmarshal` returns the decoded value directly rather
//! than writing through an out-pointer argument — there is no pointer-to-
//! arbitrary-value type here to receive one, only pointer-receiver structs.

use std::sync::Arc;

use serde_json::Value as Json;

use crate::{errors::Error, registry::ModuleExecutor, value::Value};

pub(super) fn executor() -> ModuleExecutor {
    Arc::new(|entrypoint, args| match entrypoint {
        "Marshal" => {
            let [value] = args else {
                return Err(Error::type_mismatch("json.Marshal", "expected exactly one argument"));
            };
            let json = to_json(value)?;
            serde_json::to_string(&json)
                .map(Value::str)
                .map_err(|e| Error::type_mismatch("json.Marshal", &e.to_string()))
        }
        "Unmarshal" => {
            let [Value::Str(s)] = args else {
                return Err(Error::type_mismatch("json.Unmarshal", "expected a single string argument"));
            };
            let json: Json = serde_json::from_str(s).map_err(|e| Error::type_mismatch("json.Unmarshal", &e.to_string()))?;
            Ok(from_json(&json))
        }
        other => Err(Error::unsupported_module(&format!("json.{other}"))),
    })
}

/// Converts a script value to its JSON representation.
///
/// `Native` has no JSON representation and is rejected; every other variant
/// maps onto the obvious JSON shape, with struct field order preserved via
/// `serde_json`'s `preserve_order` feature.
fn to_json(value: &Value) -> Result<Json, Error> {
    match value {
        Value::Int(i) => Ok(Json::from(*i)),
        Value::Float(f) => Ok(serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null)),
        Value::Str(s) => Ok(Json::String(s.to_string())),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Nil => Ok(Json::Null),
        Value::Slice(items) => {
            let items = items.borrow().iter().map(to_json).collect::<Result<Vec<_>, _>>()?;
            Ok(Json::Array(items))
        }
        Value::Struct(fields) => {
            let mut map = serde_json::Map::new();
            for (key, field) in fields.borrow().iter() {
                if key.as_str() == crate::value::TYPE_FIELD {
                    continue;
                }
                map.insert(key.clone(), to_json(field)?);
            }
            Ok(Json::Object(map))
        }
        Value::Native(_) => Err(Error::type_mismatch("json.Marshal", "native")),
    }
}

/// Converts a JSON value back to a script value.
///
/// JSON numbers with no fractional part and no exponent become `Int`;
/// everything else that parses as a number becomes `Float`.
fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => n.as_i64().map_or_else(|| Value::Float(n.as_f64().unwrap_or(0.0)), Value::Int),
        Json::String(s) => Value::str(s.clone()),
        Json::Array(items) => Value::slice(items.iter().map(from_json).collect()),
        Json::Object(map) => {
            let mut fields = crate::value::StructFields::new();
            for (key, field) in map {
                fields.insert(key.clone(), from_json(field));
            }
            Value::structure(fields)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marshal_round_trips_through_unmarshal() {
        let exec = executor();
        let mut fields = crate::value::StructFields::new();
        fields.insert("name".to_string(), Value::str("ok"));
        fields.insert("count".to_string(), Value::Int(3));
        let original = Value::structure(fields);

        let marshalled = exec("Marshal", &[original.clone()]).unwrap();
        let Value::Str(json) = marshalled else { panic!("expected a string") };

        let round_tripped = exec("Unmarshal", &[Value::str(json.to_string())]).unwrap();
        assert!(round_tripped.deep_eq(&original));
    }

    #[test]
    fn unmarshal_rejects_invalid_json() {
        let exec = executor();
        assert!(exec("Unmarshal", &[Value::str("not json")]).is_err());
    }

    #[test]
    fn marshal_rejects_native_values() {
        let native = Value::Native(std::rc::Rc::new(crate::value::NativeHandle::Function("f".to_string())));
        assert!(to_json(&native).is_err());
    }
}
