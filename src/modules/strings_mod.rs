//! A minimal `strings` module: `HasPrefix`, `HasSuffix`, `Contains`, `ToUpper`, `ToLower`.
//!
//! An entrypoint-dispatched executor over `&[Value]`, trimmed to the
//! handful of functions Go's `strings` package exposes most commonly.

use std::sync::Arc;

use crate::{errors::Error, registry::ModuleExecutor, value::Value};

pub(super) fn executor() -> ModuleExecutor {
    Arc::new(|entrypoint, args| match entrypoint {
        "HasPrefix" => {
            let (s, prefix) = two_strings(entrypoint, args)?;
            Ok(Value::Bool(s.starts_with(prefix.as_ref())))
        }
        "HasSuffix" => {
            let (s, suffix) = two_strings(entrypoint, args)?;
            Ok(Value::Bool(s.ends_with(suffix.as_ref())))
        }
        "Contains" => {
            let (s, needle) = two_strings(entrypoint, args)?;
            Ok(Value::Bool(s.contains(needle.as_ref())))
        }
        "ToUpper" => {
            let s = one_string(entrypoint, args)?;
            Ok(Value::str(s.to_uppercase()))
        }
        "ToLower" => {
            let s = one_string(entrypoint, args)?;
            Ok(Value::str(s.to_lowercase()))
        }
        other => Err(Error::unsupported_module(&format!("strings.{other}"))),
    })
}

fn one_string<'a>(entrypoint: &str, args: &'a [Value]) -> Result<&'a str, Error> {
    match args {
        [Value::Str(s)] => Ok(s),
        _ => Err(Error::type_mismatch(&format!("strings.{entrypoint}"), "expected a single string argument")),
    }
}

fn two_strings<'a>(entrypoint: &str, args: &'a [Value]) -> Result<(&'a str, &'a str), Error> {
    match args {
        [Value::Str(a), Value::Str(b)] => Ok((a, b)),
        _ => Err(Error::type_mismatch(&format!("strings.{entrypoint}"), "expected two string arguments")),
    }
}
