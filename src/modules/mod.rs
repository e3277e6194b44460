//! Built-in module catalogue.
//!
//! The built-in module library proper is out of scope for this crate: a
//! host registers whatever native functions and modules its embedding
//! needs via `Script::register_module`. The two modules below exist so the
//! module-executor contract — and the `CALL_METHOD` dispatch path that
//! resolves a selector call against a module sentinel rather than a struct
//! receiver — has something real to exercise end to end.

mod json_mod;
mod strings_mod;

use crate::registry::FunctionRegistry;

/// Registers the small built-in catalogue this crate ships with.
pub fn register_builtins(registry: &mut FunctionRegistry) {
    registry.register_module("strings", strings_mod::executor());
    registry.register_module("json", json_mod::executor());
}
