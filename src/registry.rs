//! Function and module registry.
//!
//! Collapses native-function and module lookup into one registry, since
//! there are no heap-interned function ids here — qualified names are the
//! key directly.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::{
    code::{InstructionSet, ScriptFunction},
    errors::Error,
    value::Value,
};

/// A native callable registered by the host.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// A module executor: dispatches on an entrypoint name.
pub type ModuleExecutor = Arc<dyn Fn(&str, &[Value]) -> Result<Value, Error> + Send + Sync>;

/// Two tables — native functions and module executors — plus the
/// script-defined instruction sets compiled from source.
#[derive(Default)]
pub struct FunctionRegistry {
    native: AHashMap<String, NativeFn>,
    instruction_sets: AHashMap<String, (InstructionSet, ScriptFunction)>,
    /// Modules known to the host (registered directly, or present in the
    /// built-in catalogue) but not yet bound into any running script.
    modules: AHashMap<String, ModuleExecutor>,
    /// Modules a script has actually `IMPORT`ed.
    active_modules: AHashSet<String>,
    /// Declared field lists for `type T struct{...}`, used by `NEW_STRUCT`
    /// to seed every field with `nil` before the composite literal's
    /// explicit values overwrite the ones it actually provides.
    struct_fields: AHashMap<String, Vec<String>>,
}

impl FunctionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a native callable. Idempotent on overwrite.
    pub fn register_native(&mut self, name: impl Into<String>, f: NativeFn) {
        self.native.insert(name.into(), f);
    }

    /// Registers a module executor under `name`. Idempotent on overwrite.
    pub fn register_module(&mut self, name: impl Into<String>, executor: ModuleExecutor) {
        self.modules.insert(name.into(), executor);
    }

    /// Stores a compiled instruction set under its qualified name.
    pub fn register_instruction_set(&mut self, key: impl Into<String>, set: InstructionSet, descriptor: ScriptFunction) {
        self.instruction_sets.insert(key.into(), (set, descriptor));
    }

    #[must_use]
    pub fn instruction_set(&self, key: &str) -> Option<&(InstructionSet, ScriptFunction)> {
        self.instruction_sets.get(key)
    }

    #[must_use]
    pub fn has_instruction_set(&self, key: &str) -> bool {
        self.instruction_sets.contains_key(key)
    }

    /// Every qualified name a compiled instruction set is stored under.
    pub fn instruction_set_keys(&self) -> impl Iterator<Item = &String> {
        self.instruction_sets.keys()
    }

    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleExecutor> {
        self.modules.get(name)
    }

    #[must_use]
    pub fn is_module_registered(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Marks `name` as bound into the running script (called by `IMPORT`).
    pub fn activate_module(&mut self, name: &str) {
        self.active_modules.insert(name.to_string());
    }

    #[must_use]
    pub fn is_module_active(&self, name: &str) -> bool {
        self.active_modules.contains(name)
    }

    /// Every module a script has actually `IMPORT`ed so far, sorted.
    pub fn active_modules(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active_modules.iter().cloned().collect();
        names.sort();
        names
    }

    /// Looks up a direct native entry, or synthesizes a module-qualified
    /// wrapper for `"m.f"` when `m` names a registered module.
    #[must_use]
    pub fn resolve_native(&self, name: &str) -> Option<ResolvedCall> {
        if let Some(f) = self.native.get(name) {
            return Some(ResolvedCall::Native(Arc::clone(f)));
        }
        if let Some((module, entrypoint)) = name.split_once('.') {
            if let Some(executor) = self.modules.get(module) {
                return Some(ResolvedCall::Module {
                    module: module.to_string(),
                    executor: Arc::clone(executor),
                    entrypoint: entrypoint.to_string(),
                });
            }
        }
        None
    }

    /// Records the declared field order for a struct type, keyed by name.
    pub fn register_struct_fields(&mut self, name: impl Into<String>, fields: Vec<String>) {
        self.struct_fields.insert(name.into(), fields);
    }

    /// Declared field order for `type_name`, if it was ever declared.
    #[must_use]
    pub fn struct_fields(&self, type_name: &str) -> Option<&[String]> {
        self.struct_fields.get(type_name).map(Vec::as_slice)
    }

    /// Lists every directly registered native and module name.
    #[must_use]
    pub fn list_all(&self) -> Vec<String> {
        let mut names: Vec<String> = self.native.keys().cloned().collect();
        names.extend(self.modules.keys().cloned());
        names.sort();
        names
    }
}

/// The result of resolving a callable name against the registry.
pub enum ResolvedCall {
    Native(NativeFn),
    Module { module: String, executor: ModuleExecutor, entrypoint: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_name_synthesizes_module_wrapper() {
        let mut registry = FunctionRegistry::new();
        registry.register_module(
            "strings",
            Arc::new(|entrypoint, args| match entrypoint {
                "Upper" => Ok(Value::str(args[0].to_string().to_uppercase())),
                other => Err(Error::unsupported_module(other)),
            }),
        );
        match registry.resolve_native("strings.Upper") {
            Some(ResolvedCall::Module { module, executor, entrypoint }) => {
                assert_eq!(module, "strings");
                assert_eq!(entrypoint, "Upper");
                let result = executor(&entrypoint, &[Value::str("hi")]).unwrap();
                assert_eq!(result.to_string(), "HI");
            }
            _ => panic!("expected module resolution"),
        }
    }

    #[test]
    fn native_overwrite_is_idempotent() {
        let mut registry = FunctionRegistry::new();
        registry.register_native("f", Arc::new(|_| Ok(Value::Int(1))));
        registry.register_native("f", Arc::new(|_| Ok(Value::Int(2))));
        match registry.resolve_native("f") {
            Some(ResolvedCall::Native(f)) => assert_eq!(f(&[]).unwrap().to_string(), "2"),
            _ => panic!("expected native resolution"),
        }
    }
}
