//! Compile-time type table.

use ahash::AHashMap;

/// Field lists recorded from `type T struct{...}` declarations.
///
/// Consumed by the VM (via `FunctionRegistry::struct_fields`) so `NEW_STRUCT`
/// can seed every declared field with `nil` before composite-literal values
/// overwrite the ones actually provided.
#[derive(Debug, Default)]
pub struct TypeTable {
    struct_fields: AHashMap<String, Vec<String>>,
}

impl TypeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_struct(&mut self, name: impl Into<String>, fields: Vec<String>) {
        self.struct_fields.insert(name.into(), fields);
    }

    pub fn into_fields_map(self) -> AHashMap<String, Vec<String>> {
        self.struct_fields
    }
}
