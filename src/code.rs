//! Instruction sets, qualified names, and the `ScriptFunction` descriptor.

use crate::{ast::ReceiverKind, instr::Instruction};

/// An ordered sequence of instructions keyed by a qualified name.
#[derive(Debug, Clone, Default)]
pub struct InstructionSet {
    pub instructions: Vec<Instruction>,
}

impl InstructionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Whether a compiled function takes a receiver, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverMode {
    #[default]
    None,
    Value,
    Pointer,
}

impl From<ReceiverKind> for ReceiverMode {
    fn from(kind: ReceiverKind) -> Self {
        match kind {
            ReceiverKind::Value => Self::Value,
            ReceiverKind::Pointer => Self::Pointer,
        }
    }
}

/// Metadata kept alongside an instruction set.
#[derive(Debug, Clone, Default)]
pub struct ScriptFunction {
    pub param_names: Vec<String>,
    pub receiver_kind: ReceiverMode,
}

impl ScriptFunction {
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_names.len()
    }

    /// Parameter name at `index`, falling back to `arg0`, `arg1`, … when names
    /// are unknown.
    #[must_use]
    pub fn param_name_or_fallback(&self, index: usize) -> String {
        self.param_names.get(index).cloned().unwrap_or_else(|| format!("arg{index}"))
    }
}

/// Builds the qualified name for a top-level function: `"<pkg>.<func>"`.
#[must_use]
pub fn qualify_func(pkg: &str, func: &str) -> String {
    format!("{pkg}.{func}")
}

/// Builds the qualified name for a package initializer: `"<pkg>.init"`.
#[must_use]
pub fn qualify_init(pkg: &str) -> String {
    format!("{pkg}.init")
}

/// Builds the qualified name for a method: `"<TypeName>.<Method>"` or
/// `"*<TypeName>.<Method>"` depending on receiver kind.
#[must_use]
pub fn qualify_method(type_name: &str, method: &str, kind: ReceiverKind) -> String {
    match kind {
        ReceiverKind::Value => format!("{type_name}.{method}"),
        ReceiverKind::Pointer => format!("*{type_name}.{method}"),
    }
}

/// Default entry point name.
pub const DEFAULT_ENTRY_POINT: &str = "main.main";

/// Whether `key` is a package initializer of the shape `"<pkg>.init"`.
#[must_use]
pub fn is_package_init(key: &str) -> bool {
    key.ends_with(".init")
}

/// Whether `key` ends in `".main"`.
#[must_use]
pub fn is_main_candidate(key: &str) -> bool {
    key.ends_with(".main")
}
