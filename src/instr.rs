//! Opcode set and instruction encoding.
//!
//! Each instruction is a `(opcode, arg, arg2)` triple rather than a packed
//! byte stream with fetch macros — a flat `Vec<Instruction>` is simpler and
//! sufficient at this crate's scale, and keeps `Instruction` itself
//! trivially `Display`-able for tracing and error messages.

use std::fmt;

use strum::{Display, EnumCount, EnumString};

use crate::value::Value;

/// The closed opcode set, grouped by purpose.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumCount)]
pub enum Opcode {
    // Stack
    Nop,
    LoadConst,
    Pop,
    Swap,
    Rotate3,
    // Variables
    LoadName,
    StoreName,
    CreateVar,
    // Control
    Jump,
    JumpIfFalse,
    Return,
    // Arithmetic
    BinaryOp,
    UnaryOp,
    // Aggregates
    NewStruct,
    NewSlice,
    GetField,
    SetField,
    SetStructField,
    GetIndex,
    SetIndex,
    Len,
    GetElement,
    // Calls
    Call,
    CallMethod,
    RegistFunction,
    // Modules
    Import,
    // Scopes
    EnterScope,
    ExitScope,
    // Loop control
    Break,
}

/// Total number of opcodes, used to size the dispatch table (`vm::dispatch`).
pub const OPCODE_COUNT: usize = Opcode::COUNT;

/// Binary operator selector for `BINARY_OP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum BinaryOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Unary operator selector for `UNARY_OP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum UnaryOpKind {
    Neg,
    Not,
}

/// A tagged operand value.
#[derive(Debug, Clone)]
pub enum Operand {
    None,
    Int(i64),
    Str(String),
    Value(Value),
}

impl Operand {
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

/// A single instruction: `(opcode, arg, arg2)`. Immutable once emitted.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: Opcode,
    pub arg: Operand,
    pub arg2: Operand,
}

impl Instruction {
    #[must_use]
    pub fn new(opcode: Opcode, arg: Operand, arg2: Operand) -> Self {
        Self { opcode, arg, arg2 }
    }

    #[must_use]
    pub fn with_arg(opcode: Opcode, arg: Operand) -> Self {
        Self::new(opcode, arg, Operand::None)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<14} {} {}", self.opcode.to_string(), self.arg, self.arg2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_display_is_human_readable() {
        let instr = Instruction::with_arg(Opcode::LoadConst, Operand::Value(Value::Int(3)));
        let text = instr.to_string();
        assert!(text.contains("LoadConst"));
        assert!(text.contains('3'));
    }
}
