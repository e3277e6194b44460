//! Typed error surface returned to the host across the entire execution pipeline.
//!
//! A manual `Display`/`std::error::Error` implementation rather than pulling
//! in `thiserror`: the kind discriminant gets a `strum::Display`/`EnumString`
//! derive and the outer `Error` carries whatever positional detail each kind
//! needs.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Discriminant for every error kind in the taxonomy.
///
/// Kept separate from [`Error`] so hosts can match on `error.kind()` without
/// destructuring the detail payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ErrorKind {
    StackUnderflow,
    StackOverflow,
    TypeMismatch,
    UndefinedVariable,
    UndefinedFunction,
    UndefinedMethod,
    UnsupportedModule,
    InvalidJumpTarget,
    DivisionByZero,
    ModuloByZero,
    InstructionLimitExceeded,
    ParseFailure,
    CompileFailure,
    ModuleFunctionFailure,
    /// Slice index outside `0..len`. Treated as a real error rather than a
    /// silent `nil`, so out-of-bounds access fails loudly instead of
    /// producing a value that quietly propagates.
    IndexOutOfRange,
    /// The host-supplied cancellation hook returned `true`.
    Cancelled,
}

/// A single error produced anywhere in the compile/execute pipeline.
///
/// `message` carries the human-readable detail (instruction pointer, variable
/// name, operand kind, …); `kind()` is what hosts should match on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn stack_underflow(op: &str) -> Self {
        Self::new(ErrorKind::StackUnderflow, format!("stack underflow executing {op}"))
    }

    pub(crate) fn stack_overflow(limit: usize) -> Self {
        Self::new(ErrorKind::StackOverflow, format!("operand stack exceeded limit of {limit}"))
    }

    pub(crate) fn type_mismatch(context: &str, found: &str) -> Self {
        Self::new(ErrorKind::TypeMismatch, format!("{context}: unexpected operand type {found}"))
    }

    pub(crate) fn arity_mismatch(name: &str, expected: usize, got: usize) -> Self {
        Self::new(ErrorKind::TypeMismatch, format!("{name}: expected {expected} argument(s), got {got}"))
    }

    pub(crate) fn undefined_variable(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedVariable, format!("undefined variable {name}"))
    }

    pub(crate) fn undefined_function(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedFunction, format!("undefined function {name}"))
    }

    pub(crate) fn undefined_method(receiver_type: &str, method: &str) -> Self {
        Self::new(ErrorKind::UndefinedMethod, format!("undefined method {method} on type {receiver_type}"))
    }

    pub(crate) fn unsupported_module(name: &str) -> Self {
        Self::new(ErrorKind::UnsupportedModule, format!("unsupported module {name}"))
    }

    pub(crate) fn invalid_jump_target(pc: usize, target: i64) -> Self {
        Self::new(ErrorKind::InvalidJumpTarget, format!("invalid jump target {target} from pc {pc}"))
    }

    pub(crate) fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero".to_string())
    }

    pub(crate) fn modulo_by_zero() -> Self {
        Self::new(ErrorKind::ModuloByZero, "modulo by zero".to_string())
    }

    pub(crate) fn instruction_limit_exceeded(cap: usize) -> Self {
        Self::new(ErrorKind::InstructionLimitExceeded, format!("instruction budget of {cap} exceeded"))
    }

    pub(crate) fn index_out_of_range(index: i64, len: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfRange, format!("index {index} out of range for length {len}"))
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "execution cancelled by host".to_string())
    }

    pub(crate) fn module_function_failure(module: &str, entrypoint: &str, cause: &Error) -> Self {
        Self::new(
            ErrorKind::ModuleFunctionFailure,
            format!("module {module}.{entrypoint} failed: {cause}"),
        )
    }

    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailure, message.into())
    }

    pub fn compile_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompileFailure, message.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
