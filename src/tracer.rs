//! Opt-in execution tracing, toggled via `Script::set_debug`.
//!
//! A trait the VM calls on every dispatched instruction, with a zero-cost
//! default implementation and a couple of concrete loggers a host can opt
//! into instead of wiring up a full logging crate.

use crate::{context::ContextRef, instr::Instruction};

/// Observes VM execution one instruction at a time.
pub trait VmTracer {
    /// Called immediately before `instr` is dispatched at program counter `pc`.
    fn on_instruction(&mut self, pc: usize, instr: &Instruction, ctx: &ContextRef) {
        let _ = (pc, instr, ctx);
    }

    /// Called when a new instruction set begins executing under `qualified_name`.
    fn on_enter_function(&mut self, qualified_name: &str) {
        let _ = qualified_name;
    }

    /// Called when an instruction set returns.
    fn on_return(&mut self, qualified_name: &str) {
        let _ = qualified_name;
    }
}

/// The default tracer: does nothing, compiles away.
#[derive(Debug, Default)]
pub struct NoopTracer;

impl VmTracer for NoopTracer {}

/// Prints a line to stderr for every dispatched instruction.
///
/// Enabled via `Script::set_debug(true)`.
#[derive(Debug, Default)]
pub struct StderrTracer;

impl VmTracer for StderrTracer {
    fn on_instruction(&mut self, pc: usize, instr: &Instruction, ctx: &ContextRef) {
        eprintln!("[{:>4}] {:<28} @ {}", pc, instr.to_string(), ctx.borrow().path_key());
    }

    fn on_enter_function(&mut self, qualified_name: &str) {
        eprintln!("--> enter {qualified_name}");
    }

    fn on_return(&mut self, qualified_name: &str) {
        eprintln!("<-- return {qualified_name}");
    }
}

/// Records every dispatched instruction's opcode name for later inspection.
///
/// Useful in tests asserting which opcodes a given program actually exercises.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub opcodes: Vec<String>,
}

impl VmTracer for RecordingTracer {
    fn on_instruction(&mut self, _pc: usize, instr: &Instruction, _ctx: &ContextRef) {
        self.opcodes.push(instr.opcode.to_string());
    }
}
