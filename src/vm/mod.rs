//! The stack-based virtual machine.
//!
//! `Vm` owns everything a single `Execute` touches that doesn't outlive it:
//! the live context tree, the operand stack, and the instruction budget.
//! The instruction-set/native/module registry is the one piece of state
//! shared across runs, so it lives behind the `Arc<RwLock<_>>` a
//! `Script` hands in rather than inside `Vm` itself.

mod binary;
mod calls;
mod collections;
mod dispatch;
mod stack;

pub(crate) use dispatch::Flow;
pub use stack::OperandStack;

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::{
    code::qualify_init,
    context::ContextTree,
    errors::Error,
    instr::Instruction,
    registry::FunctionRegistry,
    resource::{BudgetTracker, ResourceLimits, CANCEL_POLL_INTERVAL},
    tracer::{NoopTracer, VmTracer},
    value::Value,
};

/// A host-supplied cancellation hook, polled every [`CANCEL_POLL_INTERVAL`]
/// dispatched instructions.
pub type CancelHook = Arc<dyn Fn() -> bool + Send + Sync>;

/// Single-threaded stack machine. One `Vm` instance serves one
/// `Execute` at a time: `Script` builds a fresh one per `run`/
/// `call_function`, seeded from the registry it owns across runs.
pub struct Vm {
    pub(crate) registry: Arc<RwLock<FunctionRegistry>>,
    pub(crate) contexts: ContextTree,
    pub(crate) stack: OperandStack,
    pub(crate) current_package: String,
    budget: BudgetTracker,
    tracer: Box<dyn VmTracer>,
    cancel: Option<CancelHook>,
    error_count: u64,
}

impl Vm {
    #[must_use]
    pub fn new(registry: Arc<RwLock<FunctionRegistry>>, package: impl Into<String>, limits: ResourceLimits) -> Self {
        let max_stack = limits.max_stack;
        Self {
            registry,
            contexts: ContextTree::new(),
            stack: OperandStack::new(max_stack),
            current_package: package.into(),
            budget: BudgetTracker::new(limits),
            tracer: Box::new(NoopTracer),
            cancel: None,
            error_count: 0,
        }
    }

    pub fn set_tracer(&mut self, tracer: Box<dyn VmTracer>) {
        self.tracer = tracer;
    }

    pub fn set_cancel_hook(&mut self, hook: CancelHook) {
        self.cancel = Some(hook);
    }

    #[must_use]
    pub fn contexts(&self) -> &ContextTree {
        &self.contexts
    }

    pub fn contexts_mut(&mut self) -> &mut ContextTree {
        &mut self.contexts
    }

    #[must_use]
    pub fn instructions_executed(&self) -> u64 {
        self.budget.instructions_executed()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.budget.elapsed()
    }

    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Runs `"<current_package>.init"` if the compiler emitted one, discarding
    /// its result.
    ///
    /// Unlike an ordinary call, this does *not* push a fresh child context:
    /// package-level `var` declarations and `import` bindings are meant to
    /// outlive the initializer and be visible from every function in the
    /// package, so they're created directly in whatever context is current
    /// when `execute` starts (the root context) rather than in a call frame
    /// that `invoke_script_key` would tear down the moment `init` returns.
    pub fn run_package_init(&mut self) -> Result<(), Error> {
        let key = qualify_init(&self.current_package);
        let instructions = {
            let registry = self.registry.read().expect("registry lock poisoned");
            registry.instruction_set(&key).map(|(set, _)| set.instructions.clone())
        };
        if let Some(instructions) = instructions {
            self.run_instructions(&instructions, &key)?;
        }
        Ok(())
    }

    /// Resolves and invokes `entry` as the program's entry point,
    /// running the package initializer first.
    pub fn execute(&mut self, entry: &str) -> Result<Value, Error> {
        let result = self.run_package_init().and_then(|()| self.invoke_script_key(entry, Vec::new()));
        if result.is_err() {
            self.error_count += 1;
        }
        result
    }

    /// Direct invocation without re-parsing: does
    /// *not* run the package initializer, matching "direct invocation"
    /// rather than a full program run.
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, Error> {
        let result = self.resolve_and_invoke(name, args);
        if result.is_err() {
            self.error_count += 1;
        }
        result
    }

    /// The dispatch loop: while `pc` is in range and the budget holds,
    /// dispatch the instruction at `pc` and advance. Intercepts the
    /// `Return` flow as the frame boundary rather than unwinding an error.
    pub(crate) fn run_instructions(&mut self, instructions: &[Instruction], qualified_name: &str) -> Result<Value, Error> {
        self.tracer.on_enter_function(qualified_name);
        let mut pc: usize = 0;
        let result = loop {
            if pc >= instructions.len() {
                break Ok(Value::Nil);
            }
            if let Err(e) = self.budget.on_instruction() {
                break Err(e);
            }
            if self.budget.instructions_executed() % CANCEL_POLL_INTERVAL == 0 {
                if let Err(e) = self.budget.check_deadline() {
                    break Err(e);
                }
                if let Some(hook) = &self.cancel {
                    if hook() {
                        break Err(Error::cancelled());
                    }
                }
            }
            let instr = &instructions[pc];
            self.tracer.on_instruction(pc, instr, &self.contexts.current());
            match self.dispatch(instr, pc) {
                Ok(Flow::Advance) => pc += 1,
                Ok(Flow::Jump(target)) => {
                    if target > instructions.len() {
                        break Err(Error::invalid_jump_target(pc, target as i64));
                    }
                    pc = target;
                }
                Ok(Flow::Return(value)) => break Ok(value),
                Err(e) => break Err(e),
            }
        };
        self.tracer.on_return(qualified_name);
        result
    }
}
