//! Instruction budget and wall-clock limits.
//!
//! There is no heap to account for here — only the instruction budget and
//! an optional deadline/cancel hook matter — so the tracked limits stay to
//! just those two concerns, exposed through a builder-style `ResourceLimits`.

use std::time::{Duration, Instant};

use crate::errors::Error;

/// Default instruction budget applied by `Script::new`.
pub const DEFAULT_MAX_INSTRUCTIONS: usize = 10_000;

/// Default operand stack ceiling.
pub const DEFAULT_MAX_STACK: usize = 10_000;

/// How often (in dispatched instructions) the VM polls the cancellation hook
/// and the wall-clock deadline, if either is configured.
///
/// Polling every instruction would make cancellation checks dominate dispatch
/// cost; this VM has no statement-level granularity, so an instruction-count
/// boundary is the natural substitute.
pub const CANCEL_POLL_INTERVAL: u64 = 256;

/// Configuration for the limits a `Script` execution enforces.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum number of instructions a single `Execute` may dispatch. `0` disables the check.
    pub max_instructions: usize,
    /// Maximum operand stack depth.
    pub max_stack: usize,
    /// Optional wall-clock deadline for a single execution.
    pub max_duration: Option<Duration>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            max_stack: DEFAULT_MAX_STACK,
            max_duration: None,
        }
    }
}

impl ResourceLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn max_instructions(mut self, limit: usize) -> Self {
        self.max_instructions = limit;
        self
    }

    #[must_use]
    pub fn max_stack(mut self, limit: usize) -> Self {
        self.max_stack = limit;
        self
    }

    #[must_use]
    pub fn max_duration(mut self, limit: Duration) -> Self {
        self.max_duration = Some(limit);
        self
    }
}

/// Tracks budget consumption for a single `Execute` call.
///
/// Created fresh at the start of every `VM::run`; the instruction counter and
/// start time do not persist across top-level executions.
#[derive(Debug)]
pub struct BudgetTracker {
    limits: ResourceLimits,
    start: Instant,
    instructions_executed: u64,
    deadline: Option<Instant>,
}

impl BudgetTracker {
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        let start = Instant::now();
        let deadline = limits.max_duration.map(|d| start + d);
        Self { limits, start, instructions_executed: 0, deadline }
    }

    /// Called once per dispatched instruction, before the handler runs.
    ///
    /// Returns `Err` without executing the current instruction if the budget
    /// cap has been reached.
    pub fn on_instruction(&mut self) -> Result<(), Error> {
        if self.limits.max_instructions != 0 && self.instructions_executed >= self.limits.max_instructions as u64 {
            return Err(Error::instruction_limit_exceeded(self.limits.max_instructions));
        }
        self.instructions_executed += 1;
        Ok(())
    }

    /// Polls the wall-clock deadline. Cheap enough to call every instruction,
    /// but the VM only calls it every [`CANCEL_POLL_INTERVAL`] instructions.
    pub fn check_deadline(&self) -> Result<(), Error> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::cancelled());
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn instructions_executed(&self) -> u64 {
        self.instructions_executed
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[must_use]
    pub fn max_stack(&self) -> usize {
        self.limits.max_stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_budget_never_trips() {
        let mut tracker = BudgetTracker::new(ResourceLimits::new().max_instructions(0));
        for _ in 0..100_000 {
            tracker.on_instruction().unwrap();
        }
    }

    #[test]
    fn budget_trips_at_cap() {
        let mut tracker = BudgetTracker::new(ResourceLimits::new().max_instructions(5));
        for _ in 0..5 {
            tracker.on_instruction().unwrap();
        }
        assert!(tracker.on_instruction().is_err());
    }
}
