//! Slice-at-a-time execution of one thread.
//!
//! The interpreter is stateless apart from the active breakpoint set: all
//! thread state lives in the [`ExecutionContext`] passed to each call.

use std::collections::HashSet;

use blockflow_common::{Instruction, IrProgram, NodeId, Op, Value};
use tracing::{debug, trace, trace_span, warn};

use crate::memory::ExecutionContext;
use crate::registry::Registry;

/// Outcome of one slice.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStatus {
    /// Budget spent, or an explicit `yield`; the thread is still runnable.
    CompletedSlice,
    /// Suspend until the given absolute virtual time in milliseconds.
    YieldUntil(f64),
    /// Ran off the end of a block, or control reached a missing block.
    ThreadHalted,
    /// The next instruction belongs to a breakpointed node.
    HitBreakpoint(NodeId),
}

/// Executes IR for any thread of one program.
pub struct Interpreter<'a> {
    program: &'a IrProgram,
    registry: &'a Registry,
    breakpoints: HashSet<NodeId>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a IrProgram, registry: &'a Registry) -> Self {
        Self {
            program,
            registry,
            breakpoints: HashSet::new(),
        }
    }

    /// Replace the active breakpoint set.
    pub fn set_breakpoints(&mut self, breakpoints: HashSet<NodeId>) {
        self.breakpoints = breakpoints;
    }

    /// Run at most `max_instructions` instructions of `function` from the
    /// position saved in `ctx`.
    pub fn execute_slice(
        &self,
        thread_id: &str,
        function: &str,
        ctx: &mut ExecutionContext,
        max_instructions: usize,
        now_ms: f64,
    ) -> ExecutionStatus {
        let span = trace_span!("slice", thread = thread_id, function);
        let _enter = span.enter();

        let Some(func) = self.program.function(function) else {
            warn!(function, "no such function; thread halted");
            return ExecutionStatus::ThreadHalted;
        };

        for _ in 0..max_instructions {
            let Some(block) = func.block(ctx.current_block.as_str()) else {
                debug!(block = %ctx.current_block, "jump to missing block; thread halted");
                return ExecutionStatus::ThreadHalted;
            };
            let Some(instr) = block.instructions.get(ctx.ip) else {
                return ExecutionStatus::ThreadHalted;
            };

            if let Some(node) = &instr.source {
                if self.breakpoints.contains(node)
                    && ctx.last_breakpoint.as_deref() != Some(node.as_str())
                {
                    ctx.last_breakpoint = Some(node.clone());
                    return ExecutionStatus::HitBreakpoint(node.clone());
                }
                if ctx.last_breakpoint.as_deref() != Some(node.as_str()) {
                    ctx.last_breakpoint = None;
                }
            } else {
                ctx.last_breakpoint = None;
            }

            ctx.ip += 1;
            if let Some(node) = &instr.source {
                ctx.current_node = Some(node.clone());
            }

            if let Some(status) = self.dispatch(instr, ctx, now_ms) {
                return status;
            }
        }
        ExecutionStatus::CompletedSlice
    }

    /// Execute one instruction. `ctx.ip` already points past it.
    fn dispatch(&self, instr: &Instruction, ctx: &mut ExecutionContext, now_ms: f64) -> Option<ExecutionStatus> {
        trace!(%instr, "dispatch");
        match &instr.op {
            Op::Declare { name, value } => {
                let value = ctx.resolve(value);
                ctx.memory.declare(name, value);
            }
            Op::Assign { name, value } => {
                let value = ctx.resolve(value);
                ctx.memory.assign(name, value);
            }
            Op::Add { name, amount } => {
                let sum = ctx.memory.lookup(name).add(&ctx.resolve(amount));
                ctx.memory.assign(name, sum);
            }
            Op::Jump { target } => ctx.jump_to(target.clone()),
            Op::Branch {
                cmp,
                left,
                right,
                if_true,
                if_false,
            } => {
                let taken = ctx.memory.lookup(left).compare(*cmp, &ctx.resolve(right));
                ctx.jump_to(if taken { if_true.clone() } else { if_false.clone() });
            }
            Op::Syscall { name, args } => match self.registry.syscall(name) {
                Some(handler) => {
                    let args: Vec<Value> = args.iter().map(|a| ctx.resolve(a)).collect();
                    return handler(&args, ctx, now_ms);
                }
                None => warn!(syscall = %name, "unknown syscall; skipped"),
            },
            Op::Yield => return Some(ExecutionStatus::CompletedSlice),
        }
        None
    }
}
