//! Loop lowerings for compile hooks.
//!
//! A counted loop becomes three blocks:
//!
//! ```text
//! loop_init:      declare ctr, 0        ; jump loop_cond
//! loop_cond:      compare_jump ctr < N ? <body entry> : <exit>
//! loop_increment: add ctr, 1            ; jump loop_cond
//! ```
//!
//! The body chain exits into `loop_increment`. An empty body makes the body
//! entry equal to the increment label, so the loop still counts to N.

use blockflow_common::{BlockNode, CompareOp, Instruction, Label, Operand};

use super::context::CompileCtx;

/// Counter variable for the counted loop lowered from `node_id`.
///
/// Unique per node, so nested loops never share a counter.
pub fn counter_name(node_id: &str) -> String {
    format!("_loop_iter_{node_id}")
}

/// Lower `node` as a counted loop running `iterations` times, then exiting
/// to `exit`. Returns the label of the init block.
pub fn counted_loop(
    node: &BlockNode,
    iterations: Operand,
    exit: Label,
    ctx: &mut CompileCtx<'_>,
) -> Label {
    let id = node.id.as_str();
    let counter = counter_name(id);

    let init = ctx.new_block(&format!("loop_init_{id}"));
    let cond = ctx.new_block(&format!("loop_cond_{id}"));
    let increment = ctx.new_block(&format!("loop_increment_{id}"));

    ctx.emit(&increment, Instruction::add(&counter, 1).from_node(id));
    ctx.emit(&increment, Instruction::jump(cond.clone()));

    let body = ctx.compile_chain(node.body.as_deref(), increment.clone());

    ctx.emit(
        &cond,
        Instruction::branch(CompareOp::Lt, &counter, iterations, body, exit).from_node(id),
    );

    ctx.emit(&init, Instruction::declare(&counter, 0).from_node(id));
    ctx.emit(&init, Instruction::jump(cond).from_node(id));
    init
}

/// Lower `node` as an unconditional loop over its body.
///
/// Nothing after the loop is reachable; `exit` is accepted for symmetry with
/// other hooks and ignored.
pub fn forever_loop(node: &BlockNode, _exit: Label, ctx: &mut CompileCtx<'_>) -> Label {
    let header = ctx.new_block(&format!("forever_header_{}", node.id));
    let body = ctx.compile_chain(node.body.as_deref(), header.clone());
    ctx.emit(&header, Instruction::jump(body).from_node(node.id.clone()));
    header
}
