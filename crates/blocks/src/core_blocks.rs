//! Control-flow and variable blocks.

use blockflow_common::{BlockNode, Instruction, Label, Operand};
use blockflow_vm::compiler::loops;
use blockflow_vm::{BlockDefinition, CompileCtx, Plugin};

/// Iterations of a `repeat` block without a usable `iterations` input.
pub const DEFAULT_REPEAT_ITERATIONS: f64 = 2.0;

/// `start`, `repeat`, `forever`, `set_var`, `change_var` and `box`.
///
/// `set_var` and `change_var` carry no compile hook: the compiler lowers
/// them itself. They are registered so the registry lists them.
pub fn core_plugin() -> Plugin {
    Plugin::new("core")
        .block(BlockDefinition::new("start").compile(pass_through))
        .block(BlockDefinition::new("repeat").compile(|node, exit, ctx| {
            loops::counted_loop(node, iterations(node), exit, ctx)
        }))
        .block(BlockDefinition::new("forever").compile(loops::forever_loop))
        .block(BlockDefinition::new("set_var"))
        .block(BlockDefinition::new("change_var"))
        .block(BlockDefinition::new("box").compile(pass_through))
}

/// One block that only jumps on, tagged with the node so it can be
/// highlighted and breakpointed.
fn pass_through(node: &BlockNode, exit: Label, ctx: &mut CompileCtx<'_>) -> Label {
    let label = ctx.new_block(&format!("block_{}_{}", node.block_type, node.id));
    ctx.emit(&label, Instruction::jump(exit).from_node(node.id.clone()));
    label
}

/// Loop bound: a `$variable`, a numeric literal, or the default.
fn iterations(node: &BlockNode) -> Operand {
    match node.input("iterations").cloned().map(Operand::from_input) {
        Some(var @ Operand::Var(_)) => var,
        _ => Operand::from(node.number_input("iterations", DEFAULT_REPEAT_ITERATIONS)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterations_fall_back_to_default() {
        let node = BlockNode::new("r", "repeat");
        assert_eq!(iterations(&node), Operand::from(2));
        let node = BlockNode::new("r", "repeat").with_input("iterations", "many");
        assert_eq!(iterations(&node), Operand::from(2));
        let node = BlockNode::new("r", "repeat").with_input("iterations", true);
        assert_eq!(iterations(&node), Operand::from(2));
        let node = BlockNode::new("r", "repeat").with_input("iterations", "inf");
        assert_eq!(iterations(&node), Operand::from(DEFAULT_REPEAT_ITERATIONS));
    }

    #[test]
    fn iterations_accept_numbers_text_numbers_and_variables() {
        let node = BlockNode::new("r", "repeat").with_input("iterations", 0);
        assert_eq!(iterations(&node), Operand::from(0));
        let node = BlockNode::new("r", "repeat").with_input("iterations", "3");
        assert_eq!(iterations(&node), Operand::from(3));
        let node = BlockNode::new("r", "repeat").with_input("iterations", "$n");
        assert_eq!(iterations(&node), Operand::var("n"));
    }
}
