//! Program graph to IR lowering.
//!
//! Each start node becomes one [`IrFunction`] named `thread_<id>`. Chains
//! are lowered continuation-first: the rest of a chain is lowered before
//! the node that precedes it, so every node's blocks can jump straight to
//! an already-known successor label.
//!
//! Lowering never fails. Unknown block types and cyclic chains degrade to
//! "no instructions for this node" and are reported as [`CompileWarning`]s.

mod allocator;
mod context;
pub mod loops;

pub use context::CompileCtx;

use blockflow_common::{BlockGraph, BlockNode, IrFunction, IrProgram};
use tracing::{debug, warn};

use crate::error::CompileWarning;
use crate::registry::Registry;

/// Output of [`Compiler::compile_with_warnings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compilation {
    pub program: IrProgram,
    pub warnings: Vec<CompileWarning>,
}

/// Lowers program graphs using the hooks in a [`Registry`].
pub struct Compiler<'r> {
    registry: &'r Registry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// IR function name for the thread started by node `start_id`.
    pub fn function_name(start_id: &str) -> String {
        format!("thread_{start_id}")
    }

    /// Compile one function per start node. Warnings are logged.
    pub fn compile(&self, start_nodes: &[&BlockNode], graph: &BlockGraph) -> IrProgram {
        let Compilation { program, warnings } = self.compile_with_warnings(start_nodes, graph);
        for warning in &warnings {
            warn!(%warning, "compile warning");
        }
        program
    }

    /// Compile one function per start node, returning diagnostics alongside.
    pub fn compile_with_warnings(&self, start_nodes: &[&BlockNode], graph: &BlockGraph) -> Compilation {
        let mut program = IrProgram::new();
        let mut warnings = Vec::new();
        for start in start_nodes {
            let (function, mut thread_warnings) = self.compile_thread(start, graph);
            debug!(
                function = %function.name,
                blocks = function.blocks.len(),
                instructions = function.instruction_count(),
                "compiled thread"
            );
            program.insert_function(function);
            warnings.append(&mut thread_warnings);
        }
        Compilation { program, warnings }
    }

    fn compile_thread(&self, start: &BlockNode, graph: &BlockGraph) -> (IrFunction, Vec<CompileWarning>) {
        let mut ctx = CompileCtx::new(self.registry, graph);
        let thread_end = ctx.new_block("thread_end");
        let entry = ctx.compile_chain(Some(start.id.as_str()), thread_end);
        let (blocks, warnings) = ctx.finish();

        let mut function = IrFunction::new(Self::function_name(&start.id), entry);
        function.blocks = blocks;
        (function, warnings)
    }
}
