//! Per-function lowering state, shared with registry compile hooks.

use std::collections::HashSet;

use blockflow_common::{BasicBlock, BlockGraph, BlockNode, Instruction, Label, NodeId, Operand};
use indexmap::IndexMap;
use tracing::{debug, warn};

use super::allocator::BlockAllocator;
use crate::error::CompileWarning;
use crate::registry::Registry;

/// Default variable name for `set_var`/`change_var` without a `varName` input.
const DEFAULT_VAR_NAME: &str = "myVar";

/// Everything needed to lower chains of one function.
///
/// Compile hooks receive a `&mut CompileCtx` and use it to allocate blocks,
/// emit instructions, look up nodes and lower nested chains.
pub struct CompileCtx<'a> {
    registry: &'a Registry,
    graph: &'a BlockGraph,
    allocator: BlockAllocator,
    blocks: IndexMap<Label, BasicBlock>,
    in_progress: HashSet<NodeId>,
    warnings: Vec<CompileWarning>,
}

impl<'a> CompileCtx<'a> {
    pub(crate) fn new(registry: &'a Registry, graph: &'a BlockGraph) -> Self {
        Self {
            registry,
            graph,
            allocator: BlockAllocator::new(),
            blocks: IndexMap::new(),
            in_progress: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Allocate a fresh, empty block and return its label.
    pub fn new_block(&mut self, prefix: &str) -> Label {
        let label = self.allocator.allocate(prefix);
        self.blocks
            .insert(label.clone(), BasicBlock::new(label.clone()));
        label
    }

    /// Append an instruction to the block labelled `label`.
    pub fn emit(&mut self, label: &Label, instr: Instruction) {
        self.blocks
            .entry(label.clone())
            .or_insert_with(|| BasicBlock::new(label.clone()))
            .instructions
            .push(instr);
    }

    pub fn graph(&self) -> &'a BlockGraph {
        self.graph
    }

    pub fn node(&self, id: &str) -> Option<&'a BlockNode> {
        self.graph.get(id)
    }

    /// Lower the chain starting at `start` so that it exits to `exit`.
    ///
    /// Returns the label of the chain's first block, or `exit` itself when
    /// the chain is empty. A missing start id is an empty chain.
    pub fn compile_chain(&mut self, start: Option<&str>, exit: Label) -> Label {
        let graph = self.graph;
        let mut chain: Vec<&'a BlockNode> = Vec::new();
        let mut cursor = start;
        while let Some(id) = cursor {
            let Some(node) = graph.get(id) else {
                debug!(node = id, "link to missing node; chain ends");
                break;
            };
            if !self.in_progress.insert(node.id.clone()) {
                warn!(node = id, "chain re-enters node; cycle cut");
                self.warnings
                    .push(CompileWarning::CyclicChain { node: id.to_string() });
                break;
            }
            chain.push(node);
            cursor = node.next.as_deref();
        }

        let mut label = exit;
        for node in chain.iter().rev() {
            label = self.lower_node(node, label);
        }
        for node in &chain {
            self.in_progress.remove(&node.id);
        }
        label
    }

    /// Lower one node whose successor starts at `next`.
    fn lower_node(&mut self, node: &'a BlockNode, next: Label) -> Label {
        let registry = self.registry;
        if let Some(hook) = registry.block(&node.block_type).and_then(|b| b.compile_hook()) {
            return hook(node, next, self);
        }

        let effect = match node.block_type.as_str() {
            "set_var" => Instruction::assign(
                var_name(node),
                Operand::from_input(node.value_input("value", 1)),
            ),
            "change_var" => Instruction::add(
                var_name(node),
                Operand::from_input(node.value_input("amount", 1)),
            ),
            other => {
                warn!(node = %node.id, block_type = other, "unknown block type; node skipped");
                self.warnings.push(CompileWarning::UnknownBlockType {
                    node: node.id.clone(),
                    block_type: other.to_string(),
                });
                return next;
            }
        };

        let label = self.new_block(&format!("block_{}_{}", node.block_type, node.id));
        self.emit(&label, effect.from_node(node.id.clone()));
        self.emit(&label, Instruction::jump(next));
        label
    }

    pub(crate) fn finish(self) -> (IndexMap<Label, BasicBlock>, Vec<CompileWarning>) {
        (self.blocks, self.warnings)
    }
}

fn var_name(node: &BlockNode) -> String {
    node.input("varName")
        .map(|v| v.to_string())
        .unwrap_or_else(|| DEFAULT_VAR_NAME.to_string())
}
