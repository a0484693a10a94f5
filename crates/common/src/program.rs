//! IR program representation: programs, functions, basic blocks.
//!
//! An [`IrProgram`] is immutable once compiled and is shared read-only by
//! every thread instantiated from it. Maps preserve insertion order, so a
//! listing shows blocks in the order the compiler allocated them.

use std::fmt;

use indexmap::IndexMap;

use crate::instruction::{Instruction, Label};

/// A straight-line instruction sequence with one entry and one exit.
///
/// Every block except a function's thread-end block finishes with a jump
/// or branch. Running off the end of a block halts the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub label: Label,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    /// Create an empty block.
    pub fn new(label: Label) -> Self {
        Self {
            label,
            instructions: Vec::new(),
        }
    }

    /// The final instruction, if it transfers control.
    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// One compiled thread template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrFunction {
    pub name: String,
    /// Label of the block a fresh thread starts in.
    pub entry: Label,
    pub blocks: IndexMap<Label, BasicBlock>,
}

impl IrFunction {
    /// Create a function with no blocks yet.
    pub fn new(name: impl Into<String>, entry: Label) -> Self {
        Self {
            name: name.into(),
            entry,
            blocks: IndexMap::new(),
        }
    }

    /// Look up a block by label.
    pub fn block(&self, label: &str) -> Option<&BasicBlock> {
        self.blocks.get(label)
    }

    /// Insert a block, keyed by its own label.
    pub fn insert_block(&mut self, block: BasicBlock) {
        self.blocks.insert(block.label.clone(), block);
    }

    /// Blocks with no instructions. Falling into one halts the thread.
    pub fn halting_blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.blocks.values().filter(|b| b.is_empty())
    }

    /// Total instruction count across all blocks.
    pub fn instruction_count(&self) -> usize {
        self.blocks.values().map(BasicBlock::len).sum()
    }
}

/// A compiled program: one function per independent start node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrProgram {
    pub functions: IndexMap<String, IrFunction>,
}

impl IrProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.get(name)
    }

    /// Insert a function, keyed by its own name.
    pub fn insert_function(&mut self, function: IrFunction) {
        self.functions.insert(function.name.clone(), function);
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {} (entry {}):", self.name, self.entry)?;
        for block in self.blocks.values() {
            writeln!(f, "  {}:", block.label)?;
            for instr in &block.instructions {
                writeln!(f, "    {instr}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for IrProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, function) in self.functions.values().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
