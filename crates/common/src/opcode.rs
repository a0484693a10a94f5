//! Opcode definitions for the blockflow IR.
//!
//! The instruction set is deliberately tiny: three memory effects, two
//! control transfers, one bridge to the outside world, and a voluntary
//! yield. Anything richer is a syscall.

use std::fmt;

/// Identifies the operation an instruction performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Bind a name in the innermost scope.
    Declare,
    /// Mutate the nearest binding, or create one in the innermost scope.
    Assign,
    /// Add an amount to a variable (unbound reads as 0).
    Add,
    /// Unconditional transfer to a label.
    Jump,
    /// Compare a variable against a value and transfer to one of two labels.
    Branch,
    /// Invoke a registry-resolved handler.
    Syscall,
    /// End the current slice early.
    Yield,
}

/// All opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 7] = [
    Opcode::Declare,
    Opcode::Assign,
    Opcode::Add,
    Opcode::Jump,
    Opcode::Branch,
    Opcode::Syscall,
    Opcode::Yield,
];

impl Opcode {
    /// Returns the listing mnemonic for this opcode.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Declare => "declare",
            Opcode::Assign => "assign",
            Opcode::Add => "add",
            Opcode::Jump => "jump",
            Opcode::Branch => "compare_jump",
            Opcode::Syscall => "syscall",
            Opcode::Yield => "yield",
        }
    }

    /// Returns true if this opcode ends a basic block.
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::Branch)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Comparison used by [`Opcode::Branch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `==`
    Eq,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// The operator as written in listings.
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
