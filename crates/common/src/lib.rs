//! blockflow common types.
//!
//! This crate provides the data shared by every stage of the engine:
//!
//! - [`BlockGraph`] / [`BlockNode`]: the program graph produced by the editor
//! - [`Value`]: scalar values for block inputs and thread variables
//! - [`Opcode`] / [`CompareOp`]: the fixed IR instruction set
//! - [`Instruction`], [`Op`], [`Operand`], [`Label`]: IR instructions
//! - [`IrProgram`], [`IrFunction`], [`BasicBlock`]: compiled programs
//! - [`GraphError`]: errors from reading graph documents

pub mod error;
pub mod graph;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::GraphError;
pub use graph::{BlockGraph, BlockNode};
pub use instruction::{Instruction, Label, NodeId, Op, Operand};
pub use opcode::{CompareOp, Opcode};
pub use program::{BasicBlock, IrFunction, IrProgram};
pub use value::Value;
