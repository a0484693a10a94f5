//! Verification errors for compiled IR.
//!
//! Every error names the function it was found in and, where it applies,
//! the block label and instruction index. The verifier collects all errors,
//! not just the first.

use thiserror::Error;

/// Violations of the basic-block invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// A program map key disagrees with the function's own name.
    #[error("function stored under '{key}' is named '{name}'")]
    FunctionNameMismatch { key: String, name: String },

    /// The entry label names no block of the function.
    #[error("function '{function}': entry block '{entry}' does not exist")]
    MissingEntry { function: String, entry: String },

    /// A block map key disagrees with the block's own label.
    #[error("function '{function}': block stored under '{key}' is labelled '{label}'")]
    BlockLabelMismatch {
        function: String,
        key: String,
        label: String,
    },

    /// A non-empty block does not end in a jump or compare_jump.
    #[error("function '{function}': block '{label}' does not end in a jump or compare_jump")]
    MissingTerminator { function: String, label: String },

    /// A jump or compare_jump appears before the end of its block.
    #[error("function '{function}': block '{label}' has an instruction after its terminator at {at}")]
    InstructionAfterTerminator {
        function: String,
        label: String,
        at: usize,
    },

    /// A control transfer names a label outside the function.
    #[error("function '{function}': block '{label}' instruction {at} targets unknown block '{target}'")]
    UnknownTarget {
        function: String,
        label: String,
        at: usize,
        target: String,
    },

    /// The function has no empty thread-end block to halt in.
    #[error("function '{function}' has no empty thread-end block")]
    MissingThreadEnd { function: String },
}
