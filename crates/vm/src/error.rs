//! Errors and diagnostics for the blockflow VM.
//!
//! The engine itself never fails once a program is running: unknown
//! syscalls are skipped and malformed control flow halts only the thread
//! that hit it. What remains are plugin lifecycle failures, and compile
//! diagnostics the caller may want to surface.

use thiserror::Error;

/// Errors raised by plugin or block lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An `on_initialize` hook failed.
    #[error("initialization of '{owner}' failed: {message}")]
    Initialize { owner: String, message: String },

    /// An `on_cleanup` hook failed.
    #[error("cleanup of '{owner}' failed: {message}")]
    Cleanup { owner: String, message: String },
}

/// Non-fatal problems found while lowering a program graph.
///
/// Compilation always produces a program; these report where it had to
/// degrade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileWarning {
    /// No compile hook and no built-in lowering for this block type.
    /// The node emits nothing and its chain continues to the successor.
    #[error("unknown block type '{block_type}' at node '{node}'; node skipped")]
    UnknownBlockType { node: String, block_type: String },

    /// A chain re-entered a node that is already being lowered. The chain
    /// is cut here and falls through to its exit.
    #[error("chain re-enters node '{node}'; cycle cut")]
    CyclicChain { node: String },
}
