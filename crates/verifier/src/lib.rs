//! blockflow verifier: structural checks for compiled IR.
//!
//! The verifier checks an `IrProgram` before it is scheduled. It collects
//! ALL errors (not just the first) and returns them.
//!
//! # Usage
//!
//! ```
//! use blockflow_common::{BasicBlock, Instruction, IrFunction, IrProgram, Label};
//! use blockflow_verifier::verify;
//!
//! let mut function = IrFunction::new("thread_s", Label::from("a_2"));
//! function.insert_block(BasicBlock::new(Label::from("thread_end_1")));
//! function.insert_block(BasicBlock {
//!     label: Label::from("a_2"),
//!     instructions: vec![Instruction::add("x", 1), Instruction::jump("thread_end_1")],
//! });
//! let mut program = IrProgram::new();
//! program.insert_function(function);
//!
//! assert!(verify(&program).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Structural**: names, entry, terminators, jump targets, thread end
//! 2. **Reachability**: informational only, see [`unreachable_blocks`]

pub mod error;
pub mod reachability;
pub mod structural;

pub use error::VerifyError;
pub use reachability::{reachable_blocks, unreachable_blocks};

use blockflow_common::IrProgram;

/// Verify every function of a program.
///
/// Returns `Ok(())` if the program passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found.
pub fn verify(program: &IrProgram) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = Vec::new();

    for (key, function) in &program.functions {
        if key != &function.name {
            all_errors.push(VerifyError::FunctionNameMismatch {
                key: key.clone(),
                name: function.name.clone(),
            });
        }
        all_errors.extend(structural::check_function(function));
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use blockflow_common::{BasicBlock, Instruction, IrFunction, Label};
    use proptest::prelude::*;

    proptest! {
        /// A straight chain of jump blocks into an empty end block always verifies
        /// and is fully reachable.
        #[test]
        fn jump_chain_verifies(n in 0usize..50) {
            let label = |i: usize| Label::new(format!("b_{i}"));
            let mut f = IrFunction::new("thread_t", label(0));
            for i in 0..n {
                f.insert_block(BasicBlock {
                    label: label(i),
                    instructions: vec![Instruction::add("x", 1), Instruction::jump(label(i + 1))],
                });
            }
            f.insert_block(BasicBlock::new(label(n)));
            prop_assert!(unreachable_blocks(&f).is_empty());
            let mut program = IrProgram::new();
            program.insert_function(f);
            prop_assert!(verify(&program).is_ok());
        }
    }
}
