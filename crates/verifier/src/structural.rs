//! Structural checks for IR functions.
//!
//! Every non-empty block must end in exactly one terminator, every
//! control transfer must stay inside the function, and there must be an
//! empty block for threads to halt in.

use crate::error::VerifyError;
use blockflow_common::{BasicBlock, IrFunction};

/// Run the structural checks on one function.
pub fn check_function(function: &IrFunction) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let name = &function.name;

    if function.block(function.entry.as_str()).is_none() {
        errors.push(VerifyError::MissingEntry {
            function: name.clone(),
            entry: function.entry.to_string(),
        });
    }

    if function.halting_blocks().next().is_none() {
        errors.push(VerifyError::MissingThreadEnd {
            function: name.clone(),
        });
    }

    for (key, block) in &function.blocks {
        if key != &block.label {
            errors.push(VerifyError::BlockLabelMismatch {
                function: name.clone(),
                key: key.to_string(),
                label: block.label.to_string(),
            });
        }
        check_block(function, block, &mut errors);
    }

    errors
}

fn check_block(function: &IrFunction, block: &BasicBlock, errors: &mut Vec<VerifyError>) {
    let last = block.instructions.len().saturating_sub(1);
    for (at, instr) in block.instructions.iter().enumerate() {
        if instr.is_terminator() && at != last {
            errors.push(VerifyError::InstructionAfterTerminator {
                function: function.name.clone(),
                label: block.label.to_string(),
                at: at + 1,
            });
        }
        for target in instr.targets() {
            if function.block(target.as_str()).is_none() {
                errors.push(VerifyError::UnknownTarget {
                    function: function.name.clone(),
                    label: block.label.to_string(),
                    at,
                    target: target.to_string(),
                });
            }
        }
    }

    if !block.is_empty() && block.terminator().is_none() {
        errors.push(VerifyError::MissingTerminator {
            function: function.name.clone(),
            label: block.label.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockflow_common::{CompareOp, Instruction, Label};

    fn function(blocks: Vec<(&str, Vec<Instruction>)>) -> IrFunction {
        let mut f = IrFunction::new("thread_t", Label::from(blocks[0].0));
        for (label, instructions) in blocks {
            f.insert_block(BasicBlock {
                label: Label::from(label),
                instructions,
            });
        }
        f
    }

    #[test]
    fn well_formed_loop_passes() {
        let f = function(vec![
            ("init", vec![Instruction::declare("i", 0), Instruction::jump("cond")]),
            ("cond", vec![Instruction::branch(CompareOp::Lt, "i", 2, "inc", "end")]),
            ("inc", vec![Instruction::add("i", 1), Instruction::jump("cond")]),
            ("end", vec![]),
        ]);
        assert!(check_function(&f).is_empty());
    }

    #[test]
    fn fallthrough_block_is_reported() {
        let f = function(vec![
            ("a", vec![Instruction::declare("x", 1)]),
            ("end", vec![]),
        ]);
        assert_eq!(
            check_function(&f),
            vec![VerifyError::MissingTerminator {
                function: "thread_t".into(),
                label: "a".into()
            }]
        );
    }

    #[test]
    fn early_terminator_is_reported() {
        let f = function(vec![
            ("a", vec![Instruction::jump("end"), Instruction::jump("end")]),
            ("end", vec![]),
        ]);
        assert_eq!(
            check_function(&f),
            vec![VerifyError::InstructionAfterTerminator {
                function: "thread_t".into(),
                label: "a".into(),
                at: 1
            }]
        );
    }

    #[test]
    fn both_branch_targets_are_checked() {
        let f = function(vec![
            ("a", vec![Instruction::branch(CompareOp::Eq, "x", 0, "yes", "no")]),
            ("end", vec![]),
        ]);
        let errors = check_function(&f);
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, VerifyError::UnknownTarget { at: 0, .. })));
    }

    #[test]
    fn missing_entry_and_thread_end() {
        let mut f = function(vec![("a", vec![Instruction::jump("a")])]);
        f.entry = Label::from("nowhere");
        let errors = check_function(&f);
        assert!(errors.contains(&VerifyError::MissingEntry {
            function: "thread_t".into(),
            entry: "nowhere".into()
        }));
        assert!(errors.contains(&VerifyError::MissingThreadEnd {
            function: "thread_t".into()
        }));
    }

    #[test]
    fn mislabelled_block_is_reported() {
        let mut f = function(vec![("end", vec![])]);
        f.blocks.insert(Label::from("alias"), BasicBlock::new(Label::from("real")));
        assert!(check_function(&f).contains(&VerifyError::BlockLabelMismatch {
            function: "thread_t".into(),
            key: "alias".into(),
            label: "real".into()
        }));
    }
}
