//! IR instructions, operands and labels.
//!
//! An [`Instruction`] is an [`Op`] plus an optional back-reference to the
//! program-graph node it was lowered from. The back-reference drives
//! breakpoints and the "active block" highlight; it has no effect on
//! semantics.

use std::borrow::Borrow;
use std::fmt;

use crate::opcode::{CompareOp, Opcode};
use crate::value::Value;

/// Identifier of a node in the program graph.
pub type NodeId = String;

/// Name of a basic block, unique within its function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(String);

impl Label {
    /// Create a label from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An instruction operand, fixed at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Used as-is.
    Literal(Value),
    /// Looked up in the thread's symbol table when executed (unbound = 0).
    Var(String),
}

impl Operand {
    /// Shorthand for a variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Operand::Var(name.into())
    }

    /// Operand for a block input as written in the editor.
    ///
    /// Text of the form `$name` refers to variable `name`; everything else
    /// is a literal.
    pub fn from_input(value: Value) -> Self {
        match value {
            Value::Text(s) if s.len() > 1 && s.starts_with('$') => Operand::Var(s[1..].to_string()),
            other => Operand::Literal(other),
        }
    }
}

impl<T: Into<Value>> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Literal(value.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(Value::Text(s)) => write!(f, "{s:?}"),
            Operand::Literal(v) => write!(f, "{v}"),
            Operand::Var(name) => write!(f, "${name}"),
        }
    }
}

/// The operation of one instruction, with its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Declare {
        name: String,
        value: Operand,
    },
    Assign {
        name: String,
        value: Operand,
    },
    Add {
        name: String,
        amount: Operand,
    },
    Jump {
        target: Label,
    },
    /// `if lookup(left) <cmp> right { if_true } else { if_false }`
    Branch {
        cmp: CompareOp,
        left: String,
        right: Operand,
        if_true: Label,
        if_false: Label,
    },
    Syscall {
        name: String,
        args: Vec<Operand>,
    },
    Yield,
}

/// A single IR instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// What to do.
    pub op: Op,
    /// The program-graph node this instruction was lowered from.
    pub source: Option<NodeId>,
}

impl Instruction {
    /// Create an untagged instruction.
    pub fn new(op: Op) -> Self {
        Self { op, source: None }
    }

    /// Tag this instruction with the node it came from.
    pub fn from_node(mut self, node: impl Into<NodeId>) -> Self {
        self.source = Some(node.into());
        self
    }

    pub fn declare(name: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::new(Op::Declare {
            name: name.into(),
            value: value.into(),
        })
    }

    pub fn assign(name: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self::new(Op::Assign {
            name: name.into(),
            value: value.into(),
        })
    }

    pub fn add(name: impl Into<String>, amount: impl Into<Operand>) -> Self {
        Self::new(Op::Add {
            name: name.into(),
            amount: amount.into(),
        })
    }

    pub fn jump(target: impl Into<Label>) -> Self {
        Self::new(Op::Jump {
            target: target.into(),
        })
    }

    pub fn branch(
        cmp: CompareOp,
        left: impl Into<String>,
        right: impl Into<Operand>,
        if_true: impl Into<Label>,
        if_false: impl Into<Label>,
    ) -> Self {
        Self::new(Op::Branch {
            cmp,
            left: left.into(),
            right: right.into(),
            if_true: if_true.into(),
            if_false: if_false.into(),
        })
    }

    pub fn syscall(name: impl Into<String>, args: Vec<Operand>) -> Self {
        Self::new(Op::Syscall {
            name: name.into(),
            args,
        })
    }

    pub fn yield_now() -> Self {
        Self::new(Op::Yield)
    }

    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self.op {
            Op::Declare { .. } => Opcode::Declare,
            Op::Assign { .. } => Opcode::Assign,
            Op::Add { .. } => Opcode::Add,
            Op::Jump { .. } => Opcode::Jump,
            Op::Branch { .. } => Opcode::Branch,
            Op::Syscall { .. } => Opcode::Syscall,
            Op::Yield => Opcode::Yield,
        }
    }

    /// Labels this instruction can transfer control to.
    pub fn targets(&self) -> Vec<&Label> {
        match &self.op {
            Op::Jump { target } => vec![target],
            Op::Branch {
                if_true, if_false, ..
            } => vec![if_true, if_false],
            _ => Vec::new(),
        }
    }

    /// Returns true if this instruction ends a basic block.
    pub fn is_terminator(&self) -> bool {
        self.opcode().is_terminator()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match &self.op {
            Op::Declare { name, value } | Op::Assign { name, value } => {
                write!(f, "{mnemonic} {name}, {value}")?
            }
            Op::Add { name, amount } => write!(f, "{mnemonic} {name}, {amount}")?,
            Op::Jump { target } => write!(f, "{mnemonic} {target}")?,
            Op::Branch {
                cmp,
                left,
                right,
                if_true,
                if_false,
            } => write!(f, "{mnemonic} {left} {cmp} {right} ? {if_true} : {if_false}")?,
            Op::Syscall { name, args } => {
                write!(f, "{mnemonic} {name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")?
            }
            Op::Yield => f.write_str(mnemonic)?,
        }
        if let Some(node) = &self.source {
            write!(f, " ; {node}")?;
        }
        Ok(())
    }
}
