//! blockflow virtual machine: compiles program graphs to IR and runs them
//! as cooperatively scheduled threads in virtual time.
//!
//! The pieces, in data-flow order:
//! - [`Registry`] resolves block types and syscall names to behavior
//! - [`Compiler`] lowers a [`BlockGraph`](blockflow_common::BlockGraph) into an [`IrProgram`](blockflow_common::IrProgram)
//! - [`Interpreter`] runs bounded slices of one thread
//! - [`Scheduler`] multiplexes threads over run and wait queues
//! - [`Session`] / [`run`] tie program lifecycle hooks to a scheduler
//!
//! # Usage
//!
//! ```
//! use blockflow_common::{BlockGraph, BlockNode};
//! use blockflow_vm::{run, Compiler, Registry, RunOptions};
//!
//! let graph = BlockGraph::from_nodes([
//!     BlockNode::new("a", "set_var").with_input("varName", "x").with_input("value", 3),
//! ])
//! .unwrap();
//! let registry = Registry::new();
//! let program = Compiler::new(&registry).compile(&graph.roots(), &graph);
//!
//! let report = run(&program, &registry, &RunOptions::default()).unwrap();
//! assert!(report.finished);
//! ```

pub mod compiler;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod registry;
pub mod scheduler;
pub mod session;

pub use compiler::{Compilation, CompileCtx, Compiler};
pub use error::{CompileWarning, RegistryError};
pub use interpreter::{ExecutionStatus, Interpreter};
pub use memory::{ExecutionContext, SymbolTable};
pub use registry::{BlockDefinition, Plugin, Registry};
pub use scheduler::{Scheduler, SliceExecutor, DEFAULT_SLICE_SIZE};
pub use session::{run, RunOptions, RunReport, Session};
