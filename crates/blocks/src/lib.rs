//! The standard blockflow block library.
//!
//! Two plugins:
//! - [`core_plugin`]: `start`, `repeat`, `forever`, `set_var`, `change_var`, `box`
//! - [`music_plugin`]: `play_note`, `rest`, `wait`, `set_tempo`, `set_volume`, `print`
//!
//! Music blocks report through an [`EventSink`] instead of producing sound.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use blockflow_blocks::{standard_registry, RecordingSink};
//! use blockflow_common::{BlockGraph, BlockNode};
//! use blockflow_vm::{run, Compiler, RunOptions};
//!
//! let graph = BlockGraph::from_nodes([
//!     BlockNode::new("s", "start").with_next("p"),
//!     BlockNode::new("p", "play_note").with_input("pitch", "E4"),
//! ])
//! .unwrap();
//! let sink = Rc::new(RecordingSink::new());
//! let registry = standard_registry(sink.clone());
//! let program = Compiler::new(&registry).compile(&graph.start_nodes("start"), &graph);
//!
//! run(&program, &registry, &RunOptions::default()).unwrap();
//! assert_eq!(sink.events().len(), 1);
//! ```

pub mod core_blocks;
pub mod error;
pub mod music;
pub mod sink;

pub use core_blocks::{core_plugin, DEFAULT_REPEAT_ITERATIONS};
pub use error::SinkError;
pub use music::{music_plugin, DEFAULT_BPM, DEFAULT_VOLUME};
pub use sink::{Event, EventSink, RecordingSink};

use std::rc::Rc;

use blockflow_vm::Registry;

/// Registry holding both standard plugins, with music output going to `sink`.
pub fn standard_registry(sink: Rc<dyn EventSink>) -> Registry {
    let mut registry = Registry::new();
    registry.register_plugin(core_plugin());
    registry.register_plugin(music_plugin(sink));
    registry
}
