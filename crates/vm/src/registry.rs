//! Block and syscall registry.
//!
//! The registry is the only way domain behavior reaches the engine. Each
//! block type may provide:
//!
//! - a compile hook, used by the compiler to lower nodes of that type
//! - a syscall handler, invoked by `syscall <type>(...)` instructions
//! - lifecycle hooks, run once when a program starts and once when it ends
//!
//! Blocks are usually registered in groups through a [`Plugin`], which can
//! carry lifecycle hooks of its own. One registry is built by the host and
//! passed by reference to the compiler, interpreter and session.

use blockflow_common::{BlockNode, Label, Value};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::compiler::CompileCtx;
use crate::error::RegistryError;
use crate::interpreter::ExecutionStatus;
use crate::memory::ExecutionContext;

/// Lowers one node. Receives the label the node must exit to and returns
/// the label of the node's first block.
pub type CompileHook = Box<dyn Fn(&BlockNode, Label, &mut CompileCtx<'_>) -> Label>;

/// Runs a syscall with resolved arguments, the calling thread's context
/// and the current virtual time. Returning a status ends the slice with it.
pub type SyscallHandler =
    Box<dyn Fn(&[Value], &mut ExecutionContext, f64) -> Option<ExecutionStatus>>;

/// Acquires or releases an external resource. Errors carry a message.
pub type LifecycleHook = Box<dyn Fn() -> Result<(), String>>;

/// Behavior registered for one block type.
pub struct BlockDefinition {
    block_type: String,
    compile: Option<CompileHook>,
    execute: Option<SyscallHandler>,
    on_initialize: Option<LifecycleHook>,
    on_cleanup: Option<LifecycleHook>,
}

impl BlockDefinition {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            compile: None,
            execute: None,
            on_initialize: None,
            on_cleanup: None,
        }
    }

    pub fn compile<F>(mut self, hook: F) -> Self
    where
        F: Fn(&BlockNode, Label, &mut CompileCtx<'_>) -> Label + 'static,
    {
        self.compile = Some(Box::new(hook));
        self
    }

    pub fn execute<F>(mut self, handler: F) -> Self
    where
        F: Fn(&[Value], &mut ExecutionContext, f64) -> Option<ExecutionStatus> + 'static,
    {
        self.execute = Some(Box::new(handler));
        self
    }

    pub fn on_initialize<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), String> + 'static,
    {
        self.on_initialize = Some(Box::new(hook));
        self
    }

    pub fn on_cleanup<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), String> + 'static,
    {
        self.on_cleanup = Some(Box::new(hook));
        self
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn compile_hook(&self) -> Option<&CompileHook> {
        self.compile.as_ref()
    }

    pub fn syscall_handler(&self) -> Option<&SyscallHandler> {
        self.execute.as_ref()
    }
}

/// A named group of block definitions with optional shared lifecycle hooks.
pub struct Plugin {
    name: String,
    blocks: Vec<BlockDefinition>,
    on_initialize: Option<LifecycleHook>,
    on_cleanup: Option<LifecycleHook>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            on_initialize: None,
            on_cleanup: None,
        }
    }

    pub fn block(mut self, definition: BlockDefinition) -> Self {
        self.blocks.push(definition);
        self
    }

    pub fn on_initialize<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), String> + 'static,
    {
        self.on_initialize = Some(Box::new(hook));
        self
    }

    pub fn on_cleanup<F>(mut self, hook: F) -> Self
    where
        F: Fn() -> Result<(), String> + 'static,
    {
        self.on_cleanup = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Plugin-level hooks kept after the plugin's blocks are registered.
struct PluginHooks {
    name: String,
    on_initialize: Option<LifecycleHook>,
    on_cleanup: Option<LifecycleHook>,
}

/// Resolves block types and syscall names to behavior.
#[derive(Default)]
pub struct Registry {
    plugins: Vec<PluginHooks>,
    blocks: IndexMap<String, BlockDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every block of `plugin`, plus its lifecycle hooks.
    ///
    /// A later registration of the same block type or plugin name replaces
    /// the earlier one.
    pub fn register_plugin(&mut self, plugin: Plugin) {
        let Plugin {
            name,
            blocks,
            on_initialize,
            on_cleanup,
        } = plugin;
        debug!(plugin = %name, blocks = blocks.len(), "registering plugin");
        for definition in blocks {
            self.register_block(definition);
        }
        self.plugins.retain(|p| p.name != name);
        self.plugins.push(PluginHooks {
            name,
            on_initialize,
            on_cleanup,
        });
    }

    /// Register a single block definition.
    pub fn register_block(&mut self, definition: BlockDefinition) {
        if self.blocks.contains_key(&definition.block_type) {
            warn!(block_type = %definition.block_type, "block type registered twice; replacing");
        }
        self.blocks
            .insert(definition.block_type.clone(), definition);
    }

    /// Register a handler callable as `syscall <name>(...)`.
    ///
    /// A block already registered under `name` keeps its compile and
    /// lifecycle hooks; only its syscall handler is replaced.
    pub fn register_syscall<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&[Value], &mut ExecutionContext, f64) -> Option<ExecutionStatus> + 'static,
    {
        let name = name.into();
        match self.blocks.get_mut(&name) {
            Some(existing) => {
                if existing.execute.is_some() {
                    warn!(syscall = %name, "syscall registered twice; replacing");
                }
                existing.execute = Some(Box::new(handler));
            }
            None => self.register_block(BlockDefinition::new(name).execute(handler)),
        }
    }

    /// Behavior for a block type.
    pub fn block(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.blocks.get(block_type)
    }

    /// Handler for a syscall name. Syscalls share the block type namespace.
    pub fn syscall(&self, name: &str) -> Option<&SyscallHandler> {
        self.blocks.get(name).and_then(BlockDefinition::syscall_handler)
    }

    /// Registered block types, in registration order.
    pub fn block_types(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    /// Names of registered plugins, in registration order.
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name.as_str())
    }

    /// Run every `on_initialize` hook: plugins first, then blocks.
    ///
    /// Stops at the first failure.
    pub fn initialize_all(&self) -> Result<(), RegistryError> {
        let plugin_hooks = self
            .plugins
            .iter()
            .map(|p| (p.name.as_str(), p.on_initialize.as_ref()));
        let block_hooks = self
            .blocks
            .values()
            .map(|b| (b.block_type.as_str(), b.on_initialize.as_ref()));
        for (owner, hook) in plugin_hooks.chain(block_hooks) {
            if let Some(hook) = hook {
                hook().map_err(|message| RegistryError::Initialize {
                    owner: owner.to_string(),
                    message,
                })?;
            }
        }
        Ok(())
    }

    /// Run every `on_cleanup` hook: plugins first, then blocks.
    ///
    /// All hooks run even if some fail; the first failure is returned.
    pub fn cleanup_all(&self) -> Result<(), RegistryError> {
        let plugin_hooks = self
            .plugins
            .iter()
            .map(|p| (p.name.as_str(), p.on_cleanup.as_ref()));
        let block_hooks = self
            .blocks
            .values()
            .map(|b| (b.block_type.as_str(), b.on_cleanup.as_ref()));
        let mut first_error = None;
        for (owner, hook) in plugin_hooks.chain(block_hooks) {
            let Some(hook) = hook else { continue };
            if let Err(message) = hook() {
                warn!(owner, %message, "cleanup hook failed");
                first_error.get_or_insert(RegistryError::Cleanup {
                    owner: owner.to_string(),
                    message,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn() -> Result<(), String>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = Rc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn() -> Result<(), String>> {
            let log = Rc::clone(&handle);
            let tag = tag.to_string();
            Box::new(move || {
                log.borrow_mut().push(tag.clone());
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn syscalls_resolve_by_block_type() {
        let mut registry = Registry::new();
        registry.register_syscall("ping", |_, _, now| Some(ExecutionStatus::YieldUntil(now + 1.0)));
        registry.register_block(BlockDefinition::new("quiet"));

        let mut ctx = ExecutionContext::new("t", Label::from("b"));
        let handler = registry.syscall("ping").unwrap();
        assert_eq!(handler(&[], &mut ctx, 4.0), Some(ExecutionStatus::YieldUntil(5.0)));
        assert!(registry.syscall("quiet").is_none());
        assert!(registry.syscall("missing").is_none());
        assert!(registry.block("quiet").unwrap().compile_hook().is_none());
    }

    #[test]
    fn plugin_blocks_are_registered_in_order() {
        let mut registry = Registry::new();
        registry.register_plugin(
            Plugin::new("core")
                .block(BlockDefinition::new("start"))
                .block(BlockDefinition::new("repeat")),
        );
        assert_eq!(registry.block_types().collect::<Vec<_>>(), vec!["start", "repeat"]);
        assert_eq!(registry.plugin_names().collect::<Vec<_>>(), vec!["core"]);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = Registry::new();
        registry.register_syscall("beep", |_, _, _| None);
        registry.register_syscall("beep", |_, _, _| Some(ExecutionStatus::ThreadHalted));
        let mut ctx = ExecutionContext::new("t", Label::from("b"));
        assert_eq!(
            registry.syscall("beep").unwrap()(&[], &mut ctx, 0.0),
            Some(ExecutionStatus::ThreadHalted)
        );
        assert_eq!(registry.block_types().count(), 1);
    }

    #[test]
    fn syscall_on_existing_block_keeps_its_hooks() {
        let mut registry = Registry::new();
        registry.register_block(
            BlockDefinition::new("beep")
                .compile(|_, exit, _| exit)
                .on_cleanup(|| Ok(())),
        );
        registry.register_syscall("beep", |_, _, _| Some(ExecutionStatus::ThreadHalted));

        let beep = registry.block("beep").unwrap();
        assert!(beep.compile_hook().is_some());
        assert!(beep.on_cleanup.is_some());
        let mut ctx = ExecutionContext::new("t", Label::from("b"));
        assert_eq!(
            registry.syscall("beep").unwrap()(&[], &mut ctx, 0.0),
            Some(ExecutionStatus::ThreadHalted)
        );
    }

    #[test]
    fn lifecycle_runs_plugins_then_blocks() {
        let (log, hook) = recorder();
        let mut registry = Registry::new();
        let mut plugin = Plugin::new("music").block({
            let mut def = BlockDefinition::new("play_note");
            def.on_initialize = Some(hook("block init"));
            def.on_cleanup = Some(hook("block cleanup"));
            def
        });
        plugin.on_initialize = Some(hook("plugin init"));
        plugin.on_cleanup = Some(hook("plugin cleanup"));
        registry.register_plugin(plugin);

        registry.initialize_all().unwrap();
        registry.cleanup_all().unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["plugin init", "block init", "plugin cleanup", "block cleanup"]
        );
    }

    #[test]
    fn initialize_stops_at_first_failure() {
        let (log, hook) = recorder();
        let mut registry = Registry::new();
        registry.register_plugin(Plugin::new("broken").on_initialize(|| Err("no device".into())));
        let mut def = BlockDefinition::new("later");
        def.on_initialize = Some(hook("later init"));
        registry.register_block(def);

        assert_eq!(
            registry.initialize_all(),
            Err(RegistryError::Initialize {
                owner: "broken".into(),
                message: "no device".into()
            })
        );
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn cleanup_runs_every_hook_and_reports_first_failure() {
        let (log, hook) = recorder();
        let mut registry = Registry::new();
        registry.register_plugin(Plugin::new("a").on_cleanup(|| Err("first".into())));
        registry.register_plugin(Plugin::new("b").on_cleanup(|| Err("second".into())));
        let mut def = BlockDefinition::new("c");
        def.on_cleanup = Some(hook("c cleanup"));
        registry.register_block(def);

        assert_eq!(
            registry.cleanup_all(),
            Err(RegistryError::Cleanup {
                owner: "a".into(),
                message: "first".into()
            })
        );
        assert_eq!(*log.borrow(), vec!["c cleanup"]);
    }
}
