//! Cooperative run/wait-queue scheduler over virtual time.
//!
//! Threads are logical program counters. Each [`Scheduler::pulse`] advances
//! the virtual clock, wakes due threads, then gives every thread that was
//! runnable at the start of the pass one slice. Pausing is global: while
//! paused, time still advances and threads still wake, but nothing runs
//! except through [`Scheduler::step`].

use std::collections::{HashSet, VecDeque};

use blockflow_common::{Label, NodeId};
use indexmap::IndexSet;
use tracing::debug;

use crate::interpreter::{ExecutionStatus, Interpreter};
use crate::memory::ExecutionContext;

/// Instructions a thread may run per slice unless told otherwise.
pub const DEFAULT_SLICE_SIZE: usize = 10;

/// Something that can run one slice of a thread.
///
/// Implemented by [`Interpreter`]; tests substitute scripted executors.
pub trait SliceExecutor {
    fn execute_slice(
        &mut self,
        thread_id: &str,
        function: &str,
        ctx: &mut ExecutionContext,
        max_instructions: usize,
        now_ms: f64,
    ) -> ExecutionStatus;

    fn set_breakpoints(&mut self, breakpoints: HashSet<NodeId>);
}

impl SliceExecutor for Interpreter<'_> {
    fn execute_slice(
        &mut self,
        thread_id: &str,
        function: &str,
        ctx: &mut ExecutionContext,
        max_instructions: usize,
        now_ms: f64,
    ) -> ExecutionStatus {
        Interpreter::execute_slice(self, thread_id, function, ctx, max_instructions, now_ms)
    }

    fn set_breakpoints(&mut self, breakpoints: HashSet<NodeId>) {
        Interpreter::set_breakpoints(self, breakpoints);
    }
}

/// A scheduled thread.
#[derive(Debug, Clone)]
pub struct ThreadControlBlock {
    pub id: String,
    /// IR function this thread executes.
    pub function: String,
    pub context: ExecutionContext,
}

/// A suspended thread and the virtual time it wakes at.
#[derive(Debug, Clone)]
pub struct WaitQueueEntry {
    pub thread: ThreadControlBlock,
    pub wake_at_ms: f64,
}

type BreakpointCallback = Box<dyn FnMut(&str)>;

/// Round-robin scheduler for logical threads.
pub struct Scheduler<E> {
    executor: E,
    run_queue: VecDeque<ThreadControlBlock>,
    wait_queue: Vec<WaitQueueEntry>,
    current_time_ms: f64,
    paused: bool,
    on_breakpoint_hit: Option<BreakpointCallback>,
}

impl<E: SliceExecutor> Scheduler<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            run_queue: VecDeque::new(),
            wait_queue: Vec::new(),
            current_time_ms: 0.0,
            paused: false,
            on_breakpoint_hit: None,
        }
    }

    /// Add a runnable thread positioned at `entry` of `function`.
    pub fn schedule_thread(&mut self, id: impl Into<String>, function: impl Into<String>, entry: Label) {
        let id = id.into();
        let function = function.into();
        debug!(thread = %id, %function, "thread scheduled");
        let context = ExecutionContext::new(id.clone(), entry);
        self.run_queue.push_back(ThreadControlBlock { id, function, context });
    }

    /// Advance time by `delta_ms` and run one pass with the default slice size.
    pub fn pulse(&mut self, delta_ms: f64) {
        self.pulse_with_budget(delta_ms, DEFAULT_SLICE_SIZE);
    }

    /// Advance time by `delta_ms` and run one pass of at most
    /// `max_instructions` per thread.
    ///
    /// While paused only a budget of 1 runs anything.
    pub fn pulse_with_budget(&mut self, delta_ms: f64, max_instructions: usize) {
        self.current_time_ms += delta_ms;
        self.wake_due_threads();
        if self.paused && max_instructions > 1 {
            return;
        }
        let count = self.run_queue.len();
        self.run_slices(count, max_instructions);
    }

    /// Run one instruction of the thread at the head of the run queue and
    /// stay paused. Returns the active node ids afterwards.
    pub fn step(&mut self) -> Vec<NodeId> {
        self.paused = false;
        self.wake_due_threads();
        self.run_slices(1, 1);
        self.paused = true;
        self.active_node_ids()
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Replace the active breakpoint set.
    pub fn set_breakpoints(&mut self, breakpoints: HashSet<NodeId>) {
        self.executor.set_breakpoints(breakpoints);
    }

    /// Called with the node id whenever a thread stops on a breakpoint.
    pub fn on_breakpoint_hit(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_breakpoint_hit = Some(Box::new(callback));
    }

    /// Last-executed node of every live thread, run queue first, de-duplicated.
    pub fn active_node_ids(&self) -> Vec<NodeId> {
        let running = self.run_queue.iter().map(|t| &t.context);
        let waiting = self.wait_queue.iter().map(|w| &w.thread.context);
        let ids: IndexSet<&NodeId> = running
            .chain(waiting)
            .filter_map(|ctx| ctx.current_node.as_ref())
            .collect();
        ids.into_iter().cloned().collect()
    }

    pub fn current_time_ms(&self) -> f64 {
        self.current_time_ms
    }

    pub fn run_queue_len(&self) -> usize {
        self.run_queue.len()
    }

    pub fn wait_queue_len(&self) -> usize {
        self.wait_queue.len()
    }

    /// Returns true once every thread has halted.
    pub fn is_idle(&self) -> bool {
        self.run_queue.is_empty() && self.wait_queue.is_empty()
    }

    /// Find a live thread by id.
    pub fn thread(&self, id: &str) -> Option<&ThreadControlBlock> {
        self.run_queue
            .iter()
            .chain(self.wait_queue.iter().map(|w| &w.thread))
            .find(|t| t.id == id)
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn wake_due_threads(&mut self) {
        let now = self.current_time_ms;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.wait_queue)
            .into_iter()
            .partition(|w| w.wake_at_ms <= now);
        self.wait_queue = pending;
        for entry in due {
            debug!(thread = %entry.thread.id, now, "thread woke");
            self.run_queue.push_back(entry.thread);
        }
    }

    fn run_slices(&mut self, count: usize, max_instructions: usize) {
        for _ in 0..count {
            let Some(mut thread) = self.run_queue.pop_front() else {
                break;
            };
            let status = self.executor.execute_slice(
                &thread.id,
                &thread.function,
                &mut thread.context,
                max_instructions,
                self.current_time_ms,
            );
            match status {
                ExecutionStatus::CompletedSlice => self.run_queue.push_back(thread),
                ExecutionStatus::YieldUntil(wake_at_ms) => {
                    debug!(thread = %thread.id, wake_at_ms, "thread yielded");
                    self.wait_queue.push(WaitQueueEntry { thread, wake_at_ms });
                }
                ExecutionStatus::ThreadHalted => {
                    debug!(thread = %thread.id, "thread halted");
                }
                ExecutionStatus::HitBreakpoint(node) => {
                    debug!(thread = %thread.id, %node, "breakpoint hit");
                    self.paused = true;
                    if let Some(callback) = self.on_breakpoint_hit.as_mut() {
                        callback(&node);
                    }
                    self.run_queue.push_front(thread);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Executor that replays a fixed status list per thread, then halts.
    #[derive(Default)]
    struct Scripted {
        scripts: std::collections::HashMap<String, VecDeque<ExecutionStatus>>,
        calls: Vec<(String, usize, f64)>,
    }

    impl Scripted {
        fn script(mut self, thread: &str, statuses: Vec<ExecutionStatus>) -> Self {
            self.scripts.insert(thread.to_string(), statuses.into());
            self
        }
    }

    impl SliceExecutor for Scripted {
        fn execute_slice(
            &mut self,
            thread_id: &str,
            _function: &str,
            ctx: &mut ExecutionContext,
            max_instructions: usize,
            now_ms: f64,
        ) -> ExecutionStatus {
            self.calls.push((thread_id.to_string(), max_instructions, now_ms));
            ctx.current_node = Some(format!("{thread_id}_node"));
            self.scripts
                .get_mut(thread_id)
                .and_then(VecDeque::pop_front)
                .unwrap_or(ExecutionStatus::ThreadHalted)
        }

        fn set_breakpoints(&mut self, _breakpoints: HashSet<NodeId>) {}
    }

    fn scheduler(executor: Scripted, threads: &[&str]) -> Scheduler<Scripted> {
        let mut s = Scheduler::new(executor);
        for t in threads {
            s.schedule_thread(*t, "f", Label::from("entry"));
        }
        s
    }

    #[test]
    fn completed_slices_round_robin() {
        let exec = Scripted::default()
            .script("a", vec![ExecutionStatus::CompletedSlice])
            .script("b", vec![ExecutionStatus::CompletedSlice]);
        let mut s = scheduler(exec, &["a", "b"]);
        s.pulse(0.0);
        assert_eq!(s.run_queue_len(), 2);
        s.pulse(0.0);
        assert!(s.is_idle());
        let order: Vec<_> = s.executor().calls.iter().map(|c| c.0.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "a", "b"]);
    }

    #[test]
    fn woken_threads_wait_for_next_pass() {
        let exec = Scripted::default().script("a", vec![ExecutionStatus::YieldUntil(0.0)]);
        let mut s = scheduler(exec, &["a"]);
        s.pulse(0.0);
        assert_eq!(s.wait_queue_len(), 1);
        assert_eq!(s.executor().calls.len(), 1);
        s.pulse(0.0);
        assert!(s.is_idle());
    }

    #[test]
    fn paused_scheduler_advances_time_and_wakes_only() {
        let exec = Scripted::default().script("a", vec![ExecutionStatus::YieldUntil(30.0)]);
        let mut s = scheduler(exec, &["a"]);
        s.pulse(0.0);
        s.pause();
        s.pulse(50.0);
        assert_eq!(s.current_time_ms(), 50.0);
        assert_eq!(s.run_queue_len(), 1);
        assert_eq!(s.executor().calls.len(), 1);
        s.resume();
        s.pulse(0.0);
        assert!(s.is_idle());
    }

    #[test]
    fn breakpoint_pauses_and_parks_thread_at_front() {
        let exec = Scripted::default()
            .script("a", vec![ExecutionStatus::HitBreakpoint("n".into()), ExecutionStatus::CompletedSlice])
            .script("b", vec![ExecutionStatus::CompletedSlice]);
        let mut s = scheduler(exec, &["a", "b"]);
        let hits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&hits);
        s.on_breakpoint_hit(move |node| sink.borrow_mut().push(node.to_string()));

        s.pulse(0.0);
        assert!(s.is_paused());
        assert_eq!(*hits.borrow(), vec!["n"]);
        // b never ran this pulse
        assert_eq!(s.executor().calls.len(), 1);
        assert_eq!(s.thread("a").map(|t| t.id.as_str()), Some("a"));

        let active = s.step();
        assert!(s.is_paused());
        // b has not run yet, so only a has an active node
        assert_eq!(active, vec!["a_node".to_string()]);
        assert_eq!(s.executor().calls[1], ("a".to_string(), 1, 0.0));
    }

    #[test]
    fn active_node_ids_cover_both_queues() {
        let exec = Scripted::default()
            .script("a", vec![ExecutionStatus::YieldUntil(100.0)])
            .script("b", vec![ExecutionStatus::CompletedSlice]);
        let mut s = scheduler(exec, &["a", "b"]);
        assert!(s.active_node_ids().is_empty());
        s.pulse(0.0);
        assert_eq!(s.active_node_ids(), vec!["b_node".to_string(), "a_node".to_string()]);
    }
}
