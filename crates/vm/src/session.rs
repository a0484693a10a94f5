//! Program lifecycle and the headless driver loop.

use blockflow_common::IrProgram;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::interpreter::Interpreter;
use crate::registry::Registry;
use crate::scheduler::{Scheduler, DEFAULT_SLICE_SIZE};

/// One execution of a compiled program.
///
/// Starting a session runs every registry `on_initialize` hook and schedules
/// one thread per IR function. Cleanup hooks run exactly once, on
/// [`Session::finish`] or on drop.
pub struct Session<'a> {
    scheduler: Scheduler<Interpreter<'a>>,
    registry: &'a Registry,
    finished: bool,
}

impl<'a> Session<'a> {
    pub fn start(program: &'a IrProgram, registry: &'a Registry) -> Result<Self, RegistryError> {
        if let Err(err) = registry.initialize_all() {
            if let Err(cleanup) = registry.cleanup_all() {
                warn!(%cleanup, "cleanup after failed initialization also failed");
            }
            return Err(err);
        }

        let mut scheduler = Scheduler::new(Interpreter::new(program, registry));
        for function in program.functions.values() {
            scheduler.schedule_thread(function.name.clone(), function.name.clone(), function.entry.clone());
        }
        Ok(Self {
            scheduler,
            registry,
            finished: false,
        })
    }

    pub fn scheduler(&self) -> &Scheduler<Interpreter<'a>> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler<Interpreter<'a>> {
        &mut self.scheduler
    }

    /// Run cleanup hooks and end the session.
    pub fn finish(mut self) -> Result<(), RegistryError> {
        self.finished = true;
        self.registry.cleanup_all()
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.registry.cleanup_all() {
                warn!(%err, "cleanup on drop failed");
            }
        }
    }
}

/// Settings for [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Virtual milliseconds per pulse.
    pub pulse_ms: f64,
    /// Stop after this many pulses even if threads remain.
    pub max_pulses: usize,
    /// Instruction budget per thread per pulse.
    pub slice_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            pulse_ms: 16.0,
            max_pulses: 10_000,
            slice_size: DEFAULT_SLICE_SIZE,
        }
    }
}

/// Summary of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub pulses: usize,
    pub final_time_ms: f64,
    /// Every thread halted before the pulse limit.
    pub finished: bool,
}

/// Run `program` headless with fixed-size pulses until every thread halts
/// or the pulse limit is reached.
pub fn run(program: &IrProgram, registry: &Registry, options: &RunOptions) -> Result<RunReport, RegistryError> {
    let mut session = Session::start(program, registry)?;
    let mut pulses = 0;
    while !session.scheduler().is_idle() && pulses < options.max_pulses {
        session
            .scheduler_mut()
            .pulse_with_budget(options.pulse_ms, options.slice_size);
        pulses += 1;
    }
    let report = RunReport {
        pulses,
        final_time_ms: session.scheduler().current_time_ms(),
        finished: session.scheduler().is_idle(),
    };
    if report.finished {
        debug!(pulses, "all threads halted");
    } else {
        info!(pulses, "pulse limit reached with threads still live");
    }
    session.finish()?;
    Ok(report)
}
