//! CLI command implementations.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use blockflow_blocks::{standard_registry, RecordingSink};
use blockflow_common::{BlockGraph, IrProgram};
use blockflow_vm::{Compiler, Interpreter, Registry, RunOptions, Scheduler, Session};
use tracing::debug;

/// Block type whose roots become threads.
const START_BLOCK: &str = "start";

/// Settings for [`run`] beyond the driver loop options.
#[derive(Debug, Clone)]
pub struct RunFlags {
    pub options: RunOptions,
    pub breakpoints: Vec<String>,
    /// Print events as JSON lines instead of text.
    pub json: bool,
}

/// Print the IR listing of a program graph.
pub fn compile(input: &Path) -> Result<(), i32> {
    let graph = read_graph(input)?;
    let registry = standard_registry(Rc::new(RecordingSink::new()));
    let program = compile_graph(&graph, &registry);
    print!("{program}");
    Ok(())
}

/// Compile a program graph and verify the IR.
pub fn verify(input: &Path) -> Result<(), i32> {
    let graph = read_graph(input)?;
    let registry = standard_registry(Rc::new(RecordingSink::new()));
    let program = compile_graph(&graph, &registry);
    check_program(&program)?;

    for function in program.functions.values() {
        for label in blockflow_verifier::unreachable_blocks(function) {
            eprintln!("note: block '{label}' in '{}' is unreachable", function.name);
        }
    }
    let instructions: usize = program.functions.values().map(|f| f.instruction_count()).sum();
    println!(
        "OK: {} ({} threads, {instructions} instructions)",
        input.display(),
        program.len()
    );
    Ok(())
}

/// Compile, verify and run a program graph headless, printing every event.
pub fn run(input: &Path, flags: &RunFlags) -> Result<(), i32> {
    let graph = read_graph(input)?;
    let sink = Rc::new(RecordingSink::new());
    let registry = standard_registry(sink.clone());
    let program = compile_graph(&graph, &registry);
    check_program(&program)?;

    let mut session = Session::start(&program, &registry).map_err(|e| {
        eprintln!("error: {e}");
        3
    })?;

    let hits: Rc<RefCell<Vec<String>>> = Rc::default();
    {
        let scheduler = session.scheduler_mut();
        scheduler.set_breakpoints(flags.breakpoints.iter().cloned().collect());
        let hits = Rc::clone(&hits);
        scheduler.on_breakpoint_hit(move |node| hits.borrow_mut().push(node.to_string()));
    }

    let options = &flags.options;
    let mut pulses = 0;
    while !session.scheduler().is_idle() && pulses < options.max_pulses {
        let scheduler = session.scheduler_mut();
        scheduler.pulse_with_budget(options.pulse_ms, options.slice_size);
        pulses += 1;
        print_events(&sink, flags.json)?;
        if scheduler.is_paused() {
            report_breakpoints(&hits, scheduler);
            step_through(scheduler, options.slice_size, &hits);
            print_events(&sink, flags.json)?;
        }
    }

    let scheduler = session.scheduler();
    if scheduler.is_idle() {
        eprintln!(
            "finished after {pulses} pulses at t={}",
            scheduler.current_time_ms()
        );
    } else {
        eprintln!(
            "stopped after {pulses} pulses at t={} with {} threads live",
            scheduler.current_time_ms(),
            scheduler.run_queue_len() + scheduler.wait_queue_len()
        );
    }

    session.finish().map_err(|e| {
        eprintln!("error: {e}");
        3
    })
}

/// Single-step the paused scheduler through one slice budget, then resume.
fn step_through(scheduler: &mut Scheduler<Interpreter<'_>>, budget: usize, hits: &RefCell<Vec<String>>) {
    for _ in 0..budget {
        if scheduler.is_idle() {
            break;
        }
        let active = scheduler.step();
        debug!(?active, "stepped");
        report_breakpoints(hits, scheduler);
    }
    scheduler.resume();
}

fn report_breakpoints(hits: &RefCell<Vec<String>>, scheduler: &Scheduler<Interpreter<'_>>) {
    for node in hits.borrow_mut().drain(..) {
        println!("breakpoint {node} at t={}", scheduler.current_time_ms());
    }
}

fn print_events(sink: &RecordingSink, json: bool) -> Result<(), i32> {
    for event in sink.drain() {
        if json {
            let line = serde_json::to_string(&event).map_err(|e| {
                eprintln!("error: cannot encode event: {e}");
                3
            })?;
            println!("{line}");
        } else {
            println!("t={} {event}", event.at_ms());
        }
    }
    Ok(())
}

fn read_graph(input: &Path) -> Result<BlockGraph, i32> {
    let text = fs::read_to_string(input).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", input.display());
        1
    })?;
    BlockGraph::from_json(&text).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

/// Compile every `start` root into a thread, reporting warnings on stderr.
fn compile_graph(graph: &BlockGraph, registry: &Registry) -> IrProgram {
    let starts = graph.start_nodes(START_BLOCK);
    if starts.is_empty() {
        eprintln!("warning: no '{START_BLOCK}' block; nothing to run");
    }
    let compilation = Compiler::new(registry).compile_with_warnings(&starts, graph);
    for warning in &compilation.warnings {
        eprintln!("warning: {warning}");
    }
    compilation.program
}

fn check_program(program: &IrProgram) -> Result<(), i32> {
    blockflow_verifier::verify(program).map_err(|errors| {
        for e in &errors {
            eprintln!("error: {e}");
        }
        2
    })
}
