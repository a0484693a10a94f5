//! blockflow CLI: compile, verify and run block program graphs.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/graph error
//! - 2: Verification failure
//! - 3: Runtime error

use std::path::PathBuf;
use std::process;

use blockflow_cli::commands::{self, RunFlags};
use blockflow_vm::{RunOptions, DEFAULT_SLICE_SIZE};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "blockflow")]
#[command(about = "Compile, verify and run block program graphs")]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the IR listing of a graph
    Compile {
        /// Program graph (JSON)
        input: PathBuf,
    },
    /// Compile a graph and check the IR
    Verify {
        /// Program graph (JSON)
        input: PathBuf,
    },
    /// Compile, verify and run a graph headless
    Run {
        /// Program graph (JSON)
        input: PathBuf,

        /// Virtual milliseconds per pulse
        #[arg(long, default_value_t = 16.0)]
        dt: f64,

        /// Stop after this many pulses
        #[arg(long = "max-pulses", default_value_t = 10_000)]
        max_pulses: usize,

        /// Instructions per thread per pulse
        #[arg(
            long,
            default_value_t = DEFAULT_SLICE_SIZE,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..)
        )]
        slice: usize,

        /// Pause when execution reaches this node (repeatable)
        #[arg(long = "break", value_name = "NODE")]
        breakpoints: Vec<String>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();
    blockflow_cli::init_logging(args.verbose);

    let result = match args.command {
        Command::Compile { input } => commands::compile(&input),
        Command::Verify { input } => commands::verify(&input),
        Command::Run {
            input,
            dt,
            max_pulses,
            slice,
            breakpoints,
            json,
        } => {
            let flags = RunFlags {
                options: RunOptions {
                    pulse_ms: dt,
                    max_pulses,
                    slice_size: slice,
                },
                breakpoints,
                json,
            };
            commands::run(&input, &flags)
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}
