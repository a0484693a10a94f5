//! Music blocks: notes, rests, waits, tempo, volume and print.
//!
//! Timing is virtual. A note or rest yields its thread for
//! `beats * 60000 / tempo` milliseconds, where tempo is the thread's
//! `_tempo` variable (set by `set_tempo`) or [`DEFAULT_BPM`].

use std::rc::Rc;

use blockflow_common::{BlockNode, Instruction, Label, Operand, Value};
use blockflow_vm::{BlockDefinition, CompileCtx, ExecutionContext, ExecutionStatus, Plugin};
use tracing::info;

use crate::sink::{Event, EventSink};

/// Beats per minute until a thread runs `set_tempo`.
pub const DEFAULT_BPM: f64 = 120.0;

/// Volume level of a `set_volume` block without a `level` input.
pub const DEFAULT_VOLUME: f64 = 50.0;

/// Pitch of a `play_note` block without a `pitch` input.
pub const DEFAULT_PITCH: &str = "C4";

/// Thread variable holding the current tempo.
pub const TEMPO_VAR: &str = "_tempo";

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// The music blocks, all reporting to `sink`. The sink is opened when a
/// program starts and closed when it ends.
pub fn music_plugin(sink: Rc<dyn EventSink>) -> Plugin {
    let on_open = Rc::clone(&sink);
    let on_close = Rc::clone(&sink);
    let notes = Rc::clone(&sink);
    let volume = Rc::clone(&sink);
    let print = sink;

    Plugin::new("music")
        .on_initialize(move || on_open.open().map_err(|e| e.to_string()))
        .on_cleanup(move || on_close.close().map_err(|e| e.to_string()))
        .block(
            BlockDefinition::new("play_note")
                .compile(|node, exit, ctx| {
                    let pitch = Operand::from_input(node.value_input("pitch", DEFAULT_PITCH));
                    syscall_block(node, vec![pitch, beats(node)], exit, ctx)
                })
                .execute(move |args, ctx, now| {
                    let duration_ms = beats_to_ms(arg(args, 1), ctx);
                    notes.emit(Event::Note {
                        pitch: pitch_name(&arg(args, 0)),
                        duration_ms,
                        at_ms: now,
                    });
                    Some(ExecutionStatus::YieldUntil(now + duration_ms))
                }),
        )
        .block(
            BlockDefinition::new("rest")
                .compile(|node, exit, ctx| syscall_block(node, vec![beats(node)], exit, ctx))
                .execute(|args, ctx, now| Some(ExecutionStatus::YieldUntil(now + beats_to_ms(arg(args, 0), ctx)))),
        )
        .block(
            BlockDefinition::new("wait")
                .compile(|node, exit, ctx| {
                    let seconds = Operand::from_input(node.value_input("seconds", 1));
                    syscall_block(node, vec![seconds], exit, ctx)
                })
                .execute(|args, _, now| Some(ExecutionStatus::YieldUntil(now + arg(args, 0).as_number() * 1000.0))),
        )
        .block(
            BlockDefinition::new("set_tempo")
                .compile(|node, exit, ctx| {
                    let bpm = Operand::from_input(node.value_input("bpm", DEFAULT_BPM));
                    syscall_block(node, vec![bpm], exit, ctx)
                })
                .execute(|args, ctx, _| {
                    ctx.memory.assign(TEMPO_VAR, Value::from(arg(args, 0).as_number()));
                    None
                }),
        )
        .block(
            BlockDefinition::new("set_volume")
                .compile(|node, exit, ctx| {
                    let level = Operand::from_input(node.value_input("level", DEFAULT_VOLUME));
                    syscall_block(node, vec![level], exit, ctx)
                })
                .execute(move |args, _, now| {
                    let level = arg(args, 0).as_number();
                    volume.emit(Event::Volume {
                        level,
                        db: level_to_db(level),
                        at_ms: now,
                    });
                    None
                }),
        )
        .block(
            BlockDefinition::new("print")
                .compile(|node, exit, ctx| {
                    let message = Operand::from_input(node.value_input("message", ""));
                    syscall_block(node, vec![message], exit, ctx)
                })
                .execute(move |args, ctx, now| {
                    let message = arg(args, 0).to_string();
                    info!(thread = %ctx.thread_id, %message, "print");
                    print.emit(Event::Print { message, at_ms: now });
                    None
                }),
        )
}

/// `block_<type>_<id>: syscall <type>(args) ; jump exit`
fn syscall_block(node: &BlockNode, args: Vec<Operand>, exit: Label, ctx: &mut CompileCtx<'_>) -> Label {
    let label = ctx.new_block(&format!("block_{}_{}", node.block_type, node.id));
    ctx.emit(
        &label,
        Instruction::syscall(node.block_type.clone(), args).from_node(node.id.clone()),
    );
    ctx.emit(&label, Instruction::jump(exit));
    label
}

fn beats(node: &BlockNode) -> Operand {
    Operand::from_input(node.value_input("beats", 1))
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::ZERO)
}

/// Current tempo of the thread; unset or non-positive means the default.
pub fn tempo(ctx: &ExecutionContext) -> f64 {
    match ctx.memory.query(TEMPO_VAR).map(Value::as_number) {
        Some(bpm) if bpm > 0.0 => bpm,
        _ => DEFAULT_BPM,
    }
}

fn beats_to_ms(beats: Value, ctx: &ExecutionContext) -> f64 {
    beats.as_number() * 60_000.0 / tempo(ctx)
}

/// Approximate gain for a 0-100 volume level.
pub fn level_to_db(level: f64) -> f64 {
    if level <= 0.0 {
        -100.0
    } else {
        20.0 * (level / 100.0).log10()
    }
}

/// Note name for a pitch input. Numbers are MIDI note numbers (60 = C4);
/// anything else is used as written.
pub fn pitch_name(pitch: &Value) -> String {
    match pitch {
        Value::Number(n) if n.fract() == 0.0 && (0.0..=127.0).contains(n) => {
            let midi = *n as usize;
            let octave = (midi / 12) as i32 - 1;
            format!("{}{octave}", NOTE_NAMES[midi % 12])
        }
        other => other.to_string(),
    }
}
