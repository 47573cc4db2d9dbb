//! The `render` subcommand: run the engine offline and print the schedule.

use std::path::PathBuf;

use anyhow::Context;
use arpegio_core::{Arpeggiator, EventLog, NoteEventKind};
use clap::Args;
use serde::Serialize;

use crate::script::{self, KeyOp, ScheduledOp};

/// Arguments for `arpegio render`.
#[derive(Args)]
pub struct RenderArgs {
    /// Notes held for the whole render, e.g. "60,64,67"
    #[arg(long, value_delimiter = ',', conflicts_with = "script")]
    notes: Vec<u8>,

    /// Performance script file (see `script` module docs for the format)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Velocity used for --notes presses (0-1)
    #[arg(long, default_value = "0.8")]
    velocity: f32,

    /// Arpeggiator rate in notes per second
    #[arg(long, default_value = "4.0")]
    rate: f32,

    /// Gate ratio (0-1)
    #[arg(long, default_value = "0.8")]
    gate: f32,

    /// Number of cycles to render
    #[arg(long, default_value = "64")]
    cycles: u64,

    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    sample_rate: f32,

    /// Cycle length in samples
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Emit the schedule as JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// One row of the rendered schedule.
#[derive(Serialize)]
struct ScheduledEvent {
    cycle: u64,
    /// Absolute sample position from the start of the render.
    sample: u64,
    kind: &'static str,
    note: u8,
    velocity: f32,
    offset: usize,
}

/// Render the performance and print or export the event schedule.
pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let ops = load_ops(&args)?;

    let mut arp = Arpeggiator::new(args.sample_rate);
    let mut log = EventLog::new();
    let mut schedule = Vec::new();
    let mut next_op = 0;

    for cycle in 0..args.cycles {
        // Key events for this cycle are applied before processing it
        while next_op < ops.len() && ops[next_op].cycle <= cycle {
            match ops[next_op].op {
                KeyOp::On { note, velocity } => arp.note_on(note, velocity),
                KeyOp::Off { note } => arp.note_off(note),
                KeyOp::Sustain(true) => arp.sustain_on(),
                KeyOp::Sustain(false) => arp.sustain_off(),
            }
            next_op += 1;
        }

        log.clear();
        arp.process_cycle(args.block_size, args.rate, args.gate, &mut log);

        for event in log.events() {
            schedule.push(ScheduledEvent {
                cycle,
                sample: cycle * args.block_size as u64 + event.offset as u64,
                kind: match event.kind {
                    NoteEventKind::NoteOn => "on",
                    NoteEventKind::NoteOff => "off",
                },
                note: event.note,
                velocity: event.velocity,
                offset: event.offset,
            });
        }
    }

    tracing::debug!(events = schedule.len(), cycles = args.cycles, "render complete");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
    } else {
        println!(
            "{:>6} {:>10} {:>4} {:>4} {:>8} {:>6}",
            "cycle", "sample", "kind", "note", "velocity", "offset"
        );
        for event in &schedule {
            println!(
                "{:>6} {:>10} {:>4} {:>4} {:>8.3} {:>6}",
                event.cycle, event.sample, event.kind, event.note, event.velocity, event.offset
            );
        }
    }
    Ok(())
}

fn load_ops(args: &RenderArgs) -> anyhow::Result<Vec<ScheduledOp>> {
    if let Some(path) = &args.script {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        Ok(script::parse(&text)?)
    } else if args.notes.is_empty() {
        anyhow::bail!("nothing to play: pass --notes or --script");
    } else {
        Ok(args
            .notes
            .iter()
            .map(|&note| ScheduledOp {
                cycle: 0,
                op: KeyOp::On { note, velocity: args.velocity },
            })
            .collect())
    }
}
