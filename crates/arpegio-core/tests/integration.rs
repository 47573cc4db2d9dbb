//! End-to-end scenarios for the arpeggiation engine.
//!
//! Drives the public API the way an audio host would: key events first,
//! then one `process_cycle` per block, recording everything through an
//! [`EventLog`].

use arpegio_core::{Arpeggiator, EventLog, NoteEvent, NoteEventKind};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK: usize = 512;
const RATE: f32 = 4.0;

/// Run `cycles` blocks and collect `(cycle, event)` pairs.
fn run_cycles(
    arp: &mut Arpeggiator,
    cycles: usize,
    rate: f32,
    gate: f32,
) -> Vec<(usize, NoteEvent)> {
    let mut log = EventLog::new();
    let mut out = Vec::new();
    for cycle in 0..cycles {
        log.clear();
        arp.process_cycle(BLOCK, rate, gate, &mut log);
        for &event in log.events() {
            out.push((cycle, event));
        }
    }
    out
}

fn note_ons(events: &[(usize, NoteEvent)]) -> Vec<(usize, NoteEvent)> {
    events
        .iter()
        .copied()
        .filter(|(_, e)| e.kind == NoteEventKind::NoteOn)
        .collect()
}

#[test]
fn triad_cycles_round_robin_in_press_order() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.8);
    arp.note_on(64, 0.8);
    arp.note_on(67, 0.8);

    let events = run_cycles(&mut arp, 150, RATE, 1.0);
    let ons = note_ons(&events);

    // First note fires on the very first cycle, at its start
    assert_eq!(ons[0].0, 0);
    assert_eq!(ons[0].1.note, 60);
    assert_eq!(ons[0].1.offset, 0);

    // Press order repeats: 60, 64, 67, 60, ...
    let expected = [60u8, 64, 67];
    for (i, (_, event)) in ons.iter().enumerate() {
        assert_eq!(event.note, expected[i % 3], "note-on #{i}");
    }
    assert!(ons.len() >= 6, "expected at least two full laps");

    // At 4 notes/sec and 512-sample blocks a note lasts 23.4375 cycles
    for pair in ons.windows(2) {
        let gap = pair[1].0 - pair[0].0;
        assert!((23..=24).contains(&gap), "handover gap {gap}");
    }

    // Every handover releases the previous note within the same cycle
    for (cycle, event) in &ons[1..] {
        let off = events
            .iter()
            .find(|(c, e)| c == cycle && e.kind == NoteEventKind::NoteOff)
            .unwrap_or_else(|| panic!("no note-off in handover cycle {cycle}"));
        let prev_idx = ons.iter().position(|(c, _)| c == cycle).unwrap() - 1;
        assert_eq!(off.1.note, ons[prev_idx].1.note);
        // Full gate: release and retrigger coincide at the phase wrap
        assert!(off.1.offset.abs_diff(event.offset) <= 1);
    }

    // First handover lands where the phase wraps: 23 cycles in, the
    // remaining 0.018667 of phase crosses zero 224 samples into the block.
    let (_, first_handover) = ons[1];
    assert!(
        first_handover.offset.abs_diff(224) <= 2,
        "handover offset {} not near 224",
        first_handover.offset
    );
}

#[test]
fn idle_engine_stays_silent() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    let events = run_cycles(&mut arp, 64, RATE, 1.0);
    assert!(events.is_empty());
    assert_eq!(arp.held_count(), 0);
    assert_eq!(arp.last_played(), None);
}

#[test]
fn releasing_only_note_emits_final_note_off() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(72, 0.6);

    let events = run_cycles(&mut arp, 4, RATE, 1.0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1.kind, NoteEventKind::NoteOn);

    arp.note_off(72);
    let events = run_cycles(&mut arp, 8, RATE, 1.0);

    assert_eq!(events.len(), 1, "exactly one trailing event");
    let (cycle, event) = events[0];
    assert_eq!(cycle, 0);
    assert_eq!(event.kind, NoteEventKind::NoteOff);
    assert_eq!(event.note, 72);
    assert_eq!(event.offset, 0);
}

#[test]
fn note_on_velocity_is_carried_through() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.25);
    arp.note_on(64, 0.75);

    let events = run_cycles(&mut arp, 60, RATE, 1.0);
    for (_, event) in note_ons(&events) {
        let expected = if event.note == 60 { 0.25 } else { 0.75 };
        assert!((event.velocity - expected).abs() < 1e-6);
    }
}

#[test]
fn sustained_note_survives_release_and_repress() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.8);
    arp.sustain_on();

    arp.note_off(60);
    assert!(arp.is_held(60));
    assert!(arp.is_sustained(60));

    // Re-press and re-release while sustain stays engaged
    arp.note_on(60, 0.5);
    arp.note_off(60);
    assert!(arp.is_held(60));
    assert_eq!(arp.pattern_len(), 1);

    // The engine keeps arpeggiating the sustained note
    let events = run_cycles(&mut arp, 30, RATE, 1.0);
    assert!(
        note_ons(&events).iter().all(|(_, e)| e.note == 60),
        "only the sustained note should play"
    );

    arp.sustain_off();
    assert!(!arp.is_held(60));
    assert_eq!(arp.pattern_len(), 0);

    // One trailing note-off, then silence
    let events = run_cycles(&mut arp, 8, RATE, 1.0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1.kind, NoteEventKind::NoteOff);
}

#[test]
fn sustain_partial_release_keeps_pressed_notes() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.8);
    arp.note_on(64, 0.8);
    arp.note_on(67, 0.8);
    arp.sustain_on();

    arp.note_off(60);
    arp.note_off(67);
    assert_eq!(arp.held_count(), 3);

    arp.sustain_off();
    assert_eq!(arp.held_count(), 1);
    assert!(arp.is_held(64));
    assert_eq!(arp.pattern_notes(), &[64]);
}

#[test]
fn gate_ratio_splits_note_into_sound_and_silence() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.8);
    arp.note_on(64, 0.8);

    let events = run_cycles(&mut arp, 60, RATE, 0.5);

    // With gate 0.5 the note-off lands roughly halfway through the note
    // period, in an earlier cycle than the next note-on.
    let first_off = events
        .iter()
        .find(|(_, e)| e.kind == NoteEventKind::NoteOff)
        .unwrap();
    let ons = note_ons(&events);
    assert!(first_off.0 > ons[0].0);
    assert!(first_off.0 < ons[1].0);

    // Threshold = lerp(0.12, 1.0, 0.5) = 0.56 of the period
    let period_cycles: f64 = 23.4375;
    let expected = (0.56 * period_cycles).floor() as usize;
    assert!(
        first_off.0.abs_diff(expected) <= 1,
        "note-off cycle {} not near {expected}",
        first_off.0
    );
}

#[test]
fn pattern_follows_membership_changes_mid_playback() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.8);
    arp.note_on(64, 0.8);
    arp.note_on(67, 0.8);

    let events = run_cycles(&mut arp, 50, RATE, 1.0);
    assert_eq!(note_ons(&events).last().unwrap().1.note, 67);

    // Drop the middle note and add a new one: 60, 67, 72 remain in
    // first-activation order.
    arp.note_off(64);
    arp.note_on(72, 0.8);
    assert_eq!(arp.pattern_notes(), &[60, 67, 72]);

    let events = run_cycles(&mut arp, 200, RATE, 1.0);
    let notes: Vec<u8> = note_ons(&events).iter().map(|(_, e)| e.note).collect();
    assert!(notes.len() >= 6);

    // Once playback settles, only the current members appear and 64 is gone
    assert!(notes.iter().all(|&n| [60, 67, 72].contains(&n)));

    // Consecutive laps preserve activation order
    for window in notes.windows(3).skip(1) {
        if window[0] == 60 {
            assert_eq!(window, &[60, 67, 72]);
        }
    }
}

#[test]
fn high_rate_never_strands_a_note() {
    let mut arp = Arpeggiator::new(SAMPLE_RATE);
    arp.note_on(60, 0.8);
    arp.note_on(64, 0.8);

    // 40 notes/sec puts the gate floor (0.03 * 40 = 1.2) above the full
    // note period; every retrigger must still release its predecessor.
    let events = run_cycles(&mut arp, 400, 40.0, 0.0);
    let mut sounding: Option<u8> = None;
    for (cycle, event) in events {
        match event.kind {
            NoteEventKind::NoteOn => {
                assert_eq!(sounding, None, "cycle {cycle}: note-on while sounding");
                sounding = Some(event.note);
            }
            NoteEventKind::NoteOff => {
                assert_eq!(sounding, Some(event.note), "cycle {cycle}: mismatched off");
                sounding = None;
            }
        }
    }
}
