//! The arpeggiation engine: note bookkeeping and the per-cycle clock.
//!
//! [`Arpeggiator`] owns three membership tables over the 128-note MIDI
//! space (held, pressed, sustained), the as-played pattern, and a phase
//! accumulator that advances once per audio cycle. Key events only mutate
//! bookkeeping; audio events are emitted exclusively by
//! [`process_cycle`](Arpeggiator::process_cycle).

use libm::floorf;

use crate::dispatch::VoiceDispatcher;
use crate::pattern::AsPlayedPattern;

/// Size of the MIDI note space covered by the membership tables.
const NOTE_COUNT: usize = 128;

/// Shortest time a triggered voice may sound, in seconds.
const MIN_VOICE_TIME: f32 = 0.01;

/// Time a released voice needs to complete its release tail, in seconds.
const VOICE_RELEASE_TIME: f32 = 0.02;

/// Progress through the current note's cycle.
///
/// `PendingRestart` replaces the classic "phase = 1.0" sentinel: it marks
/// the accumulator as not mid-cycle, so the very next processed cycle
/// wraps immediately and fires a note-on at its start. Entered on
/// construction and whenever the first key goes down after all keys were
/// up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    /// Not mid-cycle; the next cycle fires a note-on right away.
    PendingRestart,
    /// Mid-cycle position, nominally in `[0, 1)`.
    Running(f32),
}

impl Phase {
    /// Numeric phase value used by the cycle arithmetic.
    fn value(self) -> f32 {
        match self {
            Phase::PendingRestart => 1.0,
            Phase::Running(p) => p,
        }
    }
}

/// Real-time note arpeggiator.
///
/// Holds the set of active notes and steps through them in first-played
/// order, emitting at most one note-off and one note-on per audio cycle
/// through a [`VoiceDispatcher`], each tagged with the exact sample offset
/// inside the cycle where the phase crossing happened.
///
/// Key events (`note_on`, `note_off`, sustain) and `process_cycle` must be
/// called from the same execution context, key events first — see the
/// crate docs for the threading contract.
///
/// # Example
///
/// ```rust
/// use arpegio_core::{Arpeggiator, EventLog, NoteEventKind};
///
/// let mut arp = Arpeggiator::new(48000.0);
/// let mut voices = EventLog::new();
///
/// arp.note_on(60, 0.9);
/// arp.process_cycle(256, 8.0, 0.5, &mut voices);
///
/// // First key press fires on the next cycle, at its start
/// assert_eq!(voices.events()[0].kind, NoteEventKind::NoteOn);
/// assert_eq!(voices.events()[0].offset, 0);
/// ```
#[derive(Clone, Debug)]
pub struct Arpeggiator {
    /// Velocity per held note; `Some` iff the note is held.
    held: [Option<f32>; NOTE_COUNT],
    /// Keys physically down.
    pressed: [bool; NOTE_COUNT],
    /// Keys released while sustain was engaged.
    sustained: [bool; NOTE_COUNT],
    held_count: usize,
    pressed_count: usize,
    pattern: AsPlayedPattern,
    phase: Phase,
    /// Note currently sounding via this engine.
    last_played: Option<u8>,
    sustain: bool,
    sample_rate: f32,
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl Arpeggiator {
    /// Create a new arpeggiator at the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            held: [None; NOTE_COUNT],
            pressed: [false; NOTE_COUNT],
            sustained: [false; NOTE_COUNT],
            held_count: 0,
            pressed_count: 0,
            pattern: AsPlayedPattern::new(),
            phase: Phase::PendingRestart,
            last_played: None,
            sustain: false,
            sample_rate,
        }
    }

    /// Set the sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Get the sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Advance the engine by one audio cycle.
    ///
    /// * `block_size` - cycle length in samples (> 0)
    /// * `rate_hz` - notes per second for this cycle
    /// * `gate` - gate ratio in `[0, 1]`: fraction of the note period the
    ///   note sounds before being silenced. A floor of
    ///   `(MIN_VOICE_TIME + VOICE_RELEASE_TIME) * rate_hz` keeps every
    ///   note long enough to finish its release even at `gate` 0.
    ///
    /// With no held notes this silences the note still sounding (if any)
    /// at offset 0 and otherwise does nothing. A non-positive or
    /// non-finite rate advances nothing this cycle.
    pub fn process_cycle(
        &mut self,
        block_size: usize,
        rate_hz: f32,
        gate: f32,
        voices: &mut impl VoiceDispatcher,
    ) {
        if block_size == 0 {
            return;
        }

        if self.held_count == 0 {
            if let Some(note) = self.last_played.take() {
                voices.note_off(note, 0);
                #[cfg(feature = "tracing")]
                tracing::trace!(note, "arp: released trailing note");
            }
            return;
        }

        let delta_phase = rate_hz / self.sample_rate;
        let increment = delta_phase * block_size as f32;
        if !increment.is_finite() || increment <= 0.0 {
            return;
        }

        let min_gate = (MIN_VOICE_TIME + VOICE_RELEASE_TIME) * rate_hz;
        let gate_threshold = lerp(min_gate, 1.0, gate.clamp(0.0, 1.0));

        let phase = self.phase.value();
        let new_phase = phase + increment;

        if new_phase >= gate_threshold {
            if let Some(note) = self.last_played.take() {
                let offset = crossing_offset(gate_threshold, phase, delta_phase, block_size);
                voices.note_off(note, offset);
            }
        }

        if new_phase >= 1.0 {
            if let Some(note) = self.pattern.advance() {
                if let Some(velocity) = self.held[usize::from(note)] {
                    let offset = crossing_offset(1.0, phase, delta_phase, block_size);
                    // At extreme rates the gate floor can push the
                    // threshold past 1.0; release the outgoing note at the
                    // wrap so it is never left sounding.
                    if let Some(prev) = self.last_played.take() {
                        voices.note_off(prev, offset);
                    }
                    voices.note_on(note, velocity, offset);
                    self.last_played = Some(note);
                }
            }
            self.phase = Phase::Running(new_phase - 1.0);
        } else {
            self.phase = Phase::Running(new_phase);
        }
    }

    /// Activate a note.
    ///
    /// No-op if the note is already held (repeated presses change
    /// nothing). The first key pressed while no keys were down rewinds the
    /// pattern and arms [`Phase::PendingRestart`], so playback responds on
    /// the very next cycle.
    pub fn note_on(&mut self, note: u8, velocity: f32) {
        let idx = usize::from(note);
        if idx >= NOTE_COUNT || self.held[idx].is_some() {
            return;
        }

        if self.pressed_count == 0 {
            self.pattern.rewind();
            self.phase = Phase::PendingRestart;
        }

        self.held[idx] = Some(velocity);
        self.held_count += 1;
        self.pressed[idx] = true;
        self.pressed_count += 1;
        self.pattern.push(note);

        #[cfg(feature = "tracing")]
        tracing::trace!(note, velocity, "arp: note on");
    }

    /// Release a key.
    ///
    /// No-op if the key is not down. With sustain engaged the note moves
    /// to the sustained set and stays in the pattern; otherwise it is
    /// deactivated immediately.
    pub fn note_off(&mut self, note: u8) {
        let idx = usize::from(note);
        if idx >= NOTE_COUNT || !self.pressed[idx] {
            return;
        }

        if self.sustain {
            self.sustained[idx] = true;
        } else {
            self.deactivate(note);
        }

        self.pressed[idx] = false;
        self.pressed_count -= 1;

        #[cfg(feature = "tracing")]
        tracing::trace!(note, sustained = self.sustain, "arp: note off");
    }

    /// Engage sustain: released keys keep their notes active.
    pub fn sustain_on(&mut self) {
        self.sustain = true;
    }

    /// Release sustain.
    ///
    /// Every note whose key was released while sustain was engaged is
    /// deactivated now, in ascending pitch order.
    pub fn sustain_off(&mut self) {
        self.sustain = false;
        for idx in 0..NOTE_COUNT {
            if self.sustained[idx] {
                self.sustained[idx] = false;
                self.deactivate(idx as u8);
            }
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(held = self.held_count, "arp: sustain released");
    }

    /// Return to the just-constructed state.
    ///
    /// Does not emit a note-off for a note still sounding; hosts that
    /// reset mid-performance should silence their voices directly.
    pub fn reset(&mut self) {
        self.held = [None; NOTE_COUNT];
        self.pressed = [false; NOTE_COUNT];
        self.sustained = [false; NOTE_COUNT];
        self.held_count = 0;
        self.pressed_count = 0;
        self.pattern = AsPlayedPattern::new();
        self.phase = Phase::PendingRestart;
        self.last_played = None;
        self.sustain = false;
    }

    /// Number of currently held notes.
    pub fn held_count(&self) -> usize {
        self.held_count
    }

    /// Whether `note` is held (pressed, or released under sustain).
    pub fn is_held(&self, note: u8) -> bool {
        usize::from(note) < NOTE_COUNT && self.held[usize::from(note)].is_some()
    }

    /// Whether the key for `note` is physically down.
    pub fn is_pressed(&self, note: u8) -> bool {
        usize::from(note) < NOTE_COUNT && self.pressed[usize::from(note)]
    }

    /// Whether `note` is being kept alive by sustain.
    pub fn is_sustained(&self, note: u8) -> bool {
        usize::from(note) < NOTE_COUNT && self.sustained[usize::from(note)]
    }

    /// Whether sustain is currently engaged.
    pub fn sustain_active(&self) -> bool {
        self.sustain
    }

    /// The note currently sounding via this engine, if any.
    pub fn last_played(&self) -> Option<u8> {
        self.last_played
    }

    /// Number of notes in the pattern sequence.
    pub fn pattern_len(&self) -> usize {
        self.pattern.len()
    }

    /// The pattern notes in first-activation order.
    pub fn pattern_notes(&self) -> &[u8] {
        self.pattern.notes()
    }

    /// Current phase state.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Remove a note from the held set and the pattern.
    fn deactivate(&mut self, note: u8) {
        let idx = usize::from(note);
        if self.held[idx].take().is_some() {
            self.held_count -= 1;
        }
        self.pattern.remove(note);
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Sample offset within the cycle where the phase crossed `threshold`.
///
/// `delta_phase` is the per-sample increment and is guaranteed positive by
/// the caller. Clamped to the cycle so late or early crossings land on a
/// valid sample.
fn crossing_offset(threshold: f32, phase: f32, delta_phase: f32, block_size: usize) -> usize {
    let exact = (threshold - phase) / delta_phase;
    let max = (block_size - 1) as f32;
    floorf(exact.clamp(0.0, max)) as usize
}
