//! The seam between the arpeggiator and the voice subsystem.
//!
//! The engine never renders sound itself; it hands offset-tagged note
//! events to a [`VoiceDispatcher`]. [`EventLog`] is a recording
//! implementation used by the test suite and the offline renderer.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Receives note events scheduled by the arpeggiator.
///
/// Implemented by the voice-allocation subsystem. `offset` is the sample
/// position within the current cycle at which the event takes effect, in
/// `[0, block_size - 1]`.
pub trait VoiceDispatcher {
    /// Begin sounding `note` at `velocity` (0.0 to 1.0), `offset` samples
    /// into the current cycle.
    fn note_on(&mut self, note: u8, velocity: f32, offset: usize);

    /// Begin releasing the voice for `note`, `offset` samples into the
    /// current cycle.
    fn note_off(&mut self, note: u8, offset: usize);
}

/// Kind of a dispatched note event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteEventKind {
    /// A voice should start sounding.
    NoteOn,
    /// A voice should begin its release.
    NoteOff,
}

/// A single dispatched note event, as recorded by [`EventLog`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteEvent {
    /// Whether this is a note-on or note-off.
    pub kind: NoteEventKind,
    /// MIDI note number.
    pub note: u8,
    /// Velocity for note-on events; 0.0 for note-off.
    pub velocity: f32,
    /// Sample offset within the cycle that emitted the event.
    pub offset: usize,
}

/// Recording dispatcher.
///
/// Collects every event in dispatch order. Clear it between cycles to get
/// per-cycle views.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<NoteEvent>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events in dispatch order.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The most recently recorded event, if any.
    pub fn last(&self) -> Option<&NoteEvent> {
        self.events.last()
    }

    /// Discard all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl VoiceDispatcher for EventLog {
    fn note_on(&mut self, note: u8, velocity: f32, offset: usize) {
        self.events.push(NoteEvent {
            kind: NoteEventKind::NoteOn,
            note,
            velocity,
            offset,
        });
    }

    fn note_off(&mut self, note: u8, offset: usize) {
        self.events.push(NoteEvent {
            kind: NoteEventKind::NoteOff,
            note,
            velocity: 0.0,
            offset,
        });
    }
}
