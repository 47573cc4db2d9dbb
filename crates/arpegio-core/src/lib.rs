//! Arpegio Core - real-time note arpeggiation engine
//!
//! Turns a changing set of held keys into a stream of note-on/note-off
//! events, advanced once per audio cycle and tagged with sample-accurate
//! offsets into that cycle.
//!
//! # Core Abstractions
//!
//! - [`Arpeggiator`] - held-note bookkeeping plus the per-cycle phase
//!   state machine
//! - [`AsPlayedPattern`] - playback order memory (first-activation order,
//!   round-robin cursor)
//! - [`VoiceDispatcher`] - the seam to the voice subsystem that actually
//!   starts and stops sound
//! - [`EventLog`] - a recording dispatcher for tests and offline rendering
//!
//! # Example
//!
//! ```rust
//! use arpegio_core::{Arpeggiator, EventLog};
//!
//! let mut arp = Arpeggiator::new(48000.0);
//! let mut voices = EventLog::new();
//!
//! // Hold a C major triad
//! arp.note_on(60, 0.8);
//! arp.note_on(64, 0.8);
//! arp.note_on(67, 0.8);
//!
//! // Advance one 512-sample cycle at 4 notes/sec, gate ratio 0.8
//! arp.process_cycle(512, 4.0, 0.8, &mut voices);
//! assert_eq!(voices.events()[0].note, 60);
//! ```
//!
//! # Threading Contract
//!
//! The engine is single-owner: key events and `process_cycle` must be
//! applied from the same execution context, key events first. Hosts that
//! receive input on another thread are responsible for a wait-free handoff
//! (for example an SPSC queue of [`NoteEvent`]-like commands) before
//! calling in.
//!
//! # no_std Support
//!
//! Like the rest of a real-time audio stack, this crate is `no_std`
//! compatible (disable the default `std` feature) and performs no
//! allocation in the processing path.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod arpeggiator;
pub mod dispatch;
pub mod pattern;

pub use arpeggiator::{Arpeggiator, Phase};
pub use dispatch::{EventLog, NoteEvent, NoteEventKind, VoiceDispatcher};
pub use pattern::{AsPlayedPattern, MAX_PATTERN_NOTES};
