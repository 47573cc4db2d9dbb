//! As-played pattern memory.
//!
//! The pattern is the ordered list of currently held notes in
//! first-activation order, together with the round-robin cursor that
//! selects the next note to fire. A small linear list is deliberate:
//! patterns hold at most a handful of notes, and the observable ordering
//! behavior matters more than asymptotic cost.

/// Maximum number of notes a pattern can hold (one per MIDI note).
pub const MAX_PATTERN_NOTES: usize = 128;

/// Ordered note sequence with a round-robin cursor.
///
/// Activation appends at the end; deactivation removes the first matching
/// occurrence and reduces the cursor modulo the new length so it stays
/// valid. The cursor is `None` exactly when the sequence is empty or has
/// been rewound.
#[derive(Clone, Debug)]
pub struct AsPlayedPattern {
    notes: [u8; MAX_PATTERN_NOTES],
    len: usize,
    /// Index of the last note returned by [`advance`](Self::advance).
    cursor: Option<usize>,
}

impl Default for AsPlayedPattern {
    fn default() -> Self {
        Self::new()
    }
}

impl AsPlayedPattern {
    /// Create an empty pattern.
    pub fn new() -> Self {
        Self {
            notes: [0; MAX_PATTERN_NOTES],
            len: 0,
            cursor: None,
        }
    }

    /// Number of notes in the pattern.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the pattern holds no notes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the last note emitted, or `None` before the first advance.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// The notes in pattern order.
    pub fn notes(&self) -> &[u8] {
        &self.notes[..self.len]
    }

    /// Forget the cursor so the next advance starts from the first note.
    pub fn rewind(&mut self) {
        self.cursor = None;
    }

    /// Append a note at the end of the pattern.
    ///
    /// A full pattern ignores the push; with distinct MIDI notes the
    /// capacity can never be exceeded.
    pub fn push(&mut self, note: u8) {
        if self.len < MAX_PATTERN_NOTES {
            self.notes[self.len] = note;
            self.len += 1;
        }
    }

    /// Remove the first occurrence of `note`.
    ///
    /// Later duplicates (if a caller ever allowed them) are untouched.
    /// The cursor becomes `None` if the pattern empties, otherwise it is
    /// taken modulo the new length.
    pub fn remove(&mut self, note: u8) {
        let Some(pos) = self.notes[..self.len].iter().position(|&n| n == note) else {
            return;
        };
        for i in pos..self.len - 1 {
            self.notes[i] = self.notes[i + 1];
        }
        self.len -= 1;
        self.cursor = if self.len == 0 {
            None
        } else {
            self.cursor.map(|c| c % self.len)
        };
    }

    /// Advance the cursor one step round-robin and return the note there.
    ///
    /// Returns `None` on an empty pattern. After a rewind the first
    /// advance lands on index 0.
    pub fn advance(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let next = match self.cursor {
            None => 0,
            Some(c) => (c + 1) % self.len,
        };
        self.cursor = Some(next);
        Some(self.notes[next])
    }
}
