//! Performance scripts: timed key events driving the renderer.
//!
//! One event per line, blank lines and `#` comments ignored:
//!
//! ```text
//! 0  on 60 0.8
//! 0  on 64 0.8
//! 10 sustain on
//! 12 off 60
//! 40 sustain off
//! ```
//!
//! The leading number is the cycle (audio block) before which the event is
//! applied.

use thiserror::Error;

/// Errors produced while parsing a performance script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The line does not match any known event form.
    #[error(
        "line {line}: expected `<cycle> on <note> <velocity>`, `<cycle> off <note>`, or `<cycle> sustain on|off`"
    )]
    Malformed {
        /// 1-based line number.
        line: usize,
    },
    /// A numeric field failed to parse.
    #[error("line {line}: {field} is not a valid number")]
    BadNumber {
        /// 1-based line number.
        line: usize,
        /// Which field failed.
        field: &'static str,
    },
    /// A note number outside the MIDI range.
    #[error("line {line}: note {value} outside 0..=127")]
    NoteRange {
        /// 1-based line number.
        line: usize,
        /// The offending value.
        value: u32,
    },
    /// A velocity outside the normalized range.
    #[error("line {line}: velocity {value} outside 0.0..=1.0")]
    VelocityRange {
        /// 1-based line number.
        line: usize,
        /// The offending value.
        value: f32,
    },
}

/// A key or sustain event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeyOp {
    /// Press a key.
    On {
        /// MIDI note number.
        note: u8,
        /// Normalized velocity.
        velocity: f32,
    },
    /// Release a key.
    Off {
        /// MIDI note number.
        note: u8,
    },
    /// Engage or release the sustain pedal.
    Sustain(bool),
}

/// A [`KeyOp`] scheduled before a given cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledOp {
    /// Cycle index the event is applied before.
    pub cycle: u64,
    /// The event itself.
    pub op: KeyOp,
}

/// Parse a script into events sorted by cycle (stable within a cycle).
pub fn parse(input: &str) -> Result<Vec<ScheduledOp>, ScriptError> {
    let mut ops = Vec::new();

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let text = raw.split('#').next().unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        let mut fields = text.split_whitespace();
        let cycle = fields
            .next()
            .ok_or(ScriptError::Malformed { line })?
            .parse::<u64>()
            .map_err(|_| ScriptError::BadNumber { line, field: "cycle" })?;
        let keyword = fields.next().ok_or(ScriptError::Malformed { line })?;

        let op = match keyword {
            "on" => {
                let note = parse_note(fields.next(), line)?;
                let velocity = fields
                    .next()
                    .ok_or(ScriptError::Malformed { line })?
                    .parse::<f32>()
                    .map_err(|_| ScriptError::BadNumber { line, field: "velocity" })?;
                if !(0.0..=1.0).contains(&velocity) {
                    return Err(ScriptError::VelocityRange { line, value: velocity });
                }
                KeyOp::On { note, velocity }
            }
            "off" => KeyOp::Off { note: parse_note(fields.next(), line)? },
            "sustain" => match fields.next() {
                Some("on") => KeyOp::Sustain(true),
                Some("off") => KeyOp::Sustain(false),
                _ => return Err(ScriptError::Malformed { line }),
            },
            _ => return Err(ScriptError::Malformed { line }),
        };

        if fields.next().is_some() {
            return Err(ScriptError::Malformed { line });
        }
        ops.push(ScheduledOp { cycle, op });
    }

    ops.sort_by_key(|op| op.cycle);
    Ok(ops)
}

fn parse_note(field: Option<&str>, line: usize) -> Result<u8, ScriptError> {
    let value = field
        .ok_or(ScriptError::Malformed { line })?
        .parse::<u32>()
        .map_err(|_| ScriptError::BadNumber { line, field: "note" })?;
    u8::try_from(value)
        .ok()
        .filter(|&n| n <= 127)
        .ok_or(ScriptError::NoteRange { line, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_script() {
        let script = "\
            # a short phrase\n\
            0 on 60 0.8\n\
            0 on 64 0.7\n\
            4 sustain on\n\
            6 off 60\n\
            20 sustain off  # release everything\n";
        let ops = parse(script).unwrap();

        assert_eq!(ops.len(), 5);
        assert_eq!(ops[0], ScheduledOp { cycle: 0, op: KeyOp::On { note: 60, velocity: 0.8 } });
        assert_eq!(ops[2], ScheduledOp { cycle: 4, op: KeyOp::Sustain(true) });
        assert_eq!(ops[3], ScheduledOp { cycle: 6, op: KeyOp::Off { note: 60 } });
        assert_eq!(ops[4], ScheduledOp { cycle: 20, op: KeyOp::Sustain(false) });
    }

    #[test]
    fn test_parse_sorts_by_cycle_keeping_line_order() {
        let ops = parse("8 off 60\n0 on 60 0.5\n8 on 64 0.5\n").unwrap();
        assert_eq!(ops[0].cycle, 0);
        // Same-cycle events keep their line order
        assert_eq!(ops[1].op, KeyOp::Off { note: 60 });
        assert_eq!(ops[2].op, KeyOp::On { note: 64, velocity: 0.5 });
    }

    #[test]
    fn test_parse_rejects_bad_note() {
        assert!(matches!(
            parse("0 on 200 0.5"),
            Err(ScriptError::NoteRange { line: 1, value: 200 })
        ));
    }

    #[test]
    fn test_parse_rejects_bad_velocity() {
        assert!(matches!(
            parse("0 on 60 1.5"),
            Err(ScriptError::VelocityRange { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_rejects_trailing_garbage() {
        assert!(matches!(
            parse("0 off 60 extra"),
            Err(ScriptError::Malformed { line: 1 })
        ));
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = parse("0 on 60 0.5\nnot-a-cycle on 60 0.5").unwrap_err();
        assert!(matches!(err, ScriptError::BadNumber { line: 2, field: "cycle" }));
    }
}
