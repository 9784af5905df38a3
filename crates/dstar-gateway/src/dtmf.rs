// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DTMF-over-AMBE decoder and link-command grammar.
//!
//! Grounded bit-for-bit on `original_source/DStarBase/DTMF.h`: each 9-byte
//! AMBE+data frame is tested against a signal mask, and if the signal bit
//! is set the four symbol-carrying bits are extracted and matched against
//! one of 16 symbol tables. A digit is only accepted into the accumulated
//! command once the same symbol has been seen on four consecutive frames,
//! bounded by non-signal (silence) frames on either side, per `spec.md` §4.5.

/// Mask applied to each of the 9 frame bytes before comparing to [`DTMF_SIG`].
/// Bytes 4, 5, 7, 8 carry the symbol and are masked to zero here; they are
/// checked separately against [`SYM_MASK`].
const MASK: [u8; 9] = [0x82, 0x08, 0x20, 0x82, 0x00, 0x00, 0x82, 0x00, 0x00];
/// Expected signal-bit pattern once [`MASK`] is applied.
const SIG: [u8; 9] = [0x82, 0x08, 0x20, 0x82, 0x00, 0x00, 0x00, 0x00, 0x00];
/// Per-symbol-byte masks applied to frame bytes 4, 5, 7, 8 respectively.
const SYM_MASK: [u8; 4] = [0x10, 0x40, 0x08, 0x20];

/// The 16 DTMF symbols, in the order their bit patterns are tried.
const SYMBOLS: [(char, [u8; 4]); 16] = [
    ('0', [0x00, 0x40, 0x08, 0x20]),
    ('1', [0x00, 0x00, 0x00, 0x00]),
    ('2', [0x00, 0x40, 0x00, 0x00]),
    ('3', [0x10, 0x00, 0x00, 0x00]),
    ('4', [0x00, 0x00, 0x00, 0x20]),
    ('5', [0x00, 0x40, 0x00, 0x20]),
    ('6', [0x10, 0x00, 0x00, 0x20]),
    ('7', [0x00, 0x00, 0x08, 0x00]),
    ('8', [0x00, 0x40, 0x08, 0x00]),
    ('9', [0x10, 0x00, 0x08, 0x00]),
    ('A', [0x10, 0x40, 0x00, 0x00]),
    ('B', [0x10, 0x40, 0x00, 0x20]),
    ('C', [0x10, 0x40, 0x08, 0x00]),
    ('D', [0x10, 0x40, 0x08, 0x20]),
    ('S', [0x00, 0x00, 0x08, 0x20]),
    ('H', [0x10, 0x00, 0x08, 0x20]),
];

/// Number of consecutive identical decodes required to accept a digit.
const PRESS_THRESHOLD: u32 = 4;

/// Tries to decode a DTMF symbol out of a 9-byte AMBE+data frame.
/// Returns `None` for a silence (non-signal) frame or an unrecognized pattern.
fn decode_symbol(frame: &[u8; 9]) -> Option<char> {
    for i in 0..9 {
        if frame[i] & MASK[i] != SIG[i] {
            return None;
        }
    }
    let bits = [
        frame[4] & SYM_MASK[0],
        frame[5] & SYM_MASK[1],
        frame[7] & SYM_MASK[2],
        frame[8] & SYM_MASK[3],
    ];
    SYMBOLS
        .iter()
        .find(|(_, pattern)| *pattern == bits)
        .map(|(c, _)| *c)
}

/// Stateful DTMF decoder and command accumulator, one per repeater band.
#[derive(Debug, Default)]
pub struct Dtmf {
    data: String,
    command: Option<String>,
    last_char: Option<char>,
    press_count: u32,
    pressed: bool,
}

impl Dtmf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one 9-byte AMBE+data frame. `end` marks the final frame of the
    /// transmission (forces a flush of any in-progress digit, then reset).
    pub fn decode(&mut self, frame: &[u8; 9], end: bool) {
        match decode_symbol(frame) {
            Some(c) => {
                if self.pressed && self.last_char == Some(c) {
                    self.press_count += 1;
                } else {
                    self.pressed = true;
                    self.last_char = Some(c);
                    self.press_count = 1;
                }
                if self.press_count == PRESS_THRESHOLD {
                    self.data.push(c);
                }
            }
            None => {
                self.pressed = false;
                self.press_count = 0;
                self.last_char = None;
            }
        }

        if end {
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.data.is_empty() {
            return;
        }
        self.command = translate_grammar(&self.data);
        self.data.clear();
    }

    pub fn has_command(&self) -> bool {
        self.command.is_some()
    }

    /// Returns the translated link command, clearing it from internal state.
    pub fn translate(&mut self) -> String {
        self.command.take().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Translates an accumulated digit string into a canonical 8-byte `urCall`
/// link command of the form `DCSxxxML` (dialect name, 3-digit room number,
/// module letter, terminal `L`).
///
/// Accepts both encodings named in `spec.md` §9's second open question:
/// a trailing single letter `A`-`D` selects the module directly, while a
/// trailing 2-digit number `01`-`04` selects module `A`-`D` by ordinal.
fn translate_grammar(data: &str) -> Option<String> {
    let rest = data.strip_prefix('D')?;
    if rest.len() < 3 {
        return None;
    }
    let (room, module_part) = rest.split_at(3);
    if !room.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let module = if module_part.len() == 1 {
        let c = module_part.chars().next()?;
        if ('A'..='D').contains(&c) {
            c
        } else {
            return None;
        }
    } else if module_part.len() == 2 {
        let n: u32 = module_part.parse().ok()?;
        if (1..=4).contains(&n) {
            (b'A' + (n as u8 - 1)) as char
        } else {
            return None;
        }
    } else {
        return None;
    };

    Some(format!("DCS{}{}L", room, module))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(sym: [u8; 4]) -> [u8; 9] {
        [
            SIG[0],
            SIG[1],
            SIG[2],
            SIG[3],
            SIG[4] | sym[0],
            SIG[5] | sym[1],
            SIG[6],
            SIG[7] | sym[2],
            SIG[8] | sym[3],
        ]
    }

    fn symbol_pattern(c: char) -> [u8; 4] {
        SYMBOLS.iter().find(|(s, _)| *s == c).unwrap().1
    }

    fn decode4(dtmf: &mut Dtmf, c: char, last: bool) {
        let frame = make_frame(symbol_pattern(c));
        dtmf.decode(&frame, false);
        dtmf.decode(&frame, false);
        dtmf.decode(&frame, false);
        dtmf.decode(&frame, last);
    }

    fn gap(dtmf: &mut Dtmf, n: usize, end: bool) {
        let silence = [0u8; 9];
        for _ in 0..n {
            dtmf.decode(&silence, end);
        }
    }

    #[test]
    fn module_as_number_link() {
        let mut dtmf = Dtmf::new();
        for c in ['D', '0', '1', '8', '0'] {
            decode4(&mut dtmf, c, false);
            gap(&mut dtmf, 10, false);
        }
        decode4(&mut dtmf, '4', false);
        gap(&mut dtmf, 10, true);

        assert!(dtmf.has_command());
        assert_eq!(dtmf.translate(), "DCS018DL");
    }

    #[test]
    fn module_as_letter_link() {
        let mut dtmf = Dtmf::new();
        for c in ['D', '0', '1', '8'] {
            decode4(&mut dtmf, c, false);
            gap(&mut dtmf, 10, false);
        }
        decode4(&mut dtmf, 'D', false);
        gap(&mut dtmf, 10, true);

        assert!(dtmf.has_command());
        assert_eq!(dtmf.translate(), "DCS018DL");
    }

    #[test]
    fn silence_without_threshold_presses_is_idempotent() {
        let mut dtmf = Dtmf::new();
        let frame = make_frame(symbol_pattern('9'));
        dtmf.decode(&frame, false);
        dtmf.decode(&frame, false);
        gap(&mut dtmf, 10, true);
        assert!(!dtmf.has_command());
    }

    #[test]
    fn unmatched_grammar_leaves_no_command() {
        let mut dtmf = Dtmf::new();
        for c in ['9', '9', '9'] {
            decode4(&mut dtmf, c, false);
            gap(&mut dtmf, 10, false);
        }
        gap(&mut dtmf, 10, true);
        assert!(!dtmf.has_command());
    }
}
