//! # Packet Word Layout and Protocol Types
//!
//! Core definitions for the 16-bit Power Functions packet word.
//!
//! ## Word Layout
//!
//! | Bits | Field | Valid when |
//! |------|-------|------------|
//! | 14 | Escape flag | always |
//! | 13–12 | Logical channel (0–3) | always |
//! | 10–8 | Mode code (0–7) | escape = 0 |
//! | 7–6 | BLUE 2-bit field | mode code = 1 |
//! | 5–4 | RED 2-bit field | mode code = 1 |
//!
//! The word is assumed to have passed LRC checking upstream; nothing here
//! validates integrity.

use crate::error::{PfReceiverError, Result};

/// Mask for the logical channel field (bits 13–12)
pub const PF_CHANNEL_MASK: u16 = 0x3000;

/// Shift for the logical channel field
pub const PF_CHANNEL_SHIFT: u16 = 12;

/// Escape flag bit position (bit 14)
pub const PF_ESCAPE_BIT: u16 = 14;

/// Mask for the mode code field (bits 10–8)
pub const PF_MODE_MASK: u16 = 0x0700;

/// Shift for the mode code field
pub const PF_MODE_SHIFT: u16 = 8;

/// Mask for the BLUE output 2-bit field (bits 7–6)
pub const PF_BLUE_FIELD_MASK: u16 = 0x00C0;

/// Shift for the BLUE output field
pub const PF_BLUE_FIELD_SHIFT: u16 = 6;

/// Mask for the RED output 2-bit field (bits 5–4)
pub const PF_RED_FIELD_MASK: u16 = 0x0030;

/// Shift for the RED output field
pub const PF_RED_FIELD_SHIFT: u16 = 4;

/// Number of addressable logical channels
pub const PF_NUM_CHANNELS: u8 = 4;

/// Number of outputs per logical channel (RED, BLUE)
pub const PF_NUM_SUBCHANNELS: usize = 2;

/// Maximum speed magnitude produced by any decoded mode
pub const PF_MAX_SPEED: i8 = 7;

/// Default per-output staleness threshold in milliseconds
pub const PF_TIMEOUT_DEFAULT_MS: u64 = 750;

/// Extracts the logical channel (0–3) from a packet word.
///
/// Useful for routing a word to the right decoder instance before any
/// decoder accepts it.
#[must_use]
pub fn channel_of(word: u16) -> u8 {
    ((word & PF_CHANNEL_MASK) >> PF_CHANNEL_SHIFT) as u8
}

/// Extracts the escape flag (0 or 1) from a packet word.
#[must_use]
pub fn escape_of(word: u16) -> u8 {
    ((word >> PF_ESCAPE_BIT) & 0x1) as u8
}

/// Extracts the 3-bit mode code from a packet word.
///
/// Only meaningful when the escape flag is 0.
#[must_use]
pub fn mode_code_of(word: u16) -> u8 {
    ((word & PF_MODE_MASK) >> PF_MODE_SHIFT) as u8
}

/// Extracts the BLUE output 2-bit field from a packet word.
///
/// Only meaningful in Combo Direct mode (mode code 1).
#[must_use]
pub fn blue_field_of(word: u16) -> u8 {
    ((word & PF_BLUE_FIELD_MASK) >> PF_BLUE_FIELD_SHIFT) as u8
}

/// Extracts the RED output 2-bit field from a packet word.
///
/// Only meaningful in Combo Direct mode (mode code 1).
#[must_use]
pub fn red_field_of(word: u16) -> u8 {
    ((word & PF_RED_FIELD_MASK) >> PF_RED_FIELD_SHIFT) as u8
}

/// One of the two independently driven outputs of a logical channel.
///
/// Used as the index type everywhere a per-output value is addressed, so
/// the "only two subchannels" invariant lives in the type system instead of
/// runtime range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subchannel {
    /// Output A, wire id 0
    Red = 0,
    /// Output B, wire id 1
    Blue = 1,
}

impl Subchannel {
    /// Converts a raw wire id (0 or 1) to a subchannel.
    ///
    /// # Errors
    ///
    /// Returns [`PfReceiverError::InvalidSubchannel`] for any other id.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Subchannel::Red),
            1 => Ok(Subchannel::Blue),
            other => Err(PfReceiverError::InvalidSubchannel(other)),
        }
    }

    /// Returns the raw wire id (0 for RED, 1 for BLUE).
    #[must_use]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Index into per-output arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Subchannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Subchannel::Red => write!(f, "RED"),
            Subchannel::Blue => write!(f, "BLUE"),
        }
    }
}

/// Operating mode latched from the most recent accepted packet.
///
/// Only [`Mode::ComboDirect`] has its payload interpreted; the remaining
/// variants record that the mode was seen without touching output state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No packet decoded yet
    Uninitialized,
    /// Escape flag set; Combo PWM payload, not interpreted
    ComboPwm,
    /// Mode code 0; payload not interpreted
    Extended,
    /// Mode code 1; fully decoded into per-output speed/brake
    ComboDirect,
    /// Mode codes 2–3; payload not interpreted
    Reserved(u8),
    /// Mode codes 4–7; payload not interpreted
    SingleOutput(u8),
}

impl Mode {
    /// Classifies a 3-bit mode code.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code & 0x7 {
            0 => Mode::Extended,
            1 => Mode::ComboDirect,
            c @ 2..=3 => Mode::Reserved(c),
            c => Mode::SingleOutput(c),
        }
    }

    /// Legacy signed representation: -2 uninitialized, -1 Combo PWM,
    /// 0–7 the raw mode code.
    #[must_use]
    pub fn code(self) -> i8 {
        match self {
            Mode::Uninitialized => -2,
            Mode::ComboPwm => -1,
            Mode::Extended => 0,
            Mode::ComboDirect => 1,
            Mode::Reserved(c) | Mode::SingleOutput(c) => c as i8,
        }
    }
}

/// Decoded drive state of one output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputState {
    /// Signed speed in [-7, 7]; 0 means no drive (float or just-braked)
    pub speed: i8,

    /// True when the output was commanded to brake-then-float rather than
    /// simply float
    pub brake: bool,
}

/// Maps a Combo Direct 2-bit field to its output state.
///
/// | field | speed | brake |
/// |-------|-------|-------|
/// | 0 | 0 | false |
/// | 1 | +7 | false |
/// | 2 | -7 | false |
/// | 3 | 0 | true |
///
/// Combo Direct is digital: forward/backward always drive at full speed.
#[must_use]
pub fn decode_combo_field(bits: u8) -> OutputState {
    match bits & 0x3 {
        0 => OutputState {
            speed: 0,
            brake: false,
        },
        1 => OutputState {
            speed: PF_MAX_SPEED,
            brake: false,
        },
        2 => OutputState {
            speed: -PF_MAX_SPEED,
            brake: false,
        },
        _ => OutputState {
            speed: 0,
            brake: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Field Extraction Tests ====================

    #[test]
    fn test_channel_extraction() {
        assert_eq!(channel_of(0x0000), 0);
        assert_eq!(channel_of(0x1000), 1);
        assert_eq!(channel_of(0x2000), 2);
        assert_eq!(channel_of(0x3000), 3);
        // Bits outside the channel field do not leak in
        assert_eq!(channel_of(0xCFFF), 0);
    }

    #[test]
    fn test_escape_extraction() {
        assert_eq!(escape_of(0x0000), 0);
        assert_eq!(escape_of(0x4000), 1);
        assert_eq!(escape_of(0xBFFF), 0);
    }

    #[test]
    fn test_mode_code_extraction() {
        assert_eq!(mode_code_of(0x0000), 0);
        assert_eq!(mode_code_of(0x0100), 1);
        assert_eq!(mode_code_of(0x0700), 7);
        assert_eq!(mode_code_of(0xF8FF), 0);
    }

    #[test]
    fn test_output_field_extraction() {
        // BLUE = bits 7-6, RED = bits 5-4
        let word = 0x00D0; // BLUE field = 0b11, RED field = 0b01
        assert_eq!(blue_field_of(word), 3);
        assert_eq!(red_field_of(word), 1);

        assert_eq!(blue_field_of(0x0000), 0);
        assert_eq!(red_field_of(0x0000), 0);
        assert_eq!(blue_field_of(0x00C0), 3);
        assert_eq!(red_field_of(0x0030), 3);
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(PF_CHANNEL_MASK, 0x3000);
        assert_eq!(PF_MODE_MASK, 0x0700);
        assert_eq!(PF_BLUE_FIELD_MASK, 0x00C0);
        assert_eq!(PF_RED_FIELD_MASK, 0x0030);
        assert_eq!(PF_NUM_CHANNELS, 4);
        assert_eq!(PF_TIMEOUT_DEFAULT_MS, 750);
    }

    // ==================== Subchannel Tests ====================

    #[test]
    fn test_subchannel_from_valid_id() {
        assert_eq!(Subchannel::from_id(0).unwrap(), Subchannel::Red);
        assert_eq!(Subchannel::from_id(1).unwrap(), Subchannel::Blue);
    }

    #[test]
    fn test_subchannel_from_invalid_id() {
        for id in [2u8, 5, 255] {
            match Subchannel::from_id(id) {
                Err(PfReceiverError::InvalidSubchannel(got)) => assert_eq!(got, id),
                other => panic!("Expected InvalidSubchannel, got: {:?}", other),
            }
        }
    }

    #[test]
    fn test_subchannel_ids_round_trip() {
        assert_eq!(Subchannel::Red.id(), 0);
        assert_eq!(Subchannel::Blue.id(), 1);
        assert_eq!(Subchannel::Red.index(), 0);
        assert_eq!(Subchannel::Blue.index(), 1);
    }

    #[test]
    fn test_subchannel_display() {
        assert_eq!(Subchannel::Red.to_string(), "RED");
        assert_eq!(Subchannel::Blue.to_string(), "BLUE");
    }

    // ==================== Mode Tests ====================

    #[test]
    fn test_mode_from_code() {
        assert_eq!(Mode::from_code(0), Mode::Extended);
        assert_eq!(Mode::from_code(1), Mode::ComboDirect);
        assert_eq!(Mode::from_code(2), Mode::Reserved(2));
        assert_eq!(Mode::from_code(3), Mode::Reserved(3));
        assert_eq!(Mode::from_code(4), Mode::SingleOutput(4));
        assert_eq!(Mode::from_code(7), Mode::SingleOutput(7));
    }

    #[test]
    fn test_mode_legacy_codes() {
        assert_eq!(Mode::Uninitialized.code(), -2);
        assert_eq!(Mode::ComboPwm.code(), -1);
        assert_eq!(Mode::Extended.code(), 0);
        assert_eq!(Mode::ComboDirect.code(), 1);
        assert_eq!(Mode::Reserved(3).code(), 3);
        assert_eq!(Mode::SingleOutput(6).code(), 6);
    }

    #[test]
    fn test_mode_code_round_trip() {
        for code in 0..8u8 {
            assert_eq!(Mode::from_code(code).code(), code as i8);
        }
    }

    // ==================== Combo Direct Table Tests ====================

    #[test]
    fn test_combo_field_float() {
        let state = decode_combo_field(0);
        assert_eq!(state.speed, 0);
        assert!(!state.brake);
    }

    #[test]
    fn test_combo_field_forward() {
        let state = decode_combo_field(1);
        assert_eq!(state.speed, 7);
        assert!(!state.brake);
    }

    #[test]
    fn test_combo_field_backward() {
        let state = decode_combo_field(2);
        assert_eq!(state.speed, -7);
        assert!(!state.brake);
    }

    #[test]
    fn test_combo_field_brake() {
        let state = decode_combo_field(3);
        assert_eq!(state.speed, 0);
        assert!(state.brake);
    }

    #[test]
    fn test_combo_field_speed_magnitudes() {
        // Combo Direct only ever produces -7, 0 or +7
        for bits in 0..4u8 {
            let state = decode_combo_field(bits);
            assert!(matches!(state.speed, -7 | 0 | 7));
        }
    }

    #[test]
    fn test_combo_field_ignores_high_bits() {
        // Only the low 2 bits are meaningful
        assert_eq!(decode_combo_field(0b101), decode_combo_field(0b01));
    }
}
