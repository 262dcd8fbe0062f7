//! # Power Functions Protocol Module
//!
//! Logical decoding of the 16-bit Power Functions IR protocol.
//!
//! This module handles:
//! - Bit-field extraction from the 16-bit packet word
//! - Mode dispatch (Combo Direct decoded, other modes recognized only)
//! - Per-output speed/brake derivation for RED and BLUE
//! - Per-output staleness tracking against a shared last-accepted timestamp

pub mod fields;
pub mod decoder;
