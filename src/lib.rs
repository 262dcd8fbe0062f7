//! # PF Receiver Library
//!
//! Decode Power Functions IR remote packets into per-output motor commands.
//!
//! This library provides the logical decoder for the 16-bit Power Functions
//! IR protocol: channel filtering, mode dispatch, Combo Direct speed/brake
//! derivation for the RED and BLUE outputs, and per-output staleness
//! tracking. IR reception, demodulation and LRC checking happen upstream;
//! the decoder is handed already-validated 16-bit words.

pub mod clock;
pub mod config;
pub mod error;
pub mod protocol;
