//! # Channel Decoder
//!
//! Per-channel decoding and staleness tracking for Power Functions packets.
//!
//! One `ChannelDecoder` is instantiated per logical channel (0–3) the
//! surrounding system listens on; instances coexist independently and each
//! ignores packets addressed to other channels. The decoder assumes the
//! words it is handed already passed link-layer integrity checking.
//!
//! ## Staleness
//!
//! Both outputs share one last-accepted timestamp: any channel-matching
//! packet of any mode refreshes both outputs' staleness clocks, even when
//! only one output's state was relevant. This mirrors the transmitter-side
//! keepalive behavior of the remote and is intentional.

use tracing::{debug, error, trace, warn};

use super::fields::{
    blue_field_of, channel_of, decode_combo_field, escape_of, mode_code_of, red_field_of, Mode,
    OutputState, Subchannel, PF_NUM_SUBCHANNELS, PF_TIMEOUT_DEFAULT_MS,
};
use crate::clock::MonotonicClock;
use crate::error::{PfReceiverError, Result};

/// Decodes packets for one logical channel and tracks per-output staleness.
///
/// # Examples
///
/// ```
/// use pf_receiver::clock::SystemClock;
/// use pf_receiver::protocol::decoder::ChannelDecoder;
///
/// // Listen on channel 2; word: escape 0, mode 1, BLUE forward, RED brake
/// let mut decoder = ChannelDecoder::new(2, SystemClock::new());
/// decoder.process(0x2170)?;
///
/// assert_eq!(decoder.blue_speed(), 7);
/// assert_eq!(decoder.red_speed(), 0);
/// assert!(decoder.is_red_braking());
/// # Ok::<(), pf_receiver::error::PfReceiverError>(())
/// ```
#[derive(Debug)]
pub struct ChannelDecoder<C: MonotonicClock> {
    /// Monotonic time source, read on every accepted packet and staleness query
    clock: C,

    /// Logical channel this instance accepts (0–3), fixed at construction
    listen_channel: u8,

    /// Escape flag of the most recent accepted packet
    escape: u8,

    /// Mode latched from the most recent accepted packet
    mode: Mode,

    /// Decoded drive state per output, indexed by [`Subchannel`]
    outputs: [OutputState; PF_NUM_SUBCHANNELS],

    /// Raw word of the most recent accepted packet
    last_word: u16,

    /// Clock reading when the last channel-matching packet was accepted;
    /// shared by both outputs
    last_accepted_ms: u64,

    /// Per-output staleness threshold in milliseconds
    timeout_ms: [u64; PF_NUM_SUBCHANNELS],
}

impl<C: MonotonicClock> ChannelDecoder<C> {
    /// Creates a decoder listening on the given logical channel.
    ///
    /// Only the low two bits of `listen_channel` are used (valid channels
    /// are 0–3). Both outputs start at float with the default 750 ms
    /// timeout, and the staleness clock starts at the clock's current
    /// reading, so a decoder that never accepts a packet still goes stale
    /// once the window elapses.
    #[must_use]
    pub fn new(listen_channel: u8, clock: C) -> Self {
        let now_ms = clock.now_ms();
        Self {
            clock,
            listen_channel: listen_channel & 0x3,
            escape: 0,
            mode: Mode::Uninitialized,
            outputs: [OutputState::default(); PF_NUM_SUBCHANNELS],
            last_word: 0,
            last_accepted_ms: now_ms,
            timeout_ms: [PF_TIMEOUT_DEFAULT_MS; PF_NUM_SUBCHANNELS],
        }
    }

    /// Processes one already-validated 16-bit packet word.
    ///
    /// On a channel match the whole decoded bundle (escape, mode, outputs,
    /// raw word, timestamp) is committed as a unit; readers never observe a
    /// torn mix of old mode and new outputs. Only Combo Direct (mode code 1)
    /// updates output state; every other mode is latched without touching
    /// the outputs.
    ///
    /// # Errors
    ///
    /// Returns [`PfReceiverError::ChannelMismatch`] when the word is
    /// addressed to a different channel. No state changes in that case,
    /// including the staleness timestamp. Mismatches are expected in normal
    /// operation since many decoders may share one IR medium.
    pub fn process(&mut self, word: u16) -> Result<()> {
        // Stamp the receive time before decoding, like the radio side does
        let received_ms = self.clock.now_ms();

        let packet_channel = channel_of(word);
        if packet_channel != self.listen_channel {
            trace!(
                "Ignoring word 0x{:04X}: listening on channel {}, addressed to {}",
                word,
                self.listen_channel,
                packet_channel
            );
            return Err(PfReceiverError::ChannelMismatch {
                listening: self.listen_channel,
                got: packet_channel,
            });
        }

        let escape = escape_of(word);
        let mode = if escape == 1 {
            Mode::ComboPwm
        } else {
            Mode::from_code(mode_code_of(word))
        };

        // Outputs change only for payloads the decoder understands
        let outputs = if mode == Mode::ComboDirect {
            Self::decode_combo_direct(word)
        } else {
            self.outputs
        };

        self.escape = escape;
        self.mode = mode;
        self.outputs = outputs;
        self.last_word = word;
        self.last_accepted_ms = received_ms;

        debug!(
            "Channel {} accepted 0x{:04X}: mode {:?}, RED {:?}, BLUE {:?}",
            self.listen_channel,
            word,
            self.mode,
            self.outputs[Subchannel::Red.index()],
            self.outputs[Subchannel::Blue.index()]
        );

        Ok(())
    }

    /// Decodes the Combo Direct payload into both outputs' states.
    ///
    /// RED and BLUE map independently through the fixed 2-bit table; the
    /// order between them is not observable.
    fn decode_combo_direct(word: u16) -> [OutputState; PF_NUM_SUBCHANNELS] {
        let mut outputs = [OutputState::default(); PF_NUM_SUBCHANNELS];
        outputs[Subchannel::Red.index()] = decode_combo_field(red_field_of(word));
        outputs[Subchannel::Blue.index()] = decode_combo_field(blue_field_of(word));
        outputs
    }

    // ==================== Accessors ====================

    /// Logical channel this decoder listens on (0–3)
    #[must_use]
    pub fn listen_channel(&self) -> u8 {
        self.listen_channel
    }

    /// Escape flag of the most recent accepted packet (0 = mode word,
    /// 1 = Combo PWM)
    #[must_use]
    pub fn escape(&self) -> u8 {
        self.escape
    }

    /// Mode latched from the most recent accepted packet
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Decoded drive state of one output
    #[must_use]
    pub fn output(&self, subchannel: Subchannel) -> OutputState {
        self.outputs[subchannel.index()]
    }

    /// Speed of the RED output: 0 for float, ±7 when driven
    #[must_use]
    pub fn red_speed(&self) -> i8 {
        self.output(Subchannel::Red).speed
    }

    /// Speed of the BLUE output: 0 for float, ±7 when driven
    #[must_use]
    pub fn blue_speed(&self) -> i8 {
        self.output(Subchannel::Blue).speed
    }

    /// True when the RED output was commanded to brake-then-float
    #[must_use]
    pub fn is_red_braking(&self) -> bool {
        self.output(Subchannel::Red).brake
    }

    /// True when the BLUE output was commanded to brake-then-float
    #[must_use]
    pub fn is_blue_braking(&self) -> bool {
        self.output(Subchannel::Blue).brake
    }

    /// Speed looked up by raw wire id, legacy surface.
    ///
    /// Returns 0 for any id other than 0 (RED) and 1 (BLUE) as a defensive
    /// default. Callers that want to distinguish "floating" from "malformed
    /// question" should go through [`Subchannel::from_id`] and
    /// [`output`](Self::output).
    #[must_use]
    pub fn speed_by_id(&self, subchannel_id: u8) -> i8 {
        match Subchannel::from_id(subchannel_id) {
            Ok(subchannel) => self.output(subchannel).speed,
            Err(_) => {
                warn!(
                    "speed_by_id: invalid subchannel id {}, returning 0",
                    subchannel_id
                );
                0
            }
        }
    }

    /// Raw word of the most recent accepted packet
    #[must_use]
    pub fn last_word(&self) -> u16 {
        self.last_word
    }

    /// Clock reading when the last channel-matching packet was accepted
    #[must_use]
    pub fn last_accepted_ms(&self) -> u64 {
        self.last_accepted_ms
    }

    // ==================== Staleness ====================

    /// Sets the staleness threshold for one output in milliseconds.
    ///
    /// The two outputs are configured independently even though they share
    /// one last-accepted timestamp.
    pub fn set_timeout(&mut self, subchannel: Subchannel, timeout_ms: u64) {
        debug!(
            "Channel {}: timeout for {} set to {} ms",
            self.listen_channel, subchannel, timeout_ms
        );
        self.timeout_ms[subchannel.index()] = timeout_ms;
    }

    /// Configured staleness threshold for one output in milliseconds
    #[must_use]
    pub fn timeout(&self, subchannel: Subchannel) -> u64 {
        self.timeout_ms[subchannel.index()]
    }

    /// Signed distance to the staleness deadline in milliseconds.
    ///
    /// Computed as `now - last_accepted - timeout`: a value ≤ 0 means that
    /// much time remains before the output goes stale, a value > 0 means
    /// the timeout was exceeded that long ago.
    #[must_use]
    pub fn time_until_timeout(&self, subchannel: Subchannel) -> i64 {
        let now_ms = self.clock.now_ms();
        now_ms as i64 - self.last_accepted_ms as i64 - self.timeout_ms[subchannel.index()] as i64
    }

    /// True when no channel-matching packet arrived within the output's
    /// staleness window
    #[must_use]
    pub fn is_timed_out(&self, subchannel: Subchannel) -> bool {
        self.time_until_timeout(subchannel) > 0
    }

    // ==================== Legacy raw-id surface ====================

    /// Sets a staleness threshold by raw wire id, legacy surface.
    ///
    /// Ids other than 0 and 1 are a no-op.
    pub fn set_timeout_by_id(&mut self, subchannel_id: u8, timeout_ms: u64) {
        match Subchannel::from_id(subchannel_id) {
            Ok(subchannel) => self.set_timeout(subchannel, timeout_ms),
            Err(_) => {
                warn!(
                    "set_timeout_by_id: invalid subchannel id {}, ignoring",
                    subchannel_id
                );
            }
        }
    }

    /// [`time_until_timeout`](Self::time_until_timeout) by raw wire id,
    /// legacy surface.
    ///
    /// Logs an error and returns 0 for invalid ids.
    #[must_use]
    pub fn time_until_timeout_by_id(&self, subchannel_id: u8) -> i64 {
        match Subchannel::from_id(subchannel_id) {
            Ok(subchannel) => self.time_until_timeout(subchannel),
            Err(e) => {
                error!("time_until_timeout_by_id: {}", e);
                0
            }
        }
    }

    /// [`is_timed_out`](Self::is_timed_out) by raw wire id, legacy surface.
    ///
    /// Logs an error and returns false for invalid ids.
    #[must_use]
    pub fn is_timed_out_by_id(&self, subchannel_id: u8) -> bool {
        match Subchannel::from_id(subchannel_id) {
            Ok(subchannel) => self.is_timed_out(subchannel),
            Err(e) => {
                error!("is_timed_out_by_id: {}", e);
                false
            }
        }
    }
}
