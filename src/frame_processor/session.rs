// SPDX-License-Identifier: GPL-3.0-only

//! Decode session
//!
//! Accumulates the decoded text of each channel across passes until all
//! three are present, then merges them into the original payload.
//!
//! Merging walks the payloads position by position and emits the blue,
//! green and red character at each position, in that order. Every reset
//! advances the session generation so that completions from a pass started
//! before the reset can be recognised and dropped.

use crate::errors::SessionError;
use crate::frame_processor::types::Channel;
use tracing::{debug, trace};

/// What happened to a recorded decode result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// The slot now holds the text
    Stored,
    /// Empty text; the slot was left untouched
    Empty,
    /// The slot already held text for this session; nothing written
    AlreadyFilled,
    /// The session was reset since the caller's generation; nothing written
    Stale,
}

/// Three decode slots plus a generation counter
#[derive(Debug, Default, Clone)]
pub struct DecodeSession {
    slots: [String; 3],
    generation: u64,
}

impl DecodeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the current slot contents
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Decoded text held for a channel (empty if not yet decoded)
    pub fn slot(&self, channel: Channel) -> &str {
        &self.slots[channel.index()]
    }

    /// Fill state of each slot, in channel order
    pub fn filled(&self) -> [bool; 3] {
        std::array::from_fn(|i| !self.slots[i].is_empty())
    }

    /// Store decoded text for a channel
    ///
    /// Empty text is indistinguishable from "not decoded yet". A slot is
    /// written at most once per session; later text for a filled slot is
    /// dropped.
    pub fn record(&mut self, channel: Channel, text: &str) -> Recorded {
        if text.is_empty() {
            trace!(%channel, "Ignoring empty decode result");
            return Recorded::Empty;
        }
        if !self.slots[channel.index()].is_empty() {
            debug!(%channel, "Channel already decoded, keeping first result");
            return Recorded::AlreadyFilled;
        }
        debug!(%channel, len = text.chars().count(), "Channel decoded");
        self.slots[channel.index()] = text.to_string();
        Recorded::Stored
    }

    /// Like [`record`](Self::record), but only if no reset happened since
    /// `generation` was observed
    pub fn record_for(&mut self, generation: u64, channel: Channel, text: &str) -> Recorded {
        if generation != self.generation {
            debug!(
                %channel,
                stale = generation,
                current = self.generation,
                "Dropping decode result from a previous session"
            );
            return Recorded::Stale;
        }
        self.record(channel, text)
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| !s.is_empty())
    }

    /// Interleave the three payloads into the original message
    ///
    /// For each position `i`: blue[i], green[i], red[i]. Positions count
    /// Unicode scalar values. Payloads must share a length.
    pub fn reconstruct(&self) -> Result<String, SessionError> {
        if !self.is_complete() {
            let missing = Channel::ALL
                .into_iter()
                .filter(|c| self.slots[c.index()].is_empty())
                .collect();
            return Err(SessionError::Incomplete { missing });
        }

        let [red, green, blue] = &self.slots;
        let lengths = [red, green, blue].map(|s| s.chars().count());
        if lengths[0] != lengths[1] || lengths[0] != lengths[2] {
            return Err(SessionError::LengthMismatch {
                red: lengths[0],
                green: lengths[1],
                blue: lengths[2],
            });
        }

        let mut merged = String::with_capacity(red.len() + green.len() + blue.len());
        for ((r, g), b) in red.chars().zip(green.chars()).zip(blue.chars()) {
            merged.push(b);
            merged.push(g);
            merged.push(r);
        }
        Ok(merged)
    }

    /// Empty all slots and start a new generation
    pub fn reset(&mut self) {
        self.slots = Default::default();
        self.generation = self.generation.wrapping_add(1);
        trace!(generation = self.generation, "Session reset");
    }

    /// Merge and reset in one step once every slot is filled
    ///
    /// Returns `None` while slots are still missing. A length mismatch also
    /// resets: those slots can never merge, and keeping them would stop the
    /// separator from ever retrying their channels.
    pub fn take_completed(&mut self) -> Option<Result<String, SessionError>> {
        if !self.is_complete() {
            return None;
        }
        let result = self.reconstruct();
        self.reset();
        Some(result)
    }
}
