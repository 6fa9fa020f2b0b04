//! Input Intents
//!
//! Abstract player intents for one tick, packed into a bit field.
//! Device handling lives outside the engine; the host maps keys or
//! buttons onto these flags.
//!
//! Interaction is edge-triggered: holding the interact button opens at
//! most one question.

use serde::{Serialize, Deserialize};

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Intents held during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Packed intent bits:
    /// - Bit 0: move left
    /// - Bit 1: move right
    /// - Bit 2: jump
    /// - Bit 3: interact
    /// - Bit 4-7: reserved
    pub flags: u8,
}

impl InputFrame {
    pub const FLAG_MOVE_LEFT: u8 = 0x01;
    pub const FLAG_MOVE_RIGHT: u8 = 0x02;
    pub const FLAG_JUMP: u8 = 0x04;
    pub const FLAG_INTERACT: u8 = 0x08;

    /// No intents held.
    pub const fn new() -> Self {
        Self { flags: 0 }
    }

    /// Frame holding exactly `flags`.
    pub const fn with_flags(flags: u8) -> Self {
        Self { flags }
    }

    /// Frame with only interact held.
    pub const fn interact() -> Self {
        Self::with_flags(Self::FLAG_INTERACT)
    }

    #[inline]
    fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn move_left(&self) -> bool {
        self.has(Self::FLAG_MOVE_LEFT)
    }

    #[inline]
    pub fn move_right(&self) -> bool {
        self.has(Self::FLAG_MOVE_RIGHT)
    }

    #[inline]
    pub fn jump(&self) -> bool {
        self.has(Self::FLAG_JUMP)
    }

    #[inline]
    pub fn interact_held(&self) -> bool {
        self.has(Self::FLAG_INTERACT)
    }

    /// Horizontal direction: -1 left, 1 right, 0 for neither or both.
    pub fn horizontal(&self) -> i32 {
        match (self.move_left(), self.move_right()) {
            (true, false) => -1,
            (false, true) => 1,
            _ => 0,
        }
    }

    /// Flags held now but not in `prev`.
    #[inline]
    pub fn just_pressed(&self, prev: InputFrame) -> u8 {
        self.flags & !prev.flags
    }

    /// Was interact pressed this tick (not merely held)?
    #[inline]
    pub fn interact_pressed(&self, prev: InputFrame) -> bool {
        self.just_pressed(prev) & Self::FLAG_INTERACT != 0
    }

    /// Set or clear `flag`.
    #[inline]
    pub fn set(&mut self, flag: u8, held: bool) {
        if held {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Is nothing held?
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.flags == 0
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Input state that began at `at` (virtual ms).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDelta {
    pub at: u64,
    pub frame: InputFrame,
}

/// Delta-compressed input log for replaying a session.
///
/// Only changes are stored, so held buttons cost nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InputRecording {
    deltas: Vec<InputDelta>,
    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the frame seen at `at`. Stored only if it changed.
    pub fn record(&mut self, at: u64, frame: InputFrame) {
        if frame != self.last_frame {
            self.deltas.push(InputDelta { at, frame });
            self.last_frame = frame;
        }
    }

    /// Frame in effect at `at`.
    pub fn input_at(&self, at: u64) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.at <= at);
        match idx {
            0 => InputFrame::new(),
            i => self.deltas[i - 1].frame,
        }
    }

    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }
}

// =============================================================================
// TESTS
// =============================================================================
