//! Packed per-frame controls for the fixed-clock driver.
//!
//! One byte per frame; bits above `INPUT_PAUSE` carry nothing and are
//! dropped on decode.

pub const INPUT_LEFT: u8 = 1 << 0;
pub const INPUT_RIGHT: u8 = 1 << 1;
pub const INPUT_FIRE: u8 = 1 << 2;
pub const INPUT_PAUSE: u8 = 1 << 3;

/// Controls applied during one frame. `pause` is an edge: it toggles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameInput {
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub pause: bool,
}

impl FrameInput {
    pub fn to_bits(self) -> u8 {
        [
            (self.left, INPUT_LEFT),
            (self.right, INPUT_RIGHT),
            (self.fire, INPUT_FIRE),
            (self.pause, INPUT_PAUSE),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .fold(0, |bits, (_, flag)| bits | flag)
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            left: bits & INPUT_LEFT != 0,
            right: bits & INPUT_RIGHT != 0,
            fire: bits & INPUT_FIRE != 0,
            pause: bits & INPUT_PAUSE != 0,
        }
    }
}

impl From<u8> for FrameInput {
    fn from(bits: u8) -> Self {
        Self::from_bits(bits)
    }
}

impl From<FrameInput> for u8 {
    fn from(input: FrameInput) -> Self {
        input.to_bits()
    }
}
