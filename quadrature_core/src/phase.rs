//! Line levels, the 2-bit phase state and the transition table.

/// Logical level of one digital line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    #[default]
    Low,
    High,
}

impl Level {
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }

    const fn bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// One of the two encoder lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    A,
    B,
}

impl Channel {
    pub const fn other(self) -> Channel {
        match self {
            Channel::A => Channel::B,
            Channel::B => Channel::A,
        }
    }

    // Bit position inside a PhaseState, A is the high bit.
    const fn shift(self) -> u8 {
        match self {
            Channel::A => 1,
            Channel::B => 0,
        }
    }
}

/// Both line levels packed as `(A << 1) | B`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseState(u8);

impl PhaseState {
    pub const fn new(a: Level, b: Level) -> Self {
        Self((a.bit() << 1) | b.bit())
    }

    /// Only the two low bits are kept.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b11)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn level(self, channel: Channel) -> Level {
        if (self.0 >> channel.shift()) & 1 == 1 {
            Level::High
        } else {
            Level::Low
        }
    }

    pub const fn with_level(self, channel: Channel, level: Level) -> Self {
        let mask = 1 << channel.shift();
        Self((self.0 & !mask) | (level.bit() << channel.shift()))
    }
}

/// Classification of a single phase transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// No transition: same phase twice.
    #[default]
    Stop,
    Forward,
    Backward,
    /// Two-step skip, a missed edge or noise.
    Invalid,
}

use Direction::{Backward as B, Forward as F, Invalid as X, Stop as S};

// Indexed by (last << 2) | new. Forward is 00 -> 01 -> 11 -> 10 -> 00.
// Wiring that runs the other way is handled by `Orientation`, not here.
const TRANSITIONS: [Direction; 16] = [
    S, F, B, X, // from 00
    B, S, X, F, // from 01
    F, X, S, B, // from 10
    X, B, F, S, // from 11
];

impl Direction {
    pub const fn between(last: PhaseState, new: PhaseState) -> Direction {
        TRANSITIONS[((last.0 << 2) | new.0) as usize]
    }

    pub const fn reversed(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
            other => other,
        }
    }

    /// Tick delta contributed by this transition.
    pub const fn step(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
            Direction::Stop | Direction::Invalid => 0,
        }
    }
}

/// Which way round the A/B lines are wired relative to "forward".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    #[default]
    Normal,
    Reversed,
}

impl Orientation {
    pub const fn apply(self, direction: Direction) -> Direction {
        match self {
            Orientation::Normal => direction,
            Orientation::Reversed => direction.reversed(),
        }
    }
}
