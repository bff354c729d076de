#![allow(dead_code)]

use quadrature_core::time::instant_from_micros;
use quadrature_core::{Channel, EdgeEvent, EdgeSource, Level, PhaseState, QuadratureDecoder, Trigger};

/// Scriptable stand-in for a pair of GPIO lines.
#[derive(Debug, Default)]
pub struct FakeLines {
    pub phase: PhaseState,
    pub listening: [bool; 2],
    pub fail_listen: Option<Channel>,
    pub fail_level: bool,
    pub listen_calls: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LineError {
    Busy(Channel),
    Unreadable,
}

impl FakeLines {
    pub fn at(bits: u8) -> Self {
        Self {
            phase: PhaseState::from_bits(bits),
            ..Default::default()
        }
    }
}

impl EdgeSource for FakeLines {
    type Error = LineError;

    fn listen(&mut self, channel: Channel, trigger: Trigger) -> Result<(), LineError> {
        assert_eq!(trigger, Trigger::Both);
        self.listen_calls += 1;
        if self.fail_listen == Some(channel) {
            return Err(LineError::Busy(channel));
        }
        self.listening[channel as usize] = true;
        Ok(())
    }

    fn unlisten(&mut self, channel: Channel) -> Result<(), LineError> {
        self.listening[channel as usize] = false;
        Ok(())
    }

    fn level(&mut self, channel: Channel) -> Result<Level, LineError> {
        if self.fail_level {
            return Err(LineError::Unreadable);
        }
        Ok(self.phase.level(channel))
    }
}

pub const FORWARD_CYCLE: [u8; 4] = [0b01, 0b11, 0b10, 0b00];
pub const BACKWARD_CYCLE: [u8; 4] = [0b10, 0b11, 0b01, 0b00];

/// Event for a phase, attributed to whichever line differs from `last`.
pub fn event(last: u8, bits: u8, micros: u64) -> EdgeEvent {
    let channel = if (last ^ bits) & 0b10 != 0 {
        Channel::A
    } else {
        Channel::B
    };
    EdgeEvent::sampled(channel, PhaseState::from_bits(bits), instant_from_micros(micros))
}

/// Feeds phases in order, one microsecond apart after `start_micros`.
pub fn feed(decoder: &mut QuadratureDecoder, phases: &[u8], start_micros: u64) {
    for (i, &bits) in phases.iter().enumerate() {
        let last = decoder.last_phase().bits();
        decoder.on_edge(&event(last, bits, start_micros + i as u64));
    }
}

pub fn started(resolution: i32) -> QuadratureDecoder {
    let mut decoder = QuadratureDecoder::new();
    decoder.start(resolution, &mut FakeLines::at(0b00)).unwrap();
    decoder
}
