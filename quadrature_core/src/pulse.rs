//! Single-line counting, for encoders that only bring out one channel.

use log::info;

use crate::decoder::{start_decoder, stop_decoder, DecoderState, EdgeDecoder};
use crate::edge::{EdgeEvent, EdgeSource};
use crate::error::ConfigError;
use crate::phase::{Channel, Direction, Level, PhaseState};

/// Counts every edge on line A.
///
/// One line carries speed but no direction, so the count only goes up and
/// [`direction`](PulseCounter::direction) is always [`Direction::Forward`].
/// Events for line B are ignored.
#[derive(Debug, Clone, Default)]
pub struct PulseCounter {
    state: DecoderState,
    resolution: u32,
    count: u64,
    level: Level,
}

impl PulseCounter {
    /// Edges per encoder pulse on a single line: one rising, one falling.
    pub const EDGES_PER_PULSE: u32 = 2;

    pub const fn new() -> Self {
        Self {
            state: DecoderState::Stopped,
            resolution: 0,
            count: 0,
            level: Level::Low,
        }
    }

    /// Registers for both edges on A, seeds its level and zeroes the count.
    /// Same rules as [`QuadratureDecoder::start`](crate::QuadratureDecoder::start).
    pub fn start<S: EdgeSource>(
        &mut self,
        resolution: i32,
        source: &mut S,
    ) -> Result<(), ConfigError<S::Error>> {
        start_decoder(self, resolution, source)
    }

    pub fn stop<S: EdgeSource>(&mut self, source: &mut S) {
        stop_decoder(self, source);
    }

    /// Counts a level change on A. Anything else returns [`Direction::Stop`].
    pub fn on_edge(&mut self, event: &EdgeEvent) -> Direction {
        if self.state != DecoderState::Running || event.channel != Channel::A {
            return Direction::Stop;
        }

        let level = event.level();
        if level == self.level {
            return Direction::Stop;
        }

        self.level = level;
        self.count = self.count.saturating_add(1);
        Direction::Forward
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn direction(&self) -> Direction {
        Direction::Forward
    }

    pub fn revolutions(&self) -> f32 {
        match self.ticks_per_revolution() {
            0 => 0.0,
            per_rev => self.count as f32 / per_rev as f32,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DecoderState::Running
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn ticks_per_revolution(&self) -> u32 {
        self.resolution.saturating_mul(Self::EDGES_PER_PULSE)
    }
}

impl EdgeDecoder for PulseCounter {
    const CHANNELS: &'static [Channel] = &[Channel::A];

    fn reset(&mut self, resolution: u32) {
        *self = Self {
            resolution,
            ..Self::new()
        };
    }

    fn begin(&mut self, phase: PhaseState) {
        self.level = phase.level(Channel::A);
        self.state = DecoderState::Running;
        info!("pulse counter started: {} ppr", self.resolution);
    }

    fn freeze(&mut self) -> bool {
        let was_running = self.state == DecoderState::Running;
        if was_running {
            self.state = DecoderState::Stopped;
            info!("pulse counter stopped at {} edges", self.count);
        }
        was_running
    }

    fn on_edge(&mut self, event: &EdgeEvent) -> Direction {
        PulseCounter::on_edge(self, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Trigger;
    use crate::time::instant_from_micros;

    #[derive(Default)]
    struct OneLine {
        level: Level,
        listening: [bool; 2],
    }

    impl EdgeSource for OneLine {
        type Error = ();

        fn listen(&mut self, channel: Channel, _trigger: Trigger) -> Result<(), ()> {
            self.listening[channel as usize] = true;
            Ok(())
        }

        fn unlisten(&mut self, channel: Channel) -> Result<(), ()> {
            self.listening[channel as usize] = false;
            Ok(())
        }

        fn level(&mut self, channel: Channel) -> Result<Level, ()> {
            match channel {
                Channel::A => Ok(self.level),
                Channel::B => Err(()),
            }
        }
    }

    fn edge(channel: Channel, level: Level, micros: u64) -> EdgeEvent {
        EdgeEvent::new(channel, level, Level::Low, instant_from_micros(micros))
    }

    #[test]
    fn registers_and_reads_line_a_only() {
        let mut line = OneLine {
            level: Level::High,
            ..Default::default()
        };
        let mut counter = PulseCounter::new();
        counter.start(13, &mut line).unwrap();

        assert!(counter.is_running());
        assert_eq!(line.listening, [true, false]);
        assert_eq!(counter.ticks_per_revolution(), 26);

        counter.stop(&mut line);
        assert_eq!(line.listening, [false, false]);
    }

    #[test]
    fn both_edges_count_up() {
        let mut counter = PulseCounter::new();
        counter.start(2, &mut OneLine::default()).unwrap();

        for (i, level) in [Level::High, Level::Low, Level::High, Level::Low]
            .into_iter()
            .enumerate()
        {
            assert_eq!(counter.on_edge(&edge(Channel::A, level, i as u64)), Direction::Forward);
        }

        assert_eq!(counter.count(), 4);
        assert_eq!(counter.revolutions(), 1.0);
        assert_eq!(counter.direction(), Direction::Forward);
    }

    #[test]
    fn repeats_and_other_line_are_ignored() {
        let mut counter = PulseCounter::new();
        counter.start(1, &mut OneLine::default()).unwrap();

        assert_eq!(counter.on_edge(&edge(Channel::A, Level::Low, 0)), Direction::Stop);
        assert_eq!(counter.on_edge(&edge(Channel::B, Level::High, 1)), Direction::Stop);
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn stopped_counter_ignores_edges() {
        let mut line = OneLine::default();
        let mut counter = PulseCounter::new();
        assert_eq!(counter.on_edge(&edge(Channel::A, Level::High, 0)), Direction::Stop);

        counter.start(1, &mut line).unwrap();
        counter.on_edge(&edge(Channel::A, Level::High, 1));
        counter.stop(&mut line);
        counter.on_edge(&edge(Channel::A, Level::Low, 2));
        assert_eq!(counter.count(), 1);

        assert_eq!(
            counter.start(0, &mut line),
            Err(ConfigError::InvalidResolution(0))
        );
    }
}
