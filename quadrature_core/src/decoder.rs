//! The quadrature decoder state machine.

use core::f32::consts::PI;

use log::{debug, info, warn};

use crate::edge::{EdgeEvent, EdgeSource, Trigger};
use crate::error::ConfigError;
use crate::phase::{Channel, Direction, Orientation, PhaseState};
use crate::time::{elapsed_secs, Instant};

/// Valid transitions per encoder pulse, one per quarter phase.
pub const EDGES_PER_PULSE: u32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecoderState {
    #[default]
    Stopped,
    Running,
}

/// Relative position since the decoder was started.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub ticks: i64,
    pub revolutions: f32,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    ticks: i64,
    timestamp: Instant,
}

/// Reduces two-line edge events to a signed tick count.
///
/// The decoder is a plain value: every event goes through [`on_edge`], which
/// must be called strictly in sequence. It borrows its [`EdgeSource`] only
/// for the duration of `start`/`stop`.
///
/// [`on_edge`]: QuadratureDecoder::on_edge
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: DecoderState,
    orientation: Orientation,
    resolution: u32,
    tick_count: i64,
    last_phase: PhaseState,
    direction: Direction,
    invalid_transitions: u32,
    last_event: Option<Sample>,
    previous_event: Option<Sample>,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self::with_orientation(Orientation::Normal)
    }

    pub const fn with_orientation(orientation: Orientation) -> Self {
        Self {
            state: DecoderState::Stopped,
            orientation,
            resolution: 0,
            tick_count: 0,
            last_phase: PhaseState::from_bits(0),
            direction: Direction::Stop,
            invalid_transitions: 0,
            last_event: None,
            previous_event: None,
        }
    }

    /// Registers for both edges on A and B, seeds the phase and zeroes the count.
    ///
    /// A running decoder is stopped first, so this doubles as a restart. A
    /// bad resolution is rejected before anything else changes; a source
    /// error leaves the decoder stopped with a zero count and no line
    /// registered.
    ///
    /// # Errors
    /// * [`ConfigError::InvalidResolution`] if `resolution <= 0`
    /// * [`ConfigError::Source`] if the source cannot register or read a line
    pub fn start<S: EdgeSource>(
        &mut self,
        resolution: i32,
        source: &mut S,
    ) -> Result<(), ConfigError<S::Error>> {
        start_decoder(self, resolution, source)
    }

    /// Applies one edge event and returns how it was classified.
    ///
    /// Ignored (returns [`Direction::Stop`]) while stopped. An invalid
    /// transition leaves the count alone, is counted, and resynchronizes on
    /// the new phase.
    pub fn on_edge(&mut self, event: &EdgeEvent) -> Direction {
        if self.state != DecoderState::Running {
            return Direction::Stop;
        }

        let new_phase = event.phase;
        let direction = self
            .orientation
            .apply(Direction::between(self.last_phase, new_phase));

        match direction {
            Direction::Forward | Direction::Backward => {
                self.tick_count += direction.step();
                self.direction = direction;
            }
            Direction::Invalid => {
                self.invalid_transitions = self.invalid_transitions.saturating_add(1);
                self.direction = direction;
                debug!(
                    "invalid transition {:02b} -> {:02b} on {:?}",
                    self.last_phase.bits(),
                    new_phase.bits(),
                    event.channel
                );
            }
            Direction::Stop => {}
        }

        self.last_phase = new_phase;
        self.previous_event = self.last_event.replace(Sample {
            ticks: self.tick_count,
            timestamp: event.timestamp,
        });

        direction
    }

    /// Deregisters from both lines. Idempotent; state stays readable.
    pub fn stop<S: EdgeSource>(&mut self, source: &mut S) {
        stop_decoder(self, source);
    }

    pub fn position(&self) -> Position {
        Position {
            ticks: self.tick_count,
            revolutions: self.revolutions(),
        }
    }

    pub fn ticks(&self) -> i64 {
        self.tick_count
    }

    pub fn revolutions(&self) -> f32 {
        match self.ticks_per_revolution() {
            0 => 0.0,
            per_rev => self.tick_count as f32 / per_rev as f32,
        }
    }

    /// Shaft angle in radians since start.
    pub fn angle(&self) -> f32 {
        self.revolutions() * 2.0 * PI
    }

    /// Ticks per second between the two most recent events, 0 with fewer
    /// than two events or no elapsed time.
    pub fn rate(&self) -> f32 {
        match (self.previous_event, self.last_event) {
            (Some(prev), Some(last)) => elapsed_secs(prev.timestamp, last.timestamp)
                .map(|dt| (last.ticks - prev.ticks) as f32 / dt)
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn rpm(&self) -> f32 {
        match self.ticks_per_revolution() {
            0 => 0.0,
            per_rev => self.rate() * 60.0 / per_rev as f32,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn invalid_transition_count(&self) -> u32 {
        self.invalid_transitions
    }

    pub fn last_phase(&self) -> PhaseState {
        self.last_phase
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DecoderState::Running
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Pulses per revolution, 0 until the first successful start.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn ticks_per_revolution(&self) -> u32 {
        self.resolution.saturating_mul(EDGES_PER_PULSE)
    }
}

/// A decoder that is started, fed and stopped through an [`EdgeSource`],
/// either directly or inside a [`SharedDecoder`](crate::SharedDecoder).
///
/// `reset`, `begin` and `freeze` are the steps `start` and `stop` are made
/// of. Call those instead unless you are writing a wrapper like
/// `SharedDecoder`.
pub trait EdgeDecoder {
    /// Lines registered on start, in registration order.
    const CHANNELS: &'static [Channel];

    /// Stops accepting events and zeroes everything but the configuration.
    fn reset(&mut self, resolution: u32);

    /// Seeds from the levels read right after registration and starts
    /// accepting events.
    fn begin(&mut self, phase: PhaseState);

    /// Stops accepting events. Returns whether the decoder was running.
    fn freeze(&mut self) -> bool;

    fn on_edge(&mut self, event: &EdgeEvent) -> Direction;

    /// Events that could not be classified since start.
    fn invalid_transition_count(&self) -> u32 {
        0
    }
}

impl EdgeDecoder for QuadratureDecoder {
    const CHANNELS: &'static [Channel] = &[Channel::A, Channel::B];

    fn reset(&mut self, resolution: u32) {
        *self = Self {
            resolution,
            ..Self::with_orientation(self.orientation)
        };
    }

    fn begin(&mut self, phase: PhaseState) {
        self.last_phase = phase;
        self.state = DecoderState::Running;
        info!(
            "quadrature decoder started: {} ppr, phase {:02b}",
            self.resolution,
            phase.bits()
        );
    }

    fn freeze(&mut self) -> bool {
        let was_running = self.state == DecoderState::Running;
        if was_running {
            self.state = DecoderState::Stopped;
            info!("quadrature decoder stopped at {} ticks", self.tick_count);
        }
        was_running
    }

    fn on_edge(&mut self, event: &EdgeEvent) -> Direction {
        QuadratureDecoder::on_edge(self, event)
    }

    fn invalid_transition_count(&self) -> u32 {
        self.invalid_transitions
    }
}

pub(crate) fn validate<E>(resolution: i32) -> Result<u32, ConfigError<E>> {
    match u32::try_from(resolution) {
        Ok(r) if r > 0 => Ok(r),
        _ => Err(ConfigError::InvalidResolution(resolution)),
    }
}

pub(crate) fn start_decoder<D: EdgeDecoder, S: EdgeSource>(
    decoder: &mut D,
    resolution: i32,
    source: &mut S,
) -> Result<(), ConfigError<S::Error>> {
    let resolution = validate(resolution)?;

    stop_decoder(decoder, source);
    decoder.reset(resolution);
    listen(source, D::CHANNELS)?;

    match read_phase(source, D::CHANNELS) {
        Ok(phase) => {
            decoder.begin(phase);
            Ok(())
        }
        Err(e) => {
            detach(source, D::CHANNELS);
            Err(ConfigError::Source(e))
        }
    }
}

pub(crate) fn stop_decoder<D: EdgeDecoder, S: EdgeSource>(decoder: &mut D, source: &mut S) {
    if decoder.freeze() {
        detach(source, D::CHANNELS);
    }
}

/// Registers every line for both edges. Nothing stays registered on error.
pub(crate) fn listen<S: EdgeSource>(
    source: &mut S,
    channels: &[Channel],
) -> Result<(), S::Error> {
    for (i, &channel) in channels.iter().enumerate() {
        if let Err(e) = source.listen(channel, Trigger::Both) {
            detach(source, &channels[..i]);
            return Err(e);
        }
    }
    Ok(())
}

/// Levels of the given lines, the others read low.
///
/// Called after registering: an edge racing the read is either in the seed
/// or delivered afterwards as a same-phase event.
pub(crate) fn read_phase<S: EdgeSource>(
    source: &mut S,
    channels: &[Channel],
) -> Result<PhaseState, S::Error> {
    channels.iter().try_fold(PhaseState::default(), |phase, &channel| {
        Ok(phase.with_level(channel, source.level(channel)?))
    })
}

pub(crate) fn detach<S: EdgeSource>(source: &mut S, channels: &[Channel]) {
    for &channel in channels {
        if source.unlisten(channel).is_err() {
            warn!("failed to deregister edge listener on {:?}", channel);
        }
    }
}
