//! Edge events and the collaborator that produces them.

use crate::phase::{Channel, Level, PhaseState};
use crate::time::Instant;

/// Direction of a level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

impl From<Level> for Edge {
    fn from(level: Level) -> Self {
        match level {
            Level::High => Edge::Rising,
            Level::Low => Edge::Falling,
        }
    }
}

/// Which edges a listener is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    Rising,
    Falling,
    Both,
}

/// One physical transition on one line.
///
/// `phase` holds both line levels as the source saw them when the edge fired,
/// so the changed line reads its new level and the other line its current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeEvent {
    pub channel: Channel,
    pub phase: PhaseState,
    pub timestamp: Instant,
}

impl EdgeEvent {
    pub fn new(channel: Channel, level: Level, other: Level, timestamp: Instant) -> Self {
        let phase = PhaseState::default()
            .with_level(channel, level)
            .with_level(channel.other(), other);
        Self {
            channel,
            phase,
            timestamp,
        }
    }

    pub const fn sampled(channel: Channel, phase: PhaseState, timestamp: Instant) -> Self {
        Self {
            channel,
            phase,
            timestamp,
        }
    }

    /// New level of the line that changed.
    pub const fn level(&self) -> Level {
        self.phase.level(self.channel)
    }

    pub fn edge(&self) -> Edge {
        self.level().into()
    }
}

/// Supplier of edge notifications for the two encoder lines.
///
/// Where the events go is fixed when the source is built; `listen` only arms
/// delivery for one line. Sources must deliver every transition once, in
/// chronological order, and must serialize A and B deliveries (or deliver
/// through a [`SharedDecoder`](crate::SharedDecoder)).
pub trait EdgeSource {
    type Error;

    fn listen(&mut self, channel: Channel, trigger: Trigger) -> Result<(), Self::Error>;

    fn unlisten(&mut self, channel: Channel) -> Result<(), Self::Error>;

    /// Current level of a line, read once per `start` to seed the phase.
    fn level(&mut self, channel: Channel) -> Result<Level, Self::Error>;
}

impl<S: EdgeSource + ?Sized> EdgeSource for &mut S {
    type Error = S::Error;

    fn listen(&mut self, channel: Channel, trigger: Trigger) -> Result<(), Self::Error> {
        (**self).listen(channel, trigger)
    }

    fn unlisten(&mut self, channel: Channel) -> Result<(), Self::Error> {
        (**self).unlisten(channel)
    }

    fn level(&mut self, channel: Channel) -> Result<Level, Self::Error> {
        (**self).level(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::instant_from_micros;

    #[test]
    fn event_places_levels_on_their_lines() {
        let t = instant_from_micros(5);
        let e = EdgeEvent::new(Channel::B, Level::High, Level::Low, t);
        assert_eq!(e.phase.bits(), 0b01);
        assert_eq!(e.level(), Level::High);
        assert_eq!(e.edge(), Edge::Rising);

        let e = EdgeEvent::new(Channel::A, Level::Low, Level::High, t);
        assert_eq!(e.phase.bits(), 0b01);
        assert_eq!(e.edge(), Edge::Falling);
    }
}
