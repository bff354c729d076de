//! Edge-driven quadrature encoder decoding.
//!
//! [`QuadratureDecoder`] turns the edge events of two phase-shifted digital
//! lines into a signed tick count, a direction and a rate. The lines
//! themselves belong to an [`EdgeSource`], which the decoder borrows at
//! [`start`](QuadratureDecoder::start) and [`stop`](QuadratureDecoder::stop)
//! and never owns.
//!
//! Encoders with a single output line use a [`PulseCounter`] instead: it
//! counts every edge on line A and has no notion of direction.
//!
//! Hosts that deliver A and B edges from independent threads or interrupt
//! handlers wrap the decoder in a [`SharedDecoder`].
//!
//! # Features
//!
//! - **`defmt`**: derive [`defmt::Format`] on the public enums and errors.

#![cfg_attr(not(test), no_std)]

pub mod decoder;
pub mod edge;
pub mod error;
pub mod motors;
pub mod phase;
pub mod pulse;
pub mod shared;
pub mod time;

pub use decoder::{DecoderState, EdgeDecoder, Position, QuadratureDecoder};
pub use edge::{Edge, EdgeEvent, EdgeSource, Trigger};
pub use error::ConfigError;
pub use phase::{Channel, Direction, Level, Orientation, PhaseState};
pub use pulse::PulseCounter;
pub use shared::SharedDecoder;
pub use time::{Duration, Instant};
