//! A decoder behind a critical section, for sources that fire A and B edges
//! from independent interrupt handlers or threads.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::decoder::{
    detach, listen, read_phase, validate, EdgeDecoder, Position, QuadratureDecoder,
};
use crate::edge::{EdgeEvent, EdgeSource};
use crate::error::ConfigError;
use crate::phase::Direction;

/// One decoder, one lock.
///
/// The lock is a `critical_section` section. Bare-metal targets and the
/// `std` implementation both have a single such section per program, so all
/// `SharedDecoder`s in a process are serialized against each other. They
/// never share state; only their updates take turns.
pub struct SharedDecoder<D = QuadratureDecoder> {
    inner: Mutex<RefCell<D>>,
}

impl<D: Default> Default for SharedDecoder<D> {
    fn default() -> Self {
        Self::new(D::default())
    }
}

impl<D> SharedDecoder<D> {
    pub const fn new(decoder: D) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(decoder)),
        }
    }

    /// Runs `f` with exclusive access to the decoder.
    ///
    /// `f` must not call back into this `SharedDecoder`.
    pub fn lock<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.inner.borrow_ref_mut(cs)))
    }
}

impl<D: Clone> SharedDecoder<D> {
    /// Copy of the decoder as it is right now.
    pub fn snapshot(&self) -> D {
        self.lock(|decoder| decoder.clone())
    }
}

impl<D: EdgeDecoder> SharedDecoder<D> {
    /// See [`QuadratureDecoder::start`].
    ///
    /// Registration and deregistration happen outside the lock, so a source
    /// that joins its delivery threads when a line is released never waits
    /// on a callback that is itself waiting for the lock. The levels are read
    /// and the decoder seeded under one lock: an edge firing meanwhile waits
    /// and is then applied against the fresh seed.
    pub fn start<S: EdgeSource>(
        &self,
        resolution: i32,
        source: &mut S,
    ) -> Result<(), ConfigError<S::Error>> {
        let resolution = validate(resolution)?;

        self.stop(source);
        self.lock(|decoder| decoder.reset(resolution));
        listen(source, D::CHANNELS)?;

        let seeded = self.lock(|decoder| {
            read_phase(&mut *source, D::CHANNELS).map(|phase| decoder.begin(phase))
        });
        if let Err(e) = seeded {
            detach(source, D::CHANNELS);
            return Err(ConfigError::Source(e));
        }

        Ok(())
    }

    /// Freezes the decoder under the lock, then deregisters without it.
    pub fn stop<S: EdgeSource>(&self, source: &mut S) {
        if self.lock(|decoder| decoder.freeze()) {
            detach(source, D::CHANNELS);
        }
    }

    pub fn on_edge(&self, event: &EdgeEvent) -> Direction {
        self.lock(|decoder| decoder.on_edge(event))
    }

    pub fn invalid_transition_count(&self) -> u32 {
        self.lock(|decoder| decoder.invalid_transition_count())
    }
}

impl SharedDecoder {
    pub fn position(&self) -> Position {
        self.lock(|decoder| decoder.position())
    }

    pub fn rate(&self) -> f32 {
        self.lock(|decoder| decoder.rate())
    }
}
