//! Errors raised when a decoder is started.

use core::fmt;

/// Why [`QuadratureDecoder::start`](crate::QuadratureDecoder::start) refused.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError<E> {
    /// Resolution must be a positive number of pulses per revolution.
    InvalidResolution(i32),

    /// The edge source failed to register or read a line; its error as-is.
    Source(E),
}

impl<E> From<E> for ConfigError<E> {
    fn from(error: E) -> Self {
        ConfigError::Source(error)
    }
}

impl<E: fmt::Debug> fmt::Display for ConfigError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::InvalidResolution(r) => {
                write!(f, "Invalid resolution {} (must be > 0)", r)
            }
            ConfigError::Source(e) => write!(f, "Edge source error: {:?}", e),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ConfigError<E> {}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for ConfigError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::InvalidResolution(r) => defmt::write!(f, "Invalid resolution {}", r),
            ConfigError::Source(e) => defmt::write!(f, "Edge source error: {}", e),
        }
    }
}
