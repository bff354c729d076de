pub mod encoder;
pub mod hbridge;

use core::f32::consts::PI;

use num_traits::float::FloatCore;

use crate::decoder::QuadratureDecoder;
use crate::pulse::PulseCounter;
use crate::shared::SharedDecoder;
use crate::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorEffort {
    Forward(f32), // Measured as 0..=1 in terms of effort
    Backward(f32),
    Brake,
    #[default]
    Release,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorOdometry {
    #[default]
    Stationary,
    Forward(f32), // rad/s
    Backward(f32),
}

impl MotorOdometry {
    pub(crate) fn from_signed(rad_s: f32) -> Self {
        if rad_s > 0.0 {
            MotorOdometry::Forward(rad_s)
        } else if rad_s < 0.0 {
            MotorOdometry::Backward(rad_s.abs())
        } else {
            MotorOdometry::Stationary
        }
    }

    /// Angular speed in rad/s, negative when running backward.
    pub fn signed(self) -> f32 {
        match self {
            MotorOdometry::Stationary => 0.0,
            MotorOdometry::Forward(v) => v,
            MotorOdometry::Backward(v) => -v,
        }
    }

    pub fn rpm(self) -> f32 {
        self.signed() * 60.0 / (2.0 * PI)
    }
}

pub trait OpenLoopDrive {
    type Error;

    fn drive(&mut self, effort: MotorEffort) -> Result<(), Self::Error>;
    fn current_effort(&self) -> MotorEffort;
}

pub trait Encoder {
    fn update_speed(&mut self, now: Instant) -> Option<MotorOdometry>;
    /// Shaft angle in radians.
    fn position(&self) -> f32;
}

/// Anything that exposes an accumulated quadrature count.
pub trait TickCounter {
    fn ticks(&self) -> i64;
    /// 0 while the resolution is unknown.
    fn ticks_per_revolution(&self) -> u32;
}

impl TickCounter for QuadratureDecoder {
    fn ticks(&self) -> i64 {
        QuadratureDecoder::ticks(self)
    }

    fn ticks_per_revolution(&self) -> u32 {
        QuadratureDecoder::ticks_per_revolution(self)
    }
}

impl TickCounter for PulseCounter {
    fn ticks(&self) -> i64 {
        i64::try_from(self.count()).unwrap_or(i64::MAX)
    }

    fn ticks_per_revolution(&self) -> u32 {
        PulseCounter::ticks_per_revolution(self)
    }
}

impl<D: TickCounter> TickCounter for SharedDecoder<D> {
    fn ticks(&self) -> i64 {
        self.lock(|d| d.ticks())
    }

    fn ticks_per_revolution(&self) -> u32 {
        self.lock(|d| d.ticks_per_revolution())
    }
}

impl<T: TickCounter + ?Sized> TickCounter for &T {
    fn ticks(&self) -> i64 {
        (**self).ticks()
    }

    fn ticks_per_revolution(&self) -> u32 {
        (**self).ticks_per_revolution()
    }
}
