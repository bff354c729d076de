use core::f32::consts::PI;

use super::{Encoder, MotorOdometry, TickCounter};
use crate::time::{elapsed_secs, Instant};

/// Fixed-window speed estimate over a [`TickCounter`].
///
/// Call [`update_speed`](Encoder::update_speed) at a steady sampling rate;
/// each call measures the count change since the previous one.
pub struct QuadratureEncoder<C: TickCounter> {
    counter: C,
    current_count: Option<i64>,
    current_time: Option<Instant>,
}

impl<C: TickCounter> QuadratureEncoder<C> {
    pub fn new(counter: C) -> Self {
        Self {
            counter,
            current_count: None,
            current_time: None,
        }
    }

    pub fn counter(&self) -> &C {
        &self.counter
    }

    fn rads_per_tick(&self) -> Option<f32> {
        match self.counter.ticks_per_revolution() {
            0 => None,
            per_rev => Some(2.0 * PI / per_rev as f32),
        }
    }
}

impl<C: TickCounter> Encoder for QuadratureEncoder<C> {
    fn update_speed(&mut self, now: Instant) -> Option<MotorOdometry> {
        let current_count = self.counter.ticks();
        let last_count = self.current_count.replace(current_count);
        let last_time = self.current_time.replace(now);

        let (last_count, last_time) = last_count.zip(last_time)?;
        let dt = elapsed_secs(last_time, now)?;
        let rads_per_tick = self.rads_per_tick()?;

        if current_count == last_count {
            Some(MotorOdometry::Stationary)
        } else {
            let rad_diff = rads_per_tick * (current_count - last_count) as f32;
            Some(MotorOdometry::from_signed(rad_diff / dt))
        }
    }

    fn position(&self) -> f32 {
        self.rads_per_tick()
            .map(|r| r * self.counter.ticks() as f32)
            .unwrap_or(0.0)
    }
}
