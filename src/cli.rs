use std::time::Duration;

use clap::Parser;
use log::Level;
use quadrature_core::motors::MotorEffort;
use quadrature_core::Orientation;

/// Report the speed of a quadrature encoder wired to Raspberry Pi GPIO,
/// optionally while driving a DC motor through an H-bridge.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Opts {
    /// BCM pin wired to encoder channel A
    #[arg(long, default_value_t = 27)]
    pub pin_a: u8,

    /// BCM pin wired to encoder channel B
    #[arg(long, default_value_t = 22)]
    pub pin_b: u8,

    /// Count channel A only, for single-output encoders: speed without
    /// direction, channel B left unused
    #[arg(long, conflicts_with = "reverse")]
    pub single_channel: bool,

    /// Encoder pulses per revolution
    #[arg(short, long, default_value_t = 13, allow_negative_numbers = true)]
    pub resolution: i32,

    /// Count the other way round, for boards with A and B swapped
    #[arg(long)]
    pub reverse: bool,

    /// BCM pin driving the H-bridge enable input with software PWM
    #[arg(long, requires = "in1_pin", requires = "in2_pin")]
    pub pwm_pin: Option<u8>,

    /// BCM pin wired to H-bridge IN1
    #[arg(long, requires = "pwm_pin")]
    pub in1_pin: Option<u8>,

    /// BCM pin wired to H-bridge IN2
    #[arg(long, requires = "pwm_pin")]
    pub in2_pin: Option<u8>,

    /// Motor effort in -1..=1, negative runs backward
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub duty: f32,

    /// Software PWM frequency in Hz
    #[arg(long, default_value_t = 20_000.0, value_parser = positive::<f64>)]
    pub pwm_frequency: f64,

    /// How often the speed is sampled and reported, in Hz
    #[arg(long, default_value_t = 50.0, value_parser = positive::<f32>)]
    pub sample_hz: f32,

    #[arg(long, default_value_t = Level::Info)]
    pub log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorPins {
    pub pwm: u8,
    pub in1: u8,
    pub in2: u8,
}

impl Opts {
    pub fn orientation(&self) -> Orientation {
        if self.reverse {
            Orientation::Reversed
        } else {
            Orientation::Normal
        }
    }

    /// Pin for channel B, none in single-channel mode.
    pub fn channel_b(&self) -> Option<u8> {
        (!self.single_channel).then_some(self.pin_b)
    }

    pub fn motor_pins(&self) -> Option<MotorPins> {
        Some(MotorPins {
            pwm: self.pwm_pin?,
            in1: self.in1_pin?,
            in2: self.in2_pin?,
        })
    }

    pub fn effort(&self) -> MotorEffort {
        let duty = self.duty.clamp(-1.0, 1.0);
        if duty > 0.0 {
            MotorEffort::Forward(duty)
        } else if duty < 0.0 {
            MotorEffort::Backward(-duty)
        } else {
            MotorEffort::Release
        }
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.sample_hz))
    }
}

fn positive<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match s.parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        Ok(_) => Err(format!("{} is not a positive number", s)),
        Err(_) => Err(format!("{} is not a number", s)),
    }
}
