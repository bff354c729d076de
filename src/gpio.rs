//! rppal-backed edge source and motor outputs.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use embedded_hal::digital;
use embedded_hal::pwm::{self, SetDutyCycle};
use quadrature_core::time::instant_from_micros;
use quadrature_core::{
    Channel, EdgeDecoder, EdgeEvent, EdgeSource, Level, PhaseState, SharedDecoder, Trigger,
};
use rppal::gpio::{self, Event, Gpio, InputPin, OutputPin};

/// Last known level of both lines, updated by whichever callback fires.
#[derive(Default)]
struct Lines {
    phase: AtomicU8,
}

impl Lines {
    fn set(&self, channel: Channel, level: Level) -> PhaseState {
        let mut current = self.phase.load(Ordering::Acquire);
        loop {
            let next = PhaseState::from_bits(current).with_level(channel, level);
            match self.phase.compare_exchange_weak(
                current,
                next.bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LineError {
    #[error(transparent)]
    Gpio(#[from] gpio::Error),
    #[error("no pin wired to channel {0:?}")]
    Unwired(Channel),
}

/// Encoder lines on GPIO inputs, delivering edges into a [`SharedDecoder`]
/// from rppal's interrupt threads. Line B is optional for single-line
/// encoders.
pub struct PiEdgeSource<D> {
    pins: [Option<InputPin>; 2],
    lines: Arc<Lines>,
    decoder: Arc<SharedDecoder<D>>,
}

impl<D> PiEdgeSource<D> {
    pub fn new(
        gpio: &Gpio,
        pin_a: u8,
        pin_b: Option<u8>,
        decoder: Arc<SharedDecoder<D>>,
    ) -> gpio::Result<Self> {
        let a = gpio.get(pin_a)?.into_input_pullup();
        let b = match pin_b {
            Some(pin) => Some(gpio.get(pin)?.into_input_pullup()),
            None => None,
        };
        Ok(Self {
            pins: [Some(a), b],
            lines: Arc::default(),
            decoder,
        })
    }

    fn pin(&mut self, channel: Channel) -> Result<&mut InputPin, LineError> {
        self.pins[channel as usize]
            .as_mut()
            .ok_or(LineError::Unwired(channel))
    }
}

fn edge_trigger(trigger: Trigger) -> gpio::Trigger {
    match trigger {
        Trigger::Rising => gpio::Trigger::RisingEdge,
        Trigger::Falling => gpio::Trigger::FallingEdge,
        Trigger::Both => gpio::Trigger::Both,
    }
}

impl<D: EdgeDecoder + Send + 'static> EdgeSource for PiEdgeSource<D> {
    type Error = LineError;

    fn listen(&mut self, channel: Channel, trigger: Trigger) -> Result<(), LineError> {
        let lines = Arc::clone(&self.lines);
        let decoder = Arc::clone(&self.decoder);

        self.pin(channel)?
            .set_async_interrupt(edge_trigger(trigger), None, move |event: Event| {
                let level = Level::from(event.trigger == gpio::Trigger::RisingEdge);
                let timestamp = instant_from_micros(event.timestamp.as_micros() as u64);
                // Update the shared levels under the decoder lock so the two
                // callbacks cannot apply their phases out of order.
                decoder.lock(|d| {
                    let phase = lines.set(channel, level);
                    d.on_edge(&EdgeEvent::sampled(channel, phase, timestamp));
                });
            })?;
        Ok(())
    }

    fn unlisten(&mut self, channel: Channel) -> Result<(), LineError> {
        self.pin(channel)?.clear_async_interrupt()?;
        Ok(())
    }

    fn level(&mut self, channel: Channel) -> Result<Level, LineError> {
        let level = Level::from(self.pin(channel)?.is_high());
        self.lines.set(channel, level);
        Ok(level)
    }
}

/// Push-pull output usable through embedded-hal.
pub struct PiOutput(OutputPin);

impl PiOutput {
    pub fn new(gpio: &Gpio, pin: u8) -> gpio::Result<Self> {
        Ok(Self(gpio.get(pin)?.into_output_low()))
    }
}

impl digital::ErrorType for PiOutput {
    type Error = Infallible;
}

impl digital::OutputPin for PiOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set_high();
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("software PWM: {0}")]
pub struct PwmError(#[from] gpio::Error);

impl pwm::Error for PwmError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// Software PWM on any GPIO output.
pub struct PiSoftPwm {
    pin: OutputPin,
    frequency: f64,
}

impl PiSoftPwm {
    const MAX_DUTY: u16 = 1024;

    pub fn new(gpio: &Gpio, pin: u8, frequency: f64) -> gpio::Result<Self> {
        Ok(Self {
            pin: gpio.get(pin)?.into_output_low(),
            frequency,
        })
    }
}

impl pwm::ErrorType for PiSoftPwm {
    type Error = PwmError;
}

impl SetDutyCycle for PiSoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        Self::MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), PwmError> {
        match duty {
            0 => {
                self.pin.clear_pwm()?;
                self.pin.set_low();
            }
            d if d >= Self::MAX_DUTY => {
                self.pin.clear_pwm()?;
                self.pin.set_high();
            }
            d => {
                let ratio = f64::from(d) / f64::from(Self::MAX_DUTY);
                self.pin.set_pwm_frequency(self.frequency, ratio)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_updates_keep_the_other_channel() {
        let lines = Lines::default();
        assert_eq!(lines.set(Channel::A, Level::High).bits(), 0b10);
        assert_eq!(lines.set(Channel::B, Level::High).bits(), 0b11);
        assert_eq!(lines.set(Channel::A, Level::Low).bits(), 0b01);
    }

    #[test]
    fn missing_line_names_its_channel() {
        assert_eq!(
            LineError::Unwired(Channel::B).to_string(),
            "no pin wired to channel B"
        );
    }

    #[test]
    fn pi_triggers_map_one_to_one() {
        assert_eq!(edge_trigger(Trigger::Rising), gpio::Trigger::RisingEdge);
        assert_eq!(edge_trigger(Trigger::Falling), gpio::Trigger::FallingEdge);
        assert_eq!(edge_trigger(Trigger::Both), gpio::Trigger::Both);
    }
}
