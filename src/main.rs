mod cli;
mod gpio;
mod logging;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use quadrature_core::motors::{
    encoder::QuadratureEncoder, hbridge::HBridge, Encoder, MotorEffort, MotorOdometry,
    OpenLoopDrive, TickCounter,
};
use quadrature_core::{
    EdgeDecoder, EdgeSource, Instant, PulseCounter, QuadratureDecoder, SharedDecoder,
};
use rppal::gpio::Gpio;

use crate::cli::{MotorPins, Opts};
use crate::gpio::{PiEdgeSource, PiOutput, PiSoftPwm};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

type Motor = HBridge<PiSoftPwm, PiOutput, PiOutput>;

fn motor(gpio: &Gpio, pins: MotorPins, frequency: f64) -> anyhow::Result<Motor> {
    let pwm = PiSoftPwm::new(gpio, pins.pwm, frequency).context("claiming PWM pin")?;
    let in1 = PiOutput::new(gpio, pins.in1).context("claiming IN1 pin")?;
    let in2 = PiOutput::new(gpio, pins.in2).context("claiming IN2 pin")?;
    Ok(HBridge::new(pwm, in1, in2)?)
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    logging::init(opts.log_level)?;
    info!("{} {}", NAME, VERSION);

    let gpio = Gpio::new().context("opening GPIO")?;
    if opts.single_channel {
        run(&opts, &gpio, PulseCounter::new())
    } else {
        run(
            &opts,
            &gpio,
            QuadratureDecoder::with_orientation(opts.orientation()),
        )
    }
}

fn run<D>(opts: &Opts, gpio: &Gpio, decoder: D) -> anyhow::Result<()>
where
    D: EdgeDecoder + TickCounter + Send + 'static,
{
    let decoder = Arc::new(SharedDecoder::new(decoder));
    let mut source = PiEdgeSource::new(gpio, opts.pin_a, opts.channel_b(), Arc::clone(&decoder))
        .context("claiming encoder pins")?;

    let mut bridge = opts
        .motor_pins()
        .map(|pins| motor(gpio, pins, opts.pwm_frequency))
        .transpose()?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))?;
    }

    decoder
        .start(opts.resolution, &mut source)
        .context("starting decoder")?;

    if let Some(motor) = bridge.as_mut() {
        let effort = opts.effort();
        if let Err(e) = motor.drive(effort) {
            shutdown(&*decoder, &mut source, bridge.as_mut());
            return Err(e.into());
        }
        info!("motor effort {:?}", effort);
    }

    let clock = std::time::Instant::now();
    let now = || Instant::from_ticks(clock.elapsed().as_micros() as u64);
    let mut encoder = QuadratureEncoder::new(&*decoder);
    let mut invalid = 0;
    encoder.update_speed(now());

    while running.load(Ordering::SeqCst) {
        thread::sleep(opts.sample_period());

        match encoder.update_speed(now()) {
            Some(MotorOdometry::Stationary) => info!("Stopped"),
            Some(speed) => info!("Speed: {:.2} RPM", speed.rpm()),
            None => {}
        }

        let count = decoder.invalid_transition_count();
        if count > invalid {
            warn!("{} invalid transitions so far", count);
            invalid = count;
        }
    }

    shutdown(&*decoder, &mut source, bridge.as_mut());
    Ok(())
}

/// Releases the motor and stops the decoder. A motor that refuses to release
/// is logged and does not keep the decoder running.
fn shutdown<D, S, M>(decoder: &SharedDecoder<D>, source: &mut S, motor: Option<&mut M>)
where
    D: EdgeDecoder,
    S: EdgeSource,
    M: OpenLoopDrive,
    M::Error: fmt::Display,
{
    if let Some(motor) = motor {
        if let Err(e) = motor.drive(MotorEffort::Release) {
            warn!("failed to release motor: {}", e);
        }
    }
    decoder.stop(source);
    info!("Cleaned up");
}
