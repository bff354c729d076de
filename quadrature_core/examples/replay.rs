//! Replays a synthetic phase trace through the decoder and a 50 Hz sampler,
//! the way a motor test bench would see it.
//!
//! `cargo run -p quadrature_core --example replay`

use quadrature_core::motors::{encoder::QuadratureEncoder, Encoder, MotorOdometry};
use quadrature_core::time::{dur_from_millis, instant_from_micros};
use quadrature_core::{Channel, EdgeEvent, EdgeSource, Level, PhaseState, SharedDecoder, Trigger};

const RESOLUTION: i32 = 13;
const FORWARD: [u8; 4] = [0b01, 0b11, 0b10, 0b00];

struct Bench;

impl EdgeSource for Bench {
    type Error = core::convert::Infallible;

    fn listen(&mut self, _channel: Channel, _trigger: Trigger) -> Result<(), Self::Error> {
        Ok(())
    }

    fn unlisten(&mut self, _channel: Channel) -> Result<(), Self::Error> {
        Ok(())
    }

    fn level(&mut self, _channel: Channel) -> Result<Level, Self::Error> {
        Ok(Level::Low)
    }
}

fn main() {
    let decoder: SharedDecoder = SharedDecoder::default();
    if let Err(e) = decoder.start(RESOLUTION, &mut Bench) {
        println!("start failed: {:?}", e);
        return;
    }

    let mut encoder = QuadratureEncoder::new(&decoder);
    let mut sample_at = instant_from_micros(0);
    encoder.update_speed(sample_at);

    // Spin up forward, then run backward at a steady rate.
    let mut t_us = 0;
    let mut index = 3usize;
    for step in 0..600u64 {
        t_us += if step < 200 { 2_000 - step * 5 } else { 1_000 };
        index = if step < 400 { (index + 1) % 4 } else { (index + 3) % 4 };

        let phase = PhaseState::from_bits(FORWARD[index]);
        let last = decoder.lock(|d| d.last_phase());
        let channel = if phase.level(Channel::A) != last.level(Channel::A) {
            Channel::A
        } else {
            Channel::B
        };
        decoder.on_edge(&EdgeEvent::sampled(channel, phase, instant_from_micros(t_us)));

        while instant_from_micros(t_us) >= sample_at + dur_from_millis(20) {
            sample_at += dur_from_millis(20);
            match encoder.update_speed(sample_at) {
                Some(MotorOdometry::Stationary) | None => {
                    println!("{:>7} us: stationary", sample_at.ticks())
                }
                Some(odometry) => println!("{:>7} us: {:>8.1} rpm", sample_at.ticks(), odometry.rpm()),
            }
        }
    }

    let position = decoder.position();
    println!(
        "ticks {} ({:.3} rev), invalid {}",
        position.ticks,
        position.revolutions,
        decoder.invalid_transition_count()
    );
    decoder.stop(&mut Bench);
}
