mod support;

use std::convert::Infallible;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use quadrature_core::motors::{encoder::QuadratureEncoder, Encoder, MotorOdometry};
use quadrature_core::time::instant_from_micros;
use quadrature_core::{
    Channel, Direction, EdgeEvent, EdgeSource, Level, PhaseState, PulseCounter,
    QuadratureDecoder, SharedDecoder, Trigger,
};
use support::FakeLines;

// Each thread owns one line and toggles it; the other line's level is read
// under the same lock, which is how a real two-interrupt source behaves.
#[test]
fn concurrent_lines_never_produce_invalid_transitions() {
    let shared = Arc::new(SharedDecoder::new(QuadratureDecoder::new()));
    let mut lines = FakeLines::at(0b00);
    shared.start(13, &mut lines).unwrap();

    let handles: Vec<_> = [Channel::A, Channel::B]
        .into_iter()
        .map(|channel| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for i in 0..1_000u64 {
                    shared.lock(|decoder| {
                        let last = decoder.last_phase();
                        let flipped = if last.level(channel).is_high() {
                            Level::Low
                        } else {
                            Level::High
                        };
                        let phase = last.with_level(channel, flipped);
                        decoder.on_edge(&EdgeEvent::sampled(channel, phase, instant_from_micros(i)));
                    });
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let decoder = shared.snapshot();
    assert_eq!(decoder.invalid_transition_count(), 0);
    assert!(decoder.ticks().abs() <= 2_000);

    shared.stop(&mut lines);
    assert_eq!(lines.listening, [false, false]);
}

#[test]
fn stopped_shared_decoder_ignores_events() {
    let shared: SharedDecoder = SharedDecoder::default();
    let mut lines = FakeLines::at(0b00);
    shared.start(13, &mut lines).unwrap();
    shared.stop(&mut lines);

    let event = EdgeEvent::sampled(Channel::B, PhaseState::from_bits(0b01), instant_from_micros(1));
    shared.on_edge(&event);
    assert_eq!(shared.position().ticks, 0);
    assert_eq!(shared.invalid_transition_count(), 0);
    assert_eq!(shared.rate(), 0.0);
}

/// Lines where A rises while `start` is reading B. The edge is delivered
/// from its own thread through the decoder lock, like an interrupt callback.
struct RisesDuringSeed {
    lines: Arc<AtomicU8>,
    decoder: Arc<SharedDecoder>,
    callback: Option<thread::JoinHandle<()>>,
}

impl EdgeSource for RisesDuringSeed {
    type Error = Infallible;

    fn listen(&mut self, _channel: Channel, _trigger: Trigger) -> Result<(), Infallible> {
        Ok(())
    }

    fn unlisten(&mut self, _channel: Channel) -> Result<(), Infallible> {
        Ok(())
    }

    fn level(&mut self, channel: Channel) -> Result<Level, Infallible> {
        let level = PhaseState::from_bits(self.lines.load(Ordering::SeqCst)).level(channel);

        if channel == Channel::B && self.callback.is_none() {
            self.lines.fetch_or(0b10, Ordering::SeqCst);
            let lines = Arc::clone(&self.lines);
            let decoder = Arc::clone(&self.decoder);
            self.callback = Some(thread::spawn(move || {
                decoder.lock(|d| {
                    let phase = PhaseState::from_bits(lines.load(Ordering::SeqCst));
                    d.on_edge(&EdgeEvent::sampled(Channel::A, phase, instant_from_micros(10)));
                });
            }));
            // Give the callback every chance to run before the seed lands.
            thread::sleep(Duration::from_millis(20));
        }

        Ok(level)
    }
}

#[test]
fn edge_during_seeding_is_applied_after_it() {
    let decoder = Arc::new(SharedDecoder::new(QuadratureDecoder::new()));
    let mut source = RisesDuringSeed {
        lines: Arc::new(AtomicU8::new(0b00)),
        decoder: Arc::clone(&decoder),
        callback: None,
    };

    decoder.start(13, &mut source).unwrap();
    if let Some(callback) = source.callback.take() {
        callback.join().unwrap();
    }

    // 10 -> 11 is a single step.
    source.lines.store(0b11, Ordering::SeqCst);
    let rise = EdgeEvent::sampled(Channel::B, PhaseState::from_bits(0b11), instant_from_micros(20));
    assert_eq!(decoder.on_edge(&rise), Direction::Backward);

    let snapshot = decoder.snapshot();
    assert_eq!(snapshot.invalid_transition_count(), 0);
    assert_eq!(snapshot.ticks(), -2);
    assert_eq!(snapshot.last_phase().bits(), 0b11);
}

#[test]
fn single_line_speed_through_the_sampler() {
    let shared = SharedDecoder::new(PulseCounter::new());
    let mut lines = FakeLines::at(0b00);
    shared.start(10, &mut lines).unwrap();
    assert_eq!(lines.listening, [true, false]);

    let mut encoder = QuadratureEncoder::new(&shared);
    assert_eq!(encoder.update_speed(instant_from_micros(0)), None);

    for i in 0..10u64 {
        let bits = if i % 2 == 0 { 0b10 } else { 0b00 };
        let event = EdgeEvent::sampled(Channel::A, PhaseState::from_bits(bits), instant_from_micros(i * 1_000));
        assert_eq!(shared.on_edge(&event), Direction::Forward);
    }

    // 10 edges at 20 per revolution in half a second.
    let speed = encoder.update_speed(instant_from_micros(500_000)).unwrap();
    assert!(matches!(speed, MotorOdometry::Forward(_)));
    assert!((speed.rpm() - 60.0).abs() < 1e-3);

    shared.stop(&mut lines);
    assert_eq!(lines.listening, [false, false]);
    assert_eq!(shared.snapshot().count(), 10);
}
