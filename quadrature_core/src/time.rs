use fugit::{TimerDurationU64, TimerInstantU64};

/// Microsecond timestamp, as delivered with edge events.
pub type Instant = TimerInstantU64<1_000_000>;
pub type Duration = TimerDurationU64<1_000_000>;

pub const fn instant_from_micros(micros: u64) -> Instant {
    Instant::from_ticks(micros)
}

pub const fn dur_from_millis(millis: u64) -> Duration {
    Duration::millis(millis)
}

/// Seconds from `since` to `now`, `None` if time did not move forward.
pub fn elapsed_secs(since: Instant, now: Instant) -> Option<f32> {
    match now.checked_duration_since(since) {
        Some(d) if d.ticks() > 0 => Some(d.to_micros() as f32 / 1_000_000.0),
        _ => None,
    }
}
