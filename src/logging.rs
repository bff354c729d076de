use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

pub use log::Level;
use log::{Metadata, Record, SetLoggerError};

struct LoggerType;

static LOGGER: LoggerType = LoggerType;
static LEVEL: AtomicUsize = AtomicUsize::new(Level::Info as usize);
static START: OnceLock<Instant> = OnceLock::new();

pub fn init(level: Level) -> Result<(), SetLoggerError> {
    START.get_or_init(Instant::now);
    LEVEL.store(level as usize, Ordering::Relaxed);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Trace => "trace",
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error => "error",
    }
}

fn render(elapsed: Duration, record: &Record) -> String {
    format!(
        "[{:>4}.{:03}] {}: {} ({})",
        elapsed.as_secs(),
        elapsed.subsec_millis(),
        level_name(record.level()),
        record.args(),
        record.target()
    )
}

impl log::Log for LoggerType {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() as usize <= LEVEL.load(Ordering::Relaxed)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let elapsed = START.get().map(Instant::elapsed).unwrap_or_default();
            let _ = writeln!(std::io::stderr().lock(), "{}", render(elapsed, record));
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_has_time_level_and_target() {
        let line = render(
            Duration::from_millis(12_345),
            &Record::builder()
                .args(format_args!("speed {} rpm", 60))
                .level(Level::Warn)
                .target("quadrature_core::decoder")
                .build(),
        );
        assert_eq!(line, "[  12.345] warn: speed 60 rpm (quadrature_core::decoder)");
    }

    #[test]
    fn levels_filter_by_severity() {
        LEVEL.store(Level::Info as usize, Ordering::Relaxed);
        let debug = Metadata::builder().level(Level::Debug).build();
        let error = Metadata::builder().level(Level::Error).build();
        assert!(!log::Log::enabled(&LOGGER, &debug));
        assert!(log::Log::enabled(&LOGGER, &error));
    }
}
