use crate::qemu_trace;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// `log` sink writing to the QEMU debug console.
///
/// Meant to live in a `static` so it can be installed before any allocator
/// exists:
///
/// ```no_run
/// use kernel_qemu::QemuLogger;
/// use log::LevelFilter;
///
/// static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);
/// LOGGER.install().expect("logger installed twice");
/// log::info!("frame allocator up");
/// ```
pub struct QemuLogger {
    max_level: LevelFilter,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Registers this logger with the `log` facade. Call once during early init.
    ///
    /// # Errors
    /// Fails if a logger was already installed.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Format: "[LEVEL] target: message\n", straight into the port.
        qemu_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        // unbuffered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn meta(level: Level) -> Metadata<'static> {
        Metadata::builder().level(level).target("kernel_alloc").build()
    }

    #[test]
    fn filters_by_max_level() {
        let logger = QemuLogger::new(LevelFilter::Info);
        assert!(logger.enabled(&meta(Level::Error)));
        assert!(logger.enabled(&meta(Level::Info)));
        assert!(!logger.enabled(&meta(Level::Debug)));
    }

    #[test]
    fn off_disables_everything() {
        let logger = QemuLogger::new(LevelFilter::Off);
        assert!(!logger.enabled(&meta(Level::Error)));
        assert_eq!(logger.max_level(), LevelFilter::Off);
    }
}
