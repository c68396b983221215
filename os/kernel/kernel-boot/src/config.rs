use log::LevelFilter;

/// Knobs for the early boot sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BootConfig {
    /// Most verbose level forwarded to the log sink.
    pub log_level: LevelFilter,
}

impl BootConfig {
    /// Configuration selected by Cargo features.
    ///
    /// `log-trace` raises the level from `Info` to `Trace`.
    #[must_use]
    pub const fn from_features() -> Self {
        let log_level = if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        };
        Self { log_level }
    }

    #[must_use]
    pub const fn with_log_level(mut self, log_level: LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self::from_features()
    }
}
