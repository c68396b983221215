use crate::BootConfig;
use log::SetLoggerError;

#[cfg(feature = "qemu")]
static LOGGER: kernel_qemu::QemuLogger = kernel_qemu::QemuLogger::new(log::LevelFilter::Trace);

/// Route the `log` facade to the QEMU debug console and apply the configured
/// level.
///
/// Without the `qemu` feature only the level is applied; records go nowhere.
///
/// # Errors
/// Fails if a logger was installed before.
#[cfg_attr(not(feature = "qemu"), allow(clippy::unnecessary_wraps))]
pub fn install_logger(config: &BootConfig) -> Result<(), SetLoggerError> {
    #[cfg(feature = "qemu")]
    LOGGER.install()?;

    log::set_max_level(config.log_level);
    Ok(())
}
