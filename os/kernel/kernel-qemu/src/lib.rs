//! # QEMU Debug Console Logging
//!
//! Early-boot log output through QEMU's debug console (`-debugcon`), which
//! captures every byte written to I/O port `0x402`. It needs no memory, no
//! interrupts and no initialized driver, so it is usable before the frame
//! allocator exists.
//!
//! * [`QemuLogger`]: a `log::Log` sink formatting `"[LEVEL] target: message"`.
//! * [`qemu_trace!`]: raw formatted output bypassing the `log` facade.
//!
//! With the `enabled` feature off (or on non-x86-64 targets) all output
//! compiles to a no-op, which is what host builds and tests use.
//!
//! ```bash
//! qemu-system-x86_64 ... -debugcon stdio
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod logger;

pub use logger::QemuLogger;

#[cfg(all(feature = "enabled", target_arch = "x86_64"))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt::{self, Write};

    /// The port number for QEMU's debug port.
    const QEMU_DEBUG_PORT: u16 = 0x402;

    /// Write a single byte to QEMU's debug port.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    pub fn dbg_putc(c: u8) {
        // SAFETY: port 0x402 is an output-only debug sink; unused on real hardware.
        unsafe {
            core::arch::asm!(
                "out dx, al",
                in("dx") QEMU_DEBUG_PORT,
                in("al") c,
                options(nomem, nostack, preserves_flags)
            );
        }
    }

    pub struct QemuSink;

    impl Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for b in s.bytes() {
                dbg_putc(b);
            }
            Ok(())
        }
    }

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments) {
        // Ignore errors; this is best-effort debug output.
        let _ = fmt::write(&mut QemuSink, args);
    }
}

#[cfg(not(all(feature = "enabled", target_arch = "x86_64")))]
#[doc(hidden)]
pub mod qemu_fmt {
    use core::fmt;

    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(_: fmt::Arguments) {
        // no-op when the debug console is disabled
    }
}

/// Writes `format!`-style arguments to the QEMU debug console without allocating.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_fmt::qemu_write(core::format_args!($($arg)*));
    }};
}
