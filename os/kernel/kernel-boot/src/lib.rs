//! # Early Boot Sequence
//!
//! Everything between the loader's jump into the kernel and a working frame
//! allocator:
//!
//! 1. Route `log` to the QEMU debug console ([`install_logger`]).
//! 2. Dump the hand-off ([`trace_boot_info`]).
//! 3. Validate it and build the allocator ([`init_physical_memory`]), or
//!    halt ([`halt_forever`]) when the machine cannot be brought up.
//!
//! ```no_run
//! use kernel_boot::{BootConfig, early_boot};
//! use kernel_info::boot::KernelBootInfo;
//! use kernel_sync::CpuInterrupts;
//!
//! extern "C" fn kernel_main(boot_info: *const KernelBootInfo) -> ! {
//!     let boot_info = unsafe { &*boot_info };
//!     let memory = unsafe { early_boot(boot_info, &BootConfig::from_features(), CpuInterrupts) };
//!     let _heap_pages = memory.page_backend();
//!     kernel_boot::halt_forever()
//! }
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod config;
mod halt;
mod logging;
pub mod memory;
mod tracing;

pub use config::BootConfig;
pub use halt::halt_forever;
pub use logging::install_logger;
pub use memory::{
    PhysicalMemory, init_physical_memory, init_physical_memory_or, try_init_physical_memory,
};
pub use tracing::{trace_boot_info, trace_memory_map};

use kernel_info::boot::KernelBootInfo;
use kernel_qemu::qemu_trace;
use kernel_sync::InterruptControl;

/// Run the early boot sequence and return the kernel's physical memory.
///
/// Never returns if the hand-off is unusable.
///
/// # Safety
/// See [`try_init_physical_memory`].
#[allow(unsafe_code)]
pub unsafe fn early_boot<'m, C: InterruptControl>(
    boot_info: &KernelBootInfo,
    config: &BootConfig,
    irq: C,
) -> PhysicalMemory<'m, C> {
    qemu_trace!("Kernel reporting to QEMU!\n");
    if let Err(e) = install_logger(config) {
        qemu_trace!("logger not installed: {}\n", e);
    }

    trace_boot_info(boot_info);

    // SAFETY: Forwarded to the caller.
    unsafe { init_physical_memory(boot_info, irq) }
}
