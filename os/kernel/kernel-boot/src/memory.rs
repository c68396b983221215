//! # Physical memory bring-up
//!
//! Validates the boot hand-off and builds the frame allocator from it. Any
//! failure here is fatal: without frame accounting the kernel cannot go on.

use crate::halt_forever;
use crate::tracing::trace_memory_map;
use kernel_alloc::{
    BitmapFrameAlloc, LinearMapper, LockedFrameAlloc, PageBackend, PhysMapper, PmmInitError,
};
use kernel_info::boot::KernelBootInfo;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
use kernel_sync::InterruptControl;
use log::{error, info};

/// The kernel's handle on physical memory after boot.
pub struct PhysicalMemory<'m, C: InterruptControl> {
    frames: LockedFrameAlloc<'m, C>,
    mapper: LinearMapper,
}

impl<'m, C: InterruptControl> PhysicalMemory<'m, C> {
    #[inline]
    pub const fn frames(&self) -> &LockedFrameAlloc<'m, C> {
        &self.frames
    }

    #[inline]
    pub const fn mapper(&self) -> LinearMapper {
        self.mapper
    }

    #[inline]
    pub fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        self.mapper.phys_to_virt(pa)
    }

    #[inline]
    pub fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        self.mapper.virt_to_phys(va)
    }

    /// Page-granular hooks for a kernel heap.
    #[allow(unsafe_code)]
    pub fn page_backend(&self) -> PageBackend<'_, 'm, C, LinearMapper> {
        // SAFETY: Construction required the linear map to cover all usable
        // memory, which is everything the allocator hands out.
        unsafe { PageBackend::new(&self.frames, self.mapper) }
    }
}

/// Bring up the frame allocator from the loader's hand-off.
///
/// # Errors
/// Every [`PmmInitError`] condition: missing or empty memory map, missing
/// linear map, an inverted kernel image, or no room for the bitmap.
///
/// # Safety
/// - `boot_info.mmap` must describe a valid memory map that stays untouched
///   while it is read here.
/// - The linear map must cover every usable region writable for `'m`, and
///   usable regions must not be in use by anything else.
#[allow(unsafe_code)]
pub unsafe fn try_init_physical_memory<'m, C: InterruptControl>(
    boot_info: &KernelBootInfo,
    irq: C,
) -> Result<PhysicalMemory<'m, C>, PmmInitError> {
    // SAFETY: Forwarded to the caller.
    let map = unsafe { boot_info.mmap.memory_map() }.ok_or(PmmInitError::MissingMemoryMap)?;
    trace_memory_map(&map);

    let mapper = LinearMapper::from_boot_info(&boot_info.linear_map)?;

    // SAFETY: Forwarded to the caller.
    let alloc = unsafe { BitmapFrameAlloc::init(map, boot_info.kernel_image, &mapper) }?;
    info!(
        "Physical memory ready: {} frames, {} free",
        alloc.total_frames(),
        alloc.free_frames()
    );

    Ok(PhysicalMemory {
        frames: LockedFrameAlloc::new(alloc, irq),
        mapper,
    })
}

/// The never type `!`, named through `fn() -> !` because `-> !` in a closure
/// bound is not yet stable.
type Never = <fn() -> ! as FnOutput>::Output;

trait FnOutput {
    type Output;
}

impl<T> FnOutput for fn() -> T {
    type Output = T;
}

/// Like [`try_init_physical_memory`], handing any failure to `on_fatal`.
///
/// # Safety
/// See [`try_init_physical_memory`].
#[allow(unsafe_code)]
pub unsafe fn init_physical_memory_or<'m, C: InterruptControl>(
    boot_info: &KernelBootInfo,
    irq: C,
    on_fatal: impl FnOnce(PmmInitError) -> Never,
) -> PhysicalMemory<'m, C> {
    // SAFETY: Forwarded to the caller.
    match unsafe { try_init_physical_memory(boot_info, irq) } {
        Ok(memory) => memory,
        Err(e) => {
            error!("Cannot bring up physical memory: {e}");
            on_fatal(e)
        }
    }
}

/// Bring up the frame allocator or halt the machine.
///
/// # Safety
/// See [`try_init_physical_memory`].
#[allow(unsafe_code)]
pub unsafe fn init_physical_memory<'m, C: InterruptControl>(
    boot_info: &KernelBootInfo,
    irq: C,
) -> PhysicalMemory<'m, C> {
    // SAFETY: Forwarded to the caller.
    unsafe { init_physical_memory_or(boot_info, irq, |_| halt_forever()) }
}
