//! # Shared Frame Allocator
//!
//! Wraps a [`BitmapFrameAlloc`] in an [`IrqSpinMutex`], whose every
//! acquisition also masks interrupts, so an interrupt handler that allocates
//! cannot deadlock against the code it interrupted. The interrupt capability is injected:
//! kernels pass [`CpuInterrupts`](kernel_sync::CpuInterrupts), hosted tests
//! pass [`NoInterrupts`](kernel_sync::NoInterrupts) or a counting fake.

use crate::error::FreeError;
use crate::frame_alloc::BitmapFrameAlloc;
use kernel_memory_addresses::PhysicalAddress;
use kernel_sync::{InterruptControl, IrqSpinGuard, IrqSpinMutex};

/// A [`BitmapFrameAlloc`] usable through a shared reference.
pub struct LockedFrameAlloc<'m, C: InterruptControl> {
    inner: IrqSpinMutex<BitmapFrameAlloc<'m>, C>,
}

impl<'m, C: InterruptControl> LockedFrameAlloc<'m, C> {
    pub const fn new(alloc: BitmapFrameAlloc<'m>, irq: C) -> Self {
        Self {
            inner: IrqSpinMutex::new(alloc, irq),
        }
    }

    /// Lock the allocator with interrupts masked until the guard drops.
    #[inline]
    pub fn lock(&self) -> IrqSpinGuard<'_, BitmapFrameAlloc<'m>, C> {
        self.inner.lock()
    }

    /// Run `f` inside a single critical section.
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut BitmapFrameAlloc<'m>) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }

    /// See [`BitmapFrameAlloc::allocate`].
    pub fn allocate(&self, pages: usize) -> Option<PhysicalAddress> {
        self.with(|a| a.allocate(pages))
    }

    /// See [`BitmapFrameAlloc::allocate_raw`].
    pub fn allocate_raw(&self, pages: usize) -> u64 {
        self.with(|a| a.allocate_raw(pages))
    }

    /// See [`BitmapFrameAlloc::free`].
    ///
    /// # Errors
    /// See [`FreeError`].
    pub fn free(&self, pa: PhysicalAddress, pages: usize) -> Result<(), FreeError> {
        self.with(|a| a.free(pa, pages))
    }

    pub fn free_frames(&self) -> u64 {
        self.with(|a| a.free_frames())
    }

    pub fn total_frames(&self) -> u64 {
        self.with(|a| a.total_frames())
    }

    #[inline]
    pub const fn interrupt_control(&self) -> &C {
        self.inner.interrupt_control()
    }

    pub fn into_inner(self) -> BitmapFrameAlloc<'m> {
        self.inner.into_inner()
    }
}
