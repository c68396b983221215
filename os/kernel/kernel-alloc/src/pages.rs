//! # Page Backend
//!
//! The hooks a general-purpose heap needs from the physical layer: whole,
//! contiguous pages as kernel-virtual pointers (through the linear map) and
//! a way to give them back. Every call is one critical section on the
//! underlying [`LockedFrameAlloc`].

use crate::error::FreeError;
use crate::locked::LockedFrameAlloc;
use crate::phys_mapper::PhysMapper;
use core::ptr::NonNull;
use kernel_memory_addresses::{PAGE_SIZE, VirtualAddress};
use kernel_sync::InterruptControl;

pub struct PageBackend<'a, 'm, C: InterruptControl, M: PhysMapper> {
    frames: &'a LockedFrameAlloc<'m, C>,
    mapper: M,
}

impl<'a, 'm, C: InterruptControl, M: PhysMapper> PageBackend<'a, 'm, C, M> {
    /// # Safety
    /// `mapper` must map every frame `frames` can hand out, writable, for as
    /// long as the backend is used.
    pub const unsafe fn new(frames: &'a LockedFrameAlloc<'m, C>, mapper: M) -> Self {
        Self { frames, mapper }
    }

    /// Allocate `pages` contiguous pages.
    ///
    /// Returns `None` for a zero-page request or when memory is exhausted.
    pub fn alloc_pages(&self, pages: usize) -> Option<NonNull<u8>> {
        let pa = self.frames.allocate(pages)?;
        NonNull::new(self.mapper.phys_to_virt(pa).as_mut_ptr::<u8>())
    }

    /// Like [`alloc_pages`](Self::alloc_pages), with the memory zeroed.
    pub fn alloc_pages_zeroed(&self, pages: usize) -> Option<NonNull<u8>> {
        let len = usize::try_from(PAGE_SIZE).ok()?.checked_mul(pages)?;
        let ptr = self.alloc_pages(pages)?;
        // SAFETY: The frames were just allocated, so they are ours, and the
        // constructor's contract makes them writable through `ptr`.
        unsafe { ptr.as_ptr().write_bytes(0, len) };
        Some(ptr)
    }

    /// Return pages obtained from this backend.
    ///
    /// A null `ptr` or a zero count is a no-op.
    ///
    /// # Errors
    /// See [`FreeError`].
    pub fn free_pages(&self, ptr: *mut u8, pages: usize) -> Result<(), FreeError> {
        if ptr.is_null() || pages == 0 {
            return Ok(());
        }
        let pa = self.mapper.virt_to_phys(VirtualAddress::from_ptr(ptr));
        self.frames.free(pa, pages)
    }

    #[inline]
    pub const fn frames(&self) -> &'a LockedFrameAlloc<'m, C> {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_alloc::BitmapFrameAlloc;
    use crate::phys_mapper::LinearMapper;
    use kernel_info::boot::KernelImage;
    use kernel_info::memory_map::{MemoryMap, MemoryRegion};
    use kernel_memory_addresses::PhysicalAddress;
    use kernel_sync::NoInterrupts;

    #[test]
    fn pages_round_trip_through_the_linear_map() {
        let mut ram = vec![0xCCu8; 0x2_0000];
        let base = ram.as_mut_ptr();
        let mapper = LinearMapper::new(base as u64);
        let regions = [MemoryRegion::usable(0, 0x2_0000)];
        let image = KernelImage::new(PhysicalAddress::new(0x1000), PhysicalAddress::new(0x2000));
        let alloc =
            unsafe { BitmapFrameAlloc::init(MemoryMap::new(&regions), image, &mapper) }.unwrap();
        let locked = LockedFrameAlloc::new(alloc, NoInterrupts);
        let backend = unsafe { PageBackend::new(&locked, mapper) };

        // Frame 0 reserved, kernel at 1, bitmap at 2.
        let p = backend.alloc_pages_zeroed(2).unwrap();
        assert_eq!(p.as_ptr() as usize - base as usize, 0x3000);
        let bytes = unsafe { core::slice::from_raw_parts(p.as_ptr(), 0x2000) };
        assert!(bytes.iter().all(|&b| b == 0));

        let free = locked.free_frames();
        assert_eq!(backend.free_pages(p.as_ptr(), 2), Ok(()));
        assert_eq!(locked.free_frames(), free + 2);

        assert!(backend.alloc_pages(0).is_none());
        // A byte length that cannot be expressed must not leak frames.
        let free = locked.free_frames();
        assert!(backend.alloc_pages_zeroed(usize::MAX).is_none());
        assert_eq!(locked.free_frames(), free);
        assert_eq!(backend.free_pages(core::ptr::null_mut(), 3), Ok(()));
    }
}
