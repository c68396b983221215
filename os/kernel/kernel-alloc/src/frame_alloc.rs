//! # Bitmap Physical Frame Allocator
//!
//! Tracks every 4 KiB frame below the highest address in the boot memory map
//! with one bit. Built once during early boot from the loader's memory map,
//! it needs no heap: its own storage is carved out of usable memory (see
//! [`placement`](crate::placement)) and reached through the linear map.
//!
//! ## Initialization
//!
//! 1. Size the bitmap ([`BitmapLayout`]) and choose its storage.
//! 2. Mark everything used, then clear each frame lying wholly inside a
//!    usable region.
//! 3. Mark used again: every non-usable region, the kernel image, the bitmap
//!    storage itself and frame 0.
//!
//! A frame is therefore only ever handed out if the loader called it usable
//! and nothing the kernel already depends on lives there.
//!
//! ## Allocation
//!
//! [`allocate`](BitmapFrameAlloc::allocate) is a first-fit scan from frame 0
//! for `n` consecutive free frames, so results are deterministic for a given
//! bitmap state. Frame 0 is permanently reserved, which keeps the raw
//! interface's `0` free to mean "failed".

use crate::bitmap::FrameBitmap;
use crate::error::{FreeError, PmmInitError};
use crate::layout::BitmapLayout;
use crate::phys_mapper::PhysMapper;
use crate::placement::{BitmapPlacement, PlacementStrategy, place_bitmap};
use core::ops::Range;
use kernel_info::boot::KernelImage;
use kernel_info::memory_map::MemoryMap;
use kernel_memory_addresses::{FrameNumber, PhysicalAddress, Size4K};
use log::{debug, info, trace, warn};

/// Single-frame interface for consumers that only ever need 4 KiB
/// (page-table builders and the like).
///
/// Returned frames are 4 KiB aligned. `None` means out of memory.
pub trait PhysFrameAlloc {
    /// Allocate one 4 KiB physical frame.
    fn alloc_4k(&mut self) -> Option<PhysicalAddress>;

    /// Return a frame obtained from [`alloc_4k`](Self::alloc_4k).
    ///
    /// # Errors
    /// See [`FreeError`].
    fn free_4k(&mut self, frame: PhysicalAddress) -> Result<(), FreeError>;
}

/// Physical frame allocator backed by a bitmap in physical memory.
pub struct BitmapFrameAlloc<'m> {
    bitmap: FrameBitmap<'m>,
    layout: BitmapLayout,
    placement: BitmapPlacement,
    kernel: KernelImage,
    free_frames: u64,
}

impl<'m> BitmapFrameAlloc<'m> {
    /// Build the allocator from the boot memory map.
    ///
    /// # Errors
    /// - [`PmmInitError::InvalidKernelImage`] if the kernel range is inverted.
    /// - [`PmmInitError::EmptyMemoryMap`] if the map describes no memory.
    /// - [`PmmInitError::NoRoomForBitmap`] if no usable region can hold the
    ///   bitmap.
    ///
    /// # Safety
    /// - `mapper` must map every usable region of `map` writable for `'m`.
    /// - The usable regions must really be unused: the bitmap storage is
    ///   written without further checks and owned exclusively for `'m`.
    pub unsafe fn init<M: PhysMapper>(
        map: MemoryMap<'_>,
        kernel: KernelImage,
        mapper: &M,
    ) -> Result<Self, PmmInitError> {
        if !kernel.is_valid() {
            return Err(PmmInitError::InvalidKernelImage {
                start: kernel.start(),
                end: kernel.end(),
            });
        }

        let layout = BitmapLayout::from_memory_map(&map)?;
        let placement = place_bitmap(&map, &layout, &kernel)?;
        debug!(
            "pmm: {} frames, bitmap {} bytes in {} page(s)",
            layout.total_frames, layout.bitmap_bytes, layout.bitmap_pages
        );
        match placement.strategy {
            PlacementStrategy::AfterKernel => {
                info!("pmm: bitmap at {} after the kernel image", placement.base);
            }
            PlacementStrategy::FirstFit { region } => {
                warn!(
                    "pmm: no room after the kernel image, bitmap at {} in region {region}",
                    placement.base
                );
            }
        }

        let (Ok(storage_len), Ok(bitmap_len)) = (
            usize::try_from(layout.storage_bytes()),
            usize::try_from(layout.bitmap_bytes),
        ) else {
            return Err(PmmInitError::NoRoomForBitmap {
                bitmap_pages: layout.bitmap_pages,
            });
        };

        // SAFETY: The placement lies inside a usable region, which the caller
        // guarantees is mapped and unused; it is ours for 'm.
        let storage = unsafe { mapper.phys_to_bytes_mut(placement.base, storage_len) };
        let mut bitmap = FrameBitmap::new(storage, bitmap_len);
        bitmap.fill_used();

        for region in map.usable() {
            let frames = region.start().frame_ceil().index()..region.end().frame().index();
            trace!("pmm: usable {region:?} -> frames {frames:?}");
            bitmap.clear_range(frames);
        }

        for region in map.reserved() {
            bitmap.set_range(covering_frames(region.start(), region.end()));
        }

        let mut alloc = Self {
            bitmap,
            layout,
            placement,
            kernel,
            free_frames: 0,
        };

        alloc.bitmap.set_range(alloc.kernel_frames());
        alloc.bitmap.set_range(alloc.bitmap_frames());
        alloc.bitmap.set(0);
        alloc.free_frames = alloc.bitmap.count_clear(layout.total_frames);

        info!(
            "pmm: ready, {} of {} frames free ({} KiB)",
            alloc.free_frames,
            layout.total_frames,
            alloc.free_frames * 4
        );
        Ok(alloc)
    }

    /// Allocate `pages` physically contiguous frames, first fit.
    ///
    /// Returns the physical address of the first frame, or `None` if `pages`
    /// is zero or no run of that length is free.
    pub fn allocate(&mut self, pages: usize) -> Option<PhysicalAddress> {
        let wanted = u64::try_from(pages).ok().filter(|&n| n > 0)?;
        if wanted > self.free_frames {
            trace!("pmm: allocate({pages}) exceeds {} free frames", self.free_frames);
            return None;
        }

        let mut run_start = 0;
        let mut run_len = 0;
        for frame in 0..self.layout.total_frames {
            if self.bitmap.is_used(frame) {
                run_len = 0;
                continue;
            }

            if run_len == 0 {
                run_start = frame;
            }
            run_len += 1;

            if run_len == wanted {
                self.bitmap.set_range(run_start..run_start + wanted);
                self.free_frames -= wanted;
                let pa = FrameNumber::new(run_start).base();
                trace!("pmm: allocate({pages}) -> {pa}");
                return Some(pa);
            }
        }

        debug!("pmm: no run of {pages} free frame(s)");
        None
    }

    /// [`allocate`](Self::allocate) with the failure folded into address `0`.
    ///
    /// Frame 0 is never allocatable, so `0` is unambiguous.
    pub fn allocate_raw(&mut self, pages: usize) -> u64 {
        self.allocate(pages).map_or(0, PhysicalAddress::as_u64)
    }

    /// Release `pages` frames starting at `pa`.
    ///
    /// Freeing is idempotent and does not check that the range was allocated.
    /// Frames beyond the managed range are ignored, as are frames the
    /// allocator reserved for itself (frame 0, the kernel image and the bitmap
    /// storage); the rest of the request still takes effect and the first such
    /// problem is reported.
    ///
    /// # Errors
    /// - [`FreeError::Misaligned`] if `pa` is not frame aligned. Nothing is
    ///   freed in that case.
    /// - [`FreeError::OutOfRange`] if part of the range lies past the last frame.
    /// - [`FreeError::Protected`] if part of the range is permanently reserved.
    pub fn free(&mut self, pa: PhysicalAddress, pages: usize) -> Result<(), FreeError> {
        if pages == 0 {
            return Ok(());
        }
        if !pa.is_aligned::<Size4K>() {
            warn!("pmm: ignoring misaligned free of {pa}");
            return Err(FreeError::Misaligned { address: pa });
        }

        let start = pa.frame().index();
        let end = start.saturating_add(u64::try_from(pages).unwrap_or(u64::MAX));
        let total = self.layout.total_frames;

        let mut outcome = Ok(());
        for frame in start..end.min(total) {
            if self.is_protected(frame) {
                if outcome.is_ok() {
                    outcome = Err(FreeError::Protected {
                        frame: FrameNumber::new(frame),
                    });
                }
                continue;
            }
            if self.bitmap.clear(frame) == Some(true) {
                self.free_frames += 1;
            }
        }

        if end > total && outcome.is_ok() {
            outcome = Err(FreeError::OutOfRange {
                first_invalid: FrameNumber::new(start.max(total)),
                total_frames: total,
            });
        }

        match outcome {
            Ok(()) => trace!("pmm: free({pa}, {pages})"),
            Err(e) => warn!("pmm: free({pa}, {pages}): {e}"),
        }
        outcome
    }

    /// Number of frames the bitmap accounts for.
    #[inline]
    #[must_use]
    pub const fn total_frames(&self) -> u64 {
        self.layout.total_frames
    }

    #[inline]
    #[must_use]
    pub const fn free_frames(&self) -> u64 {
        self.free_frames
    }

    #[inline]
    #[must_use]
    pub const fn used_frames(&self) -> u64 {
        self.layout.total_frames - self.free_frames
    }

    /// Whether `frame` is unavailable. Frames past the end count as used.
    #[inline]
    #[must_use]
    pub fn is_frame_used(&self, frame: FrameNumber) -> bool {
        frame.index() >= self.layout.total_frames || self.bitmap.is_used(frame.index())
    }

    /// Physical base and page count of the bitmap storage.
    #[inline]
    #[must_use]
    pub const fn bitmap_region(&self) -> (PhysicalAddress, u64) {
        (self.placement.base, self.layout.bitmap_pages)
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &BitmapLayout {
        &self.layout
    }

    #[inline]
    #[must_use]
    pub const fn placement(&self) -> &BitmapPlacement {
        &self.placement
    }

    #[inline]
    #[must_use]
    pub const fn kernel_image(&self) -> &KernelImage {
        &self.kernel
    }

    /// The raw bitmap bytes, LSB-first per byte.
    #[inline]
    #[must_use]
    pub fn bitmap_bytes(&self) -> &[u8] {
        self.bitmap.as_bytes()
    }

    fn kernel_frames(&self) -> Range<u64> {
        covering_frames(self.kernel.start(), self.kernel.end())
    }

    fn bitmap_frames(&self) -> Range<u64> {
        let first = self.placement.base.frame().index();
        first..first + self.layout.bitmap_pages
    }

    fn is_protected(&self, frame: u64) -> bool {
        frame == 0 || self.kernel_frames().contains(&frame) || self.bitmap_frames().contains(&frame)
    }
}

impl PhysFrameAlloc for BitmapFrameAlloc<'_> {
    #[inline]
    fn alloc_4k(&mut self) -> Option<PhysicalAddress> {
        self.allocate(1)
    }

    #[inline]
    fn free_4k(&mut self, frame: PhysicalAddress) -> Result<(), FreeError> {
        self.free(frame, 1)
    }
}

impl core::fmt::Debug for BitmapFrameAlloc<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BitmapFrameAlloc")
            .field("total_frames", &self.layout.total_frames)
            .field("free_frames", &self.free_frames)
            .field("bitmap", &self.placement.base)
            .field("kernel", &self.kernel)
            .finish_non_exhaustive()
    }
}

/// Every frame touched by `[start, end)`, partial frames included.
fn covering_frames(start: PhysicalAddress, end: PhysicalAddress) -> Range<u64> {
    start.frame().index()..end.frame_ceil().index()
}
