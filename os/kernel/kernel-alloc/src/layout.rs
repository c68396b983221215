//! Bitmap sizing from the boot memory map.

use crate::error::PmmInitError;
use kernel_info::memory_map::MemoryMap;
use kernel_memory_addresses::{PageSize, Size4K};

/// How many frames the allocator tracks and how much storage that takes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BitmapLayout {
    /// Frames below the highest address in the map, rounded up so a
    /// trailing partial frame is still covered.
    pub total_frames: u64,
    /// `ceil(total_frames / 8)`.
    pub bitmap_bytes: u64,
    /// `ceil(bitmap_bytes / PAGE_SIZE)`.
    pub bitmap_pages: u64,
}

impl BitmapLayout {
    /// Size the bitmap for `map`.
    ///
    /// The highest `base + length` over *all* regions is considered, not only
    /// usable ones, so every frame number below it has a bit.
    ///
    /// # Errors
    /// [`PmmInitError::EmptyMemoryMap`] if the map has no entries or describes
    /// no memory at all.
    pub fn from_memory_map(map: &MemoryMap<'_>) -> Result<Self, PmmInitError> {
        if map.is_empty() {
            return Err(PmmInitError::EmptyMemoryMap);
        }

        let top = map.highest_address().as_u64();
        if top == 0 {
            return Err(PmmInitError::EmptyMemoryMap);
        }

        Ok(Self::for_frames(top.div_ceil(Size4K::SIZE)))
    }

    /// Layout for exactly `total_frames` frames.
    #[must_use]
    pub const fn for_frames(total_frames: u64) -> Self {
        let bitmap_bytes = total_frames.div_ceil(8);
        Self {
            total_frames,
            bitmap_bytes,
            bitmap_pages: bitmap_bytes.div_ceil(Size4K::SIZE),
        }
    }

    /// Bytes of physical memory reserved for the bitmap (whole pages).
    #[inline]
    #[must_use]
    pub const fn storage_bytes(&self) -> u64 {
        self.bitmap_pages * Size4K::SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_info::memory_map::{MemoryRegion, MemoryRegionKind};

    #[test]
    fn one_gib_of_ram() {
        let regions = [MemoryRegion::usable(0, 0x4000_0000)];
        let l = BitmapLayout::from_memory_map(&MemoryMap::new(&regions)).unwrap();
        assert_eq!(l.total_frames, 262_144);
        assert_eq!(l.bitmap_bytes, 32_768);
        assert_eq!(l.bitmap_pages, 8);
        assert_eq!(l.storage_bytes(), 0x8000);
    }

    #[test]
    fn reserved_regions_extend_the_range() {
        let regions = [
            MemoryRegion::usable(0x1000, 0x9_f000),
            MemoryRegion::new(0xfee0_0000, 0x1000, MemoryRegionKind::RESERVED),
        ];
        let l = BitmapLayout::from_memory_map(&MemoryMap::new(&regions)).unwrap();
        assert_eq!(l.total_frames, 0xfee01);
    }

    #[test]
    fn trailing_partial_frame_is_counted() {
        let regions = [MemoryRegion::usable(0, 0x1_0800)];
        let l = BitmapLayout::from_memory_map(&MemoryMap::new(&regions)).unwrap();
        assert_eq!(l.total_frames, 17);
        assert_eq!(l.bitmap_bytes, 3);
        assert_eq!(l.bitmap_pages, 1);
    }

    #[test]
    fn empty_maps_are_rejected() {
        assert_eq!(
            BitmapLayout::from_memory_map(&MemoryMap::new(&[])),
            Err(PmmInitError::EmptyMemoryMap)
        );
        let zero = [MemoryRegion::usable(0, 0)];
        assert_eq!(
            BitmapLayout::from_memory_map(&MemoryMap::new(&zero)),
            Err(PmmInitError::EmptyMemoryMap)
        );
    }
}
