//! # Bitmap Placement
//!
//! The bitmap needs physical storage before any allocator exists, so its
//! pages are carved directly out of the memory map:
//!
//! 1. Prefer the first page boundary after the kernel image, provided the
//!    whole bitmap fits inside one usable region there.
//! 2. Otherwise take the first usable region (in map order) that can hold
//!    it, starting at the region's page-aligned base. Frame 0, the kernel
//!    image and reserved entries nested in the region are skipped over.
//!
//! Either way the storage never shares a byte with a non-usable entry: it is
//! filled with ones before the reserved entries are re-marked.

use crate::error::PmmInitError;
use crate::layout::BitmapLayout;
use kernel_info::boot::KernelImage;
use kernel_info::memory_map::{MemoryMap, MemoryRegion};
use kernel_memory_addresses::{PAGE_SIZE, PhysicalAddress, Size4K};

/// Which rule produced a [`BitmapPlacement`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlacementStrategy {
    AfterKernel,
    /// Index into the memory map of the region that received the bitmap.
    FirstFit { region: usize },
}

/// Where the bitmap storage lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BitmapPlacement {
    pub base: PhysicalAddress,
    pub strategy: PlacementStrategy,
}

/// Choose a page-aligned physical base for the bitmap storage.
///
/// # Errors
/// [`PmmInitError::NoRoomForBitmap`] if neither rule finds space.
pub fn place_bitmap(
    map: &MemoryMap<'_>,
    layout: &BitmapLayout,
    kernel: &KernelImage,
) -> Result<BitmapPlacement, PmmInitError> {
    let size = layout.storage_bytes();

    if let Some(candidate) = kernel.end().checked_align_up::<Size4K>()
        && !candidate.is_null()
        && map.usable().any(|r| fits(r, candidate, size))
        && blocker(map, candidate, size, kernel).is_none()
    {
        return Ok(BitmapPlacement {
            base: candidate,
            strategy: PlacementStrategy::AfterKernel,
        });
    }

    for (index, region) in map.iter().enumerate() {
        if !region.is_usable() {
            continue;
        }
        if let Some(base) = first_fit_in(map, region, size, kernel) {
            return Ok(BitmapPlacement {
                base,
                strategy: PlacementStrategy::FirstFit { region: index },
            });
        }
    }

    Err(PmmInitError::NoRoomForBitmap {
        bitmap_pages: layout.bitmap_pages,
    })
}

fn fits(region: &MemoryRegion, base: PhysicalAddress, size: u64) -> bool {
    base.checked_add(size)
        .is_some_and(|end| region.contains_range(base, end))
}

/// End of whatever keeps `[base, base + size)` from holding the bitmap: the
/// kernel image or the furthest-reaching overlapping reserved entry.
fn blocker(
    map: &MemoryMap<'_>,
    base: PhysicalAddress,
    size: u64,
    kernel: &KernelImage,
) -> Option<PhysicalAddress> {
    let end = base.checked_add(size)?;
    if kernel.overlaps(base, end) {
        return Some(kernel.end());
    }
    map.reserved()
        .filter(|r| r.overlaps(base, end))
        .map(MemoryRegion::end)
        .max()
}

fn first_fit_in(
    map: &MemoryMap<'_>,
    region: &MemoryRegion,
    size: u64,
    kernel: &KernelImage,
) -> Option<PhysicalAddress> {
    let mut candidate = region.start().checked_align_up::<Size4K>()?;

    // Frame 0 doubles as the allocation failure sentinel.
    if candidate.is_null() {
        candidate = PhysicalAddress::new(PAGE_SIZE);
    }

    // Every bump moves strictly forward, so this ends once the candidate
    // runs off the region.
    while fits(region, candidate, size) {
        match blocker(map, candidate, size, kernel) {
            None => return Some(candidate),
            Some(past) => candidate = past.checked_align_up::<Size4K>()?,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_info::memory_map::MemoryRegionKind;

    fn image(start: u64, end: u64) -> KernelImage {
        KernelImage::new(PhysicalAddress::new(start), PhysicalAddress::new(end))
    }

    #[test]
    fn prefers_the_page_after_the_kernel() {
        let regions = [MemoryRegion::usable(0x10_0000, 0x10_0000)];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        let p = place_bitmap(&map, &layout, &image(0x10_0000, 0x10_f123)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x11_0000));
        assert_eq!(p.strategy, PlacementStrategy::AfterKernel);
    }

    #[test]
    fn falls_back_to_first_fitting_usable_region() {
        let regions = [
            MemoryRegion::usable(0x1000, 0x1000),
            MemoryRegion::new(0x10_0000, 0x10_0000, MemoryRegionKind::KERNEL_AND_MODULES),
            MemoryRegion::usable(0x4000_0000, 0x4000_0000),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        assert_eq!(layout.bitmap_pages, 16);
        let p = place_bitmap(&map, &layout, &image(0x10_0000, 0x20_0000)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x4000_0000));
        assert_eq!(p.strategy, PlacementStrategy::FirstFit { region: 2 });
    }

    #[test]
    fn fallback_skips_frame_zero() {
        let regions = [MemoryRegion::usable(0, 0x8_0000)];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        // The kernel lies outside of the map, so the preferred slot is unusable.
        let p = place_bitmap(&map, &layout, &image(0x100_0000, 0x100_8000)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x1000));
    }

    #[test]
    fn fallback_skips_the_kernel_image() {
        let regions = [
            MemoryRegion::usable(0x1000, 0x2800),
            MemoryRegion::usable(0x8000, 0x1000),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        // The slot after the kernel runs past the end of the first region.
        let p = place_bitmap(&map, &layout, &image(0x1000, 0x3000)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x8000));
        assert_eq!(p.strategy, PlacementStrategy::FirstFit { region: 1 });
    }

    #[test]
    fn preferred_slot_must_not_overlap_a_reserved_hole() {
        let regions = [
            MemoryRegion::usable(0, 0x4_0000),
            MemoryRegion::new(0x4000, 0x1000, MemoryRegionKind::ACPI_NVS),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        let p = place_bitmap(&map, &layout, &image(0x1000, 0x4000)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x5000));
        assert_eq!(p.strategy, PlacementStrategy::FirstFit { region: 0 });
    }

    #[test]
    fn fallback_steps_over_consecutive_holes() {
        let regions = [
            MemoryRegion::usable(0, 0x10_0000),
            MemoryRegion::new(0x1000, 0x800, MemoryRegionKind::RESERVED),
            MemoryRegion::new(0x1800, 0x1000, MemoryRegionKind::from_raw(0x4000_0000)),
            MemoryRegion::new(0x3000, 0x1000, MemoryRegionKind::BAD_MEMORY),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        // Kernel outside the map, so only the fallback applies.
        let p = place_bitmap(&map, &layout, &image(0x200_0000, 0x200_1000)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x4000));
    }

    #[test]
    fn hole_filling_the_region_leaves_no_room() {
        let regions = [
            MemoryRegion::usable(0x1000, 0x1000),
            MemoryRegion::new(0x1000, 0x1000, MemoryRegionKind::ACPI_NVS),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        assert_eq!(
            place_bitmap(&map, &layout, &image(0x8000, 0x9000)),
            Err(PmmInitError::NoRoomForBitmap { bitmap_pages: 1 })
        );
    }

    #[test]
    fn unaligned_region_base_is_rounded_up() {
        let regions = [
            MemoryRegion::usable(0x1_0800, 0x2000),
            MemoryRegion::new(0x10_0000, 0x1000, MemoryRegionKind::RESERVED),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        let p = place_bitmap(&map, &layout, &image(0x10_0000, 0x10_1000)).unwrap();
        assert_eq!(p.base, PhysicalAddress::new(0x1_1000));
    }

    #[test]
    fn reports_when_nothing_fits() {
        let regions = [
            MemoryRegion::usable(0x1000, 0x800),
            MemoryRegion::new(0x10_0000, 0x10_0000, MemoryRegionKind::RESERVED),
        ];
        let map = MemoryMap::new(&regions);
        let layout = BitmapLayout::from_memory_map(&map).unwrap();
        assert_eq!(
            place_bitmap(&map, &layout, &image(0x10_0000, 0x10_1000)),
            Err(PmmInitError::NoRoomForBitmap { bitmap_pages: 1 })
        );
    }
}
