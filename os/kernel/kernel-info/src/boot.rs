//! # Kernel Boot Information

use crate::memory::kernel_va_to_pa;
use crate::memory_map::{MemoryMap, MemoryRegion};
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Information the kernel needs right after the loader hands over control.
/// Keep this `#[repr(C)]` and prefer fixed-size integers at the ABI boundary.
#[repr(C)]
#[derive(Clone)]
pub struct KernelBootInfo {
    /// Physical memory map.
    pub mmap: MemoryMapInfo,

    /// Offset of the linear (higher-half direct) mapping of all physical memory.
    pub linear_map: LinearMapInfo,

    /// Physical range occupied by the loaded kernel image.
    pub kernel_image: KernelImage,
}

#[repr(C)]
#[derive(Clone)]
pub struct MemoryMapInfo {
    /// Pointer to an array of [`MemoryRegion`] entries.
    /// 0 if the loader did not provide a memory map.
    pub regions_ptr: u64,

    /// Number of [`MemoryRegion`] entries at `regions_ptr`.
    pub region_count: u64,
}

impl MemoryMapInfo {
    /// Describes a memory map that lives in `regions`.
    #[must_use]
    pub fn from_slice(regions: &[MemoryRegion]) -> Self {
        Self {
            regions_ptr: regions.as_ptr() as u64,
            region_count: regions.len() as u64,
        }
    }

    /// No memory map was handed over.
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            regions_ptr: 0,
            region_count: 0,
        }
    }

    /// Views the handed-over entries as a [`MemoryMap`], or `None` if the
    /// loader did not provide one.
    ///
    /// # Safety
    /// `regions_ptr` must point to `region_count` initialized, properly
    /// aligned [`MemoryRegion`] values that stay valid and unmodified for `'a`.
    #[allow(unsafe_code, clippy::cast_possible_truncation)]
    #[must_use]
    pub unsafe fn memory_map<'a>(&self) -> Option<MemoryMap<'a>> {
        if self.regions_ptr == 0 {
            return None;
        }
        let ptr = self.regions_ptr as usize as *const MemoryRegion;
        // SAFETY: upheld by the caller.
        let regions = unsafe { core::slice::from_raw_parts(ptr, self.region_count as usize) };
        Some(MemoryMap::new(regions))
    }
}

/// The linear-mapping offset: physical byte `pa` is accessible at `pa + offset`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LinearMapInfo {
    offset: u64,
    present: bool,
}

impl LinearMapInfo {
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self {
            offset,
            present: true,
        }
    }

    /// The loader did not establish a linear mapping.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            offset: 0,
            present: false,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> Option<u64> {
        if self.present {
            Some(self.offset)
        } else {
            None
        }
    }
}

/// Physical extent `[start, end)` of the loaded kernel image.
///
/// Both bounds are mandatory; there is no "starts at 0" default.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KernelImage {
    pub phys_start: u64,
    pub phys_end: u64,
}

impl KernelImage {
    #[must_use]
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        Self {
            phys_start: start.as_u64(),
            phys_end: end.as_u64(),
        }
    }

    /// Builds the physical extent from the linker's start/end symbols of an
    /// image linked at [`KERNEL_BASE`](crate::memory::KERNEL_BASE).
    ///
    /// ```rust
    /// # use kernel_info::boot::KernelImage;
    /// # use kernel_info::memory::{KERNEL_BASE, PHYS_LOAD};
    /// # use kernel_memory_addresses::VirtualAddress;
    /// let image = KernelImage::from_linked_range(
    ///     VirtualAddress::new(KERNEL_BASE),
    ///     VirtualAddress::new(KERNEL_BASE + 0x4_2000),
    /// ).unwrap();
    /// assert_eq!(image.start().as_u64(), PHYS_LOAD);
    /// assert_eq!(image.end().as_u64(), PHYS_LOAD + 0x4_2000);
    /// ```
    #[must_use]
    pub const fn from_linked_range(start: VirtualAddress, end: VirtualAddress) -> Option<Self> {
        match (kernel_va_to_pa(start), kernel_va_to_pa(end)) {
            (Some(s), Some(e)) if s.as_u64() <= e.as_u64() => Some(Self::new(s, e)),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.phys_start)
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.phys_end)
    }

    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.phys_start <= self.phys_end
    }

    /// Whether `[start, end)` shares at least one byte with the image.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, start: PhysicalAddress, end: PhysicalAddress) -> bool {
        start.as_u64() < self.phys_end && self.phys_start < end.as_u64()
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::memory_map::MemoryRegionKind;

    #[test]
    fn missing_memory_map_is_none() {
        let info = MemoryMapInfo::missing();
        assert!(unsafe { info.memory_map() }.is_none());
    }

    #[test]
    fn memory_map_round_trips_through_raw_parts() {
        let regions = [
            MemoryRegion::usable(0x10_0000, 0x10_0000),
            MemoryRegion::new(0x20_0000, 0x1000, MemoryRegionKind::RESERVED),
        ];
        let info = MemoryMapInfo::from_slice(&regions);
        let map = unsafe { info.memory_map() }.expect("map present");
        assert_eq!(map.len(), 2);
        assert_eq!(map.regions()[1].kind, MemoryRegionKind::RESERVED);
    }

    #[test]
    fn unknown_loader_tags_read_as_reserved() {
        // Entry layout as a loader writes it.
        #[repr(C)]
        struct LoaderEntry {
            base: u64,
            length: u64,
            tag: u32,
        }

        let entries = [
            LoaderEntry { base: 0, length: 0x8000, tag: 0 },
            LoaderEntry { base: 0x8000, length: 0x1000, tag: 0x1000_0001 },
        ];
        let info = MemoryMapInfo {
            regions_ptr: entries.as_ptr() as u64,
            region_count: entries.len() as u64,
        };
        let map = unsafe { info.memory_map() }.expect("map present");
        assert!(map.regions()[0].is_usable());
        assert_eq!(map.regions()[1].kind.as_raw(), 0x1000_0001);
        assert!(!map.regions()[1].is_usable());
        assert_eq!(map.usable().count(), 1);
    }

    #[test]
    fn linear_map_presence() {
        assert_eq!(LinearMapInfo::new(0xffff_8880_0000_0000).offset(), Some(0xffff_8880_0000_0000));
        assert_eq!(LinearMapInfo::new(0).offset(), Some(0));
        assert_eq!(LinearMapInfo::absent().offset(), None);
    }

    #[test]
    fn kernel_image_overlap() {
        let image = KernelImage::new(PhysicalAddress::new(0x10_0000), PhysicalAddress::new(0x11_0000));
        assert!(image.overlaps(PhysicalAddress::new(0x10_f000), PhysicalAddress::new(0x11_1000)));
        assert!(!image.overlaps(PhysicalAddress::new(0x11_0000), PhysicalAddress::new(0x11_1000)));
        assert!(!image.overlaps(PhysicalAddress::new(0x0f_0000), PhysicalAddress::new(0x10_0000)));
    }

    #[test]
    fn linked_range_below_kernel_base_is_rejected() {
        assert!(KernelImage::from_linked_range(VirtualAddress::new(0x1000), VirtualAddress::new(0x2000)).is_none());
    }
}
