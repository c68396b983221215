//! # Boot Memory Map
//!
//! The physical memory map as reported by the boot loader. The kernel reads it
//! exactly once, while bringing up the frame allocator.

use core::fmt;
use kernel_memory_addresses::PhysicalAddress;

/// Classification of a physical memory region, as the raw loader tag.
///
/// The set of tags is open: loaders define more kinds than are named here.
/// Only [`MemoryRegionKind::USABLE`] memory is ever handed out by the frame
/// allocator; every other tag, known or not, is treated as reserved.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct MemoryRegionKind(u32);

impl MemoryRegionKind {
    /// Free RAM.
    pub const USABLE: Self = Self(0);
    /// Firmware or hardware reserved.
    pub const RESERVED: Self = Self(1);
    /// ACPI tables; reclaimable once parsed.
    pub const ACPI_RECLAIMABLE: Self = Self(2);
    /// ACPI non-volatile storage.
    pub const ACPI_NVS: Self = Self(3);
    /// Defective RAM.
    pub const BAD_MEMORY: Self = Self(4);
    /// Loader data structures (page tables, this map); reclaimable later.
    pub const BOOTLOADER_RECLAIMABLE: Self = Self(5);
    /// The kernel image and loaded modules.
    pub const KERNEL_AND_MODULES: Self = Self(6);
    /// Linear framebuffer.
    pub const FRAMEBUFFER: Self = Self(7);

    #[inline]
    #[must_use]
    pub const fn from_raw(tag: u32) -> Self {
        Self(tag)
    }

    #[inline]
    #[must_use]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_usable(self) -> bool {
        self.0 == Self::USABLE.0
    }

    /// Name of a known tag, `None` for tags this kernel does not know.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "usable",
            1 => "reserved",
            2 => "acpi-reclaimable",
            3 => "acpi-nvs",
            4 => "bad",
            5 => "bootloader-reclaimable",
            6 => "kernel",
            7 => "framebuffer",
            _ => return None,
        })
    }
}

impl fmt::Display for MemoryRegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown({})", self.0),
        }
    }
}

impl fmt::Debug for MemoryRegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryRegionKind({self})")
    }
}

/// One entry of the boot memory map: `[base, base + length)` of a given kind.
#[repr(C)]
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct MemoryRegion {
    /// Physical start address in bytes.
    pub base: u64,
    /// Length in bytes.
    pub length: u64,
    /// What the region may be used for.
    pub kind: MemoryRegionKind,
}

impl MemoryRegion {
    #[must_use]
    pub const fn new(base: u64, length: u64, kind: MemoryRegionKind) -> Self {
        Self { base, length, kind }
    }

    #[must_use]
    pub const fn usable(base: u64, length: u64) -> Self {
        Self::new(base, length, MemoryRegionKind::USABLE)
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base)
    }

    /// Exclusive end of the region. Saturates for malformed entries whose
    /// `base + length` would wrap.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        PhysicalAddress::new(self.base.saturating_add(self.length))
    }

    #[inline]
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.kind.is_usable()
    }

    /// Whether `[start, end)` lies entirely within this region.
    #[inline]
    #[must_use]
    pub const fn contains_range(&self, start: PhysicalAddress, end: PhysicalAddress) -> bool {
        start.as_u64() >= self.base
            && end.as_u64() >= start.as_u64()
            && end.as_u64() <= self.end().as_u64()
    }

    /// Whether `[start, end)` shares at least one byte with this region.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, start: PhysicalAddress, end: PhysicalAddress) -> bool {
        start.as_u64() < self.end().as_u64() && self.base < end.as_u64()
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryRegion({:#018x}..{:#018x}, {})",
            self.base,
            self.end().as_u64(),
            self.kind
        )
    }
}

/// Read-only view over the boot memory map.
///
/// Order of the entries is whatever the loader produced; consumers must not
/// rely on it being sorted or free of overlaps.
#[derive(Debug, Copy, Clone)]
pub struct MemoryMap<'a> {
    regions: &'a [MemoryRegion],
}

impl<'a> MemoryMap<'a> {
    #[must_use]
    pub const fn new(regions: &'a [MemoryRegion]) -> Self {
        Self { regions }
    }

    #[inline]
    #[must_use]
    pub const fn regions(&self) -> &'a [MemoryRegion] {
        self.regions
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'a, MemoryRegion> {
        self.regions.iter()
    }

    pub fn usable(&self) -> impl Iterator<Item = &'a MemoryRegion> + use<'a> {
        self.regions.iter().filter(|r| r.is_usable())
    }

    pub fn reserved(&self) -> impl Iterator<Item = &'a MemoryRegion> + use<'a> {
        self.regions.iter().filter(|r| !r.is_usable())
    }

    /// The highest `base + length` over all regions, regardless of kind.
    #[must_use]
    pub fn highest_address(&self) -> PhysicalAddress {
        self.regions
            .iter()
            .map(MemoryRegion::end)
            .max()
            .unwrap_or_default()
    }

    /// Total bytes reported as usable.
    #[must_use]
    pub fn usable_bytes(&self) -> u64 {
        self.usable().fold(0, |acc, r| acc.saturating_add(r.length))
    }
}

impl<'a> IntoIterator for &MemoryMap<'a> {
    type Item = &'a MemoryRegion;
    type IntoIter = core::slice::Iter<'a, MemoryRegion>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.iter()
    }
}
