//! # Linear-Map Address Translation
//!
//! The boot loader maps all of physical memory at a constant virtual offset
//! (the linear map, often called HHDM). Translating between the two views is
//! a single addition or subtraction; this module wraps that in a
//! [`PhysMapper`] so the allocator and its tests can swap the mapping
//! strategy.
//!
//! ## Example
//! ```rust
//! use kernel_alloc::phys_mapper::{LinearMapper, PhysMapper};
//! use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};
//!
//! let mapper = LinearMapper::new(0xffff_8000_0000_0000);
//! let va = mapper.phys_to_virt(PhysicalAddress::new(0x1000));
//! assert_eq!(va, VirtualAddress::new(0xffff_8000_0000_1000));
//! assert_eq!(mapper.virt_to_phys(va), PhysicalAddress::new(0x1000));
//! ```

use crate::error::PmmInitError;
use kernel_info::boot::LinearMapInfo;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// Converts physical addresses to usable pointers in the current virtual
/// address space and back.
///
/// Both conversions are pure arithmetic and never fail. Whether the
/// resulting address is actually mapped is the business of the accessors.
pub trait PhysMapper {
    /// Kernel-virtual alias of `pa`.
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress;

    /// Physical address behind the kernel-virtual alias `va`.
    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress;

    /// Borrow the object at physical address `pa`.
    ///
    /// # Safety
    /// - `pa` must be mapped writable in the current page tables and suitably
    ///   aligned for `T`.
    /// - The mapping must remain valid for `'a` and nothing else may alias
    ///   the object for that long.
    #[inline]
    unsafe fn phys_to_mut<'a, T>(&self, pa: PhysicalAddress) -> &'a mut T {
        let ptr = self.phys_to_virt(pa).as_mut_ptr::<T>();
        // SAFETY: Caller guarantees mapping, alignment, and exclusivity.
        unsafe { &mut *ptr }
    }

    /// Borrow `len` bytes of physical memory starting at `pa`.
    ///
    /// # Safety
    /// Same contract as [`phys_to_mut`](Self::phys_to_mut), for the whole
    /// byte range.
    #[inline]
    unsafe fn phys_to_bytes_mut<'a>(&self, pa: PhysicalAddress, len: usize) -> &'a mut [u8] {
        let ptr = self.phys_to_virt(pa).as_mut_ptr::<u8>();
        // SAFETY: Caller guarantees the range is mapped, writable, and unaliased.
        unsafe { core::slice::from_raw_parts_mut(ptr, len) }
    }
}

impl<M: PhysMapper + ?Sized> PhysMapper for &M {
    #[inline]
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        (**self).phys_to_virt(pa)
    }

    #[inline]
    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        (**self).virt_to_phys(va)
    }
}

/// [`PhysMapper`] for a linear map at a fixed virtual offset.
///
/// Arithmetic wraps, so `virt_to_phys(phys_to_virt(pa)) == pa` holds for
/// every address. Tests use the host address of a buffer as the offset to
/// simulate physical RAM.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LinearMapper {
    offset: u64,
}

impl LinearMapper {
    #[inline]
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    /// Build the mapper from the loader-reported linear map.
    ///
    /// # Errors
    /// [`PmmInitError::MissingLinearMap`] if the loader did not provide one.
    #[inline]
    pub const fn from_boot_info(info: &LinearMapInfo) -> Result<Self, PmmInitError> {
        match info.offset() {
            Some(offset) => Ok(Self::new(offset)),
            None => Err(PmmInitError::MissingLinearMap),
        }
    }

    #[inline]
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl PhysMapper for LinearMapper {
    #[inline]
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(pa.as_u64().wrapping_add(self.offset))
    }

    #[inline]
    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        PhysicalAddress::new(va.as_u64().wrapping_sub(self.offset))
    }
}
