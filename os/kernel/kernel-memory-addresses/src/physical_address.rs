use crate::{FrameNumber, MemoryAddress, PageSize, Size4K};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Physical memory address.
///
/// A thin wrapper around [`MemoryAddress`] that denotes **physical** addresses
/// (host RAM / MMIO). Like [`VirtualAddress`](crate::VirtualAddress), this type
/// carries intent and prevents accidental VA↔PA mix-ups.
///
/// ### Semantics
/// - [`PhysicalAddress::frame`] yields the 4 KiB frame containing the address.
/// - [`PhysicalAddress::frame_ceil`] yields the first frame that starts at or
///   after the address; use it as the exclusive end of a byte range.
///
/// ### Examples
/// ```rust
/// # use kernel_memory_addresses::*;
/// let pa = PhysicalAddress::new(0x0010_2042);
/// assert_eq!(pa.frame().index(), 0x102);
/// assert_eq!(pa.frame_ceil().index(), 0x103);
/// assert_eq!(pa.align_down::<Size4K>().as_u64(), 0x0010_2000);
/// ```
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(pub(crate) MemoryAddress);

impl PhysicalAddress {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(MemoryAddress::new(v))
    }

    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0.as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.as_u64() == 0
    }

    #[inline]
    #[must_use]
    pub const fn align_down<S: PageSize>(self) -> Self {
        Self(self.0.align_down::<S>())
    }

    #[inline]
    #[must_use]
    pub const fn checked_align_up<S: PageSize>(self) -> Option<Self> {
        match self.0.checked_align_up::<S>() {
            Some(a) => Some(Self(a)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned<S: PageSize>(self) -> bool {
        self.0.is_aligned::<S>()
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(a) => Some(Self(a)),
            None => None,
        }
    }

    /// The 4 KiB frame that contains this address.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> FrameNumber {
        FrameNumber::new(self.as_u64() >> Size4K::SHIFT)
    }

    /// The first 4 KiB frame starting at or above this address.
    #[inline]
    #[must_use]
    pub const fn frame_ceil(self) -> FrameNumber {
        let index = self.as_u64() >> Size4K::SHIFT;
        if self.is_aligned::<Size4K>() {
            FrameNumber::new(index)
        } else {
            FrameNumber::new(index + 1)
        }
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PA(0x{:016X})", self.as_u64())
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<PhysicalAddress> for u64 {
    #[inline]
    fn from(a: PhysicalAddress) -> Self {
        a.as_u64()
    }
}

impl Add<u64> for PhysicalAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for PhysicalAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
