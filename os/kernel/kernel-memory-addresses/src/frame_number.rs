use crate::{PageSize, PhysicalAddress, Size4K};
use core::fmt;

/// Index of a 4 KiB physical page frame (`physical address / 4096`).
///
/// ### Invariants
/// - The index never exceeds `u64::MAX >> 12`, so [`FrameNumber::base`]
///   always fits a physical address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FrameNumber(u64);

impl FrameNumber {
    /// Largest representable frame index.
    pub const MAX: Self = Self(u64::MAX >> Size4K::SHIFT);

    #[inline]
    #[must_use]
    pub const fn new(index: u64) -> Self {
        debug_assert!(index <= Self::MAX.0, "frame index out of range");
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> u64 {
        self.0
    }

    /// Physical base address of this frame.
    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        PhysicalAddress::new(self.0 << Size4K::SHIFT)
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, frames: u64) -> Option<Self> {
        match self.0.checked_add(frames) {
            Some(v) if v <= Self::MAX.0 => Some(Self(v)),
            _ => None,
        }
    }
}

impl fmt::Debug for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({:#X})", self.0)
    }
}

impl fmt::Display for FrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<PhysicalAddress> for FrameNumber {
    #[inline]
    fn from(pa: PhysicalAddress) -> Self {
        pa.frame()
    }
}
