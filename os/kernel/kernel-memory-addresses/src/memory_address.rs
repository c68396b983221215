use crate::PageSize;
use core::fmt;
use core::ops::{Add, AddAssign};
use core::ptr::NonNull;

/// Principal raw memory address ([virtual](super::VirtualAddress) or [physical](super::PhysicalAddress)).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MemoryAddress(u64);

impl MemoryAddress {
    #[inline]
    #[must_use]
    pub const fn from_nonnull<T>(ptr: NonNull<T>) -> Self {
        Self::from_ptr(ptr.as_ptr())
    }

    #[inline]
    #[must_use]
    pub const fn from_ptr<T>(ptr: *const T) -> Self {
        const _: () = assert!(
            size_of::<*const ()>() == size_of::<u64>(),
            "pointer size mismatch"
        );

        // using a union to const-time convert a pointer to an u64
        union Ptr<T> {
            ptr: *const T,
            raw: u64,
        }

        let ptr = Ptr { ptr };
        Self::new(unsafe { ptr.raw })
    }

    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Align down to page boundary `S`.
    #[inline]
    #[must_use]
    pub const fn align_down<S: PageSize>(self) -> Self {
        Self(align_down(self.0, S::SIZE))
    }

    /// Align up to page boundary `S`, or `None` if that would overflow.
    #[inline]
    #[must_use]
    pub const fn checked_align_up<S: PageSize>(self) -> Option<Self> {
        match checked_align_up(self.0, S::SIZE) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_aligned<S: PageSize>(self) -> bool {
        self.0 & (S::SIZE - 1) == 0
    }

    #[inline]
    #[must_use]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

/// Align `x` down to the nearest multiple of `a` (`a` must be a power of two).
///
/// ```rust
/// # use kernel_memory_addresses::align_down;
/// assert_eq!(align_down(0x12345, 4096), 0x12000);
/// assert_eq!(align_down(0x12000, 4096), 0x12000);
/// ```
#[inline]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a` (`a` must be a power of two).
///
/// Returns `None` when the aligned value does not fit a `u64`.
///
/// ```rust
/// # use kernel_memory_addresses::checked_align_up;
/// assert_eq!(checked_align_up(0x12001, 4096), Some(0x13000));
/// assert_eq!(checked_align_up(0x12000, 4096), Some(0x12000));
/// assert_eq!(checked_align_up(u64::MAX, 4096), None);
/// ```
#[inline]
#[must_use]
pub const fn checked_align_up(x: u64, a: u64) -> Option<u64> {
    match x.checked_add(a - 1) {
        Some(v) => Some(v & !(a - 1)),
        None => None,
    }
}

impl fmt::Debug for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 0xHHHH_HHHH_HHHH_HHHH style
        write!(f, "MemoryAddress(0x{:016X})", self.0)
    }
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.as_u64())
    }
}

impl From<u64> for MemoryAddress {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl From<MemoryAddress> for u64 {
    #[inline]
    fn from(a: MemoryAddress) -> Self {
        a.as_u64()
    }
}

impl Add<u64> for MemoryAddress {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for MemoryAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
