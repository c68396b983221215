use core::fmt;
use core::hash::Hash;

/// Sealed trait pattern to restrict `PageSize` impls to our markers.
mod sealed {
    pub trait Sealed {}
}

/// Marker trait for supported page sizes.
pub trait PageSize:
    sealed::Sealed + Clone + Copy + Eq + PartialEq + Ord + PartialOrd + Hash + fmt::Display + fmt::Debug
{
    /// Page size in bytes (power of two).
    const SIZE: u64;
    /// log2(SIZE), i.e., number of low bits used for the offset.
    const SHIFT: u32;

    fn as_str() -> &'static str;
}

/// 4 KiB page (4096 bytes), the only granularity the frame allocator manages.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Size4K;

impl sealed::Sealed for Size4K {}

impl PageSize for Size4K {
    const SIZE: u64 = 4096;
    const SHIFT: u32 = 12;

    fn as_str() -> &'static str {
        "4K"
    }
}

impl fmt::Display for Size4K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(Self::as_str())
    }
}

impl fmt::Debug for Size4K {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self, f)
    }
}

/// Size of a page frame in bytes.
pub const PAGE_SIZE: u64 = Size4K::SIZE;

const _: () = assert!(PAGE_SIZE.is_power_of_two() && 1 << Size4K::SHIFT == PAGE_SIZE);
