//! # Physical and Virtual Memory Address Types
//!
//! Strongly typed wrappers for the raw addresses and page-frame indices used by
//! the physical memory manager.
//!
//! ## Overview
//!
//! | Type | Description |
//! |------|-------------|
//! | [`MemoryAddress`] | A raw 64-bit address, either physical or virtual. |
//! | [`PhysicalAddress`] | A physical address (RAM or MMIO). |
//! | [`VirtualAddress`] | An address in the current virtual address space. |
//! | [`FrameNumber`] | The index of a 4 KiB physical page frame. |
//!
//! The frame allocator works in units of [`PAGE_SIZE`] (4 KiB, [`Size4K`]).
//! Keeping physical and virtual addresses apart at the type level means the
//! linear-map translation is the *only* way to get from one to the other.
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0011_0fff);
//! let frame = pa.frame();
//! assert_eq!(frame.index(), 0x110);
//! assert_eq!(frame.base(), PhysicalAddress::new(0x0011_0000));
//! assert_eq!(pa.checked_align_up::<Size4K>(), Some(PhysicalAddress::new(0x0011_1000)));
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code, clippy::inline_always)]

mod frame_number;
mod memory_address;
mod page_size;
mod physical_address;
mod virtual_address;

pub use frame_number::FrameNumber;
pub use memory_address::{MemoryAddress, align_down, checked_align_up};
pub use page_size::{PAGE_SIZE, PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use virtual_address::VirtualAddress;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_of_address_rounds_down() {
        assert_eq!(PhysicalAddress::new(0).frame().index(), 0);
        assert_eq!(PhysicalAddress::new(0xFFF).frame().index(), 0);
        assert_eq!(PhysicalAddress::new(0x1000).frame().index(), 1);
    }

    #[test]
    fn frame_ceil_rounds_up_only_when_unaligned() {
        assert_eq!(PhysicalAddress::new(0x20_0000).frame_ceil().index(), 0x200);
        assert_eq!(PhysicalAddress::new(0x20_0001).frame_ceil().index(), 0x201);
    }

    #[test]
    fn frame_base_round_trips() {
        let frame = FrameNumber::new(0x1234);
        assert_eq!(frame.base().as_u64(), 0x123_4000);
        assert_eq!(frame.base().frame(), frame);
    }

    #[test]
    fn frame_checked_add_respects_max() {
        assert_eq!(FrameNumber::new(1).checked_add(2), Some(FrameNumber::new(3)));
        assert_eq!(FrameNumber::MAX.checked_add(1), None);
    }

    #[test]
    fn alignment_helpers() {
        let a = MemoryAddress::new(0x12345);
        assert_eq!(a.align_down::<Size4K>().as_u64(), 0x12000);
        assert_eq!(a.checked_align_up::<Size4K>().map(u64::from), Some(0x13000));
        assert!(!a.is_aligned::<Size4K>());
        assert!(MemoryAddress::new(0x13000).is_aligned::<Size4K>());
    }

    #[test]
    fn align_up_overflow_is_reported() {
        let pa = PhysicalAddress::new(u64::MAX - 1);
        assert_eq!(pa.checked_align_up::<Size4K>(), None);
        assert_eq!(pa.checked_add(2), None);
    }

    #[test]
    fn virtual_pointer_round_trip() {
        let value = 7u32;
        let va = VirtualAddress::from_ptr(&raw const value);
        assert_eq!(va.as_mut_ptr::<u32>().cast_const(), &raw const value);
    }
}
