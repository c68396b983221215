//! # Physical Memory Management
//!
//! Boot-time physical frame allocation for the kernel. The boot loader hands
//! over a memory map, a linear mapping of all physical memory and the
//! physical extent of the kernel image; from those this crate builds a
//! bitmap allocator that needs no heap and no prior allocator.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  PageBackend: pages as kernel pointers       │
//! └──────────────────┬───────────────────────────┘
//!                    │
//! ┌──────────────────▼───────────────────────────┐
//! │  LockedFrameAlloc: spin lock + IRQ masking   │
//! └──────────────────┬───────────────────────────┘
//!                    │
//! ┌──────────────────▼───────────────────────────┐
//! │  BitmapFrameAlloc: first-fit over frames     │
//! │   • layout: how many frames, how many bytes  │
//! │   • placement: where the bitmap lives        │
//! │   • bitmap: bounds-checked bit-set           │
//! └──────────────────┬───────────────────────────┘
//!                    │
//! ┌──────────────────▼───────────────────────────┐
//! │  PhysMapper: physical <-> linear-map virtual │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! * [`bitmap`]: one bit per frame, set = used.
//! * [`layout`]: bitmap sizing from the highest address in the map.
//! * [`placement`]: bootstrap placement of the bitmap storage.
//! * [`frame_alloc`]: the allocator proper.
//! * [`phys_mapper`]: address translation over the linear map.
//! * [`locked`]: the interrupt-safe shared wrapper.
//! * [`pages`]: page-granular hooks for a general-purpose heap.
//!
//! ## Usage
//! ```rust
//! use kernel_alloc::frame_alloc::BitmapFrameAlloc;
//! use kernel_alloc::locked::LockedFrameAlloc;
//! use kernel_alloc::phys_mapper::LinearMapper;
//! use kernel_info::boot::KernelImage;
//! use kernel_info::memory_map::{MemoryMap, MemoryRegion};
//! use kernel_memory_addresses::PhysicalAddress;
//! use kernel_sync::NoInterrupts;
//!
//! // 256 KiB of simulated physical memory.
//! let mut ram = vec![0u8; 0x4_0000];
//! let mapper = LinearMapper::new(ram.as_mut_ptr() as u64);
//! let regions = [MemoryRegion::usable(0, 0x4_0000)];
//! let kernel = KernelImage::new(PhysicalAddress::new(0x1000), PhysicalAddress::new(0x3000));
//!
//! let pmm = unsafe { BitmapFrameAlloc::init(MemoryMap::new(&regions), kernel, &mapper) }
//!     .expect("memory map is valid");
//! let pmm = LockedFrameAlloc::new(pmm, NoInterrupts);
//!
//! let frame = pmm.allocate(1).expect("memory is available");
//! assert_eq!(frame, PhysicalAddress::new(0x4000));
//! pmm.free(frame, 1).expect("frame was allocated");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod bitmap;
pub mod error;
pub mod frame_alloc;
pub mod layout;
pub mod locked;
pub mod pages;
pub mod phys_mapper;
pub mod placement;

pub use error::{FreeError, PmmInitError};
pub use frame_alloc::{BitmapFrameAlloc, PhysFrameAlloc};
pub use locked::LockedFrameAlloc;
pub use pages::PageBackend;
pub use phys_mapper::{LinearMapper, PhysMapper};
