//! # Kernel Boot Interface
//!
//! Data structures and layout constants shared between the boot loader and
//! the kernel's early memory bring-up.
//!
//! ## Modules
//!
//! ### Boot Information ([`boot`])
//! The loader-to-kernel hand-off, `#[repr(C)]` throughout:
//! * **Memory Map**: pointer and count of [`MemoryRegion`](memory_map::MemoryRegion) entries
//! * **Linear Mapping**: the offset at which all physical memory is mapped
//! * **Kernel Image**: the physical range the kernel binary occupies
//!
//! ### Memory Map ([`memory_map`])
//! Region kinds and a read-only [`MemoryMap`](memory_map::MemoryMap) view used
//! once while sizing and seeding the frame allocator.
//!
//! ### Memory Layout ([`memory`])
//! Compile-time virtual layout constants and the linker VA→PA relation of the
//! kernel image.
//!
//! ```text
//! Physical Memory Layout:
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low Memory (< 1MiB)         │
//!             │  (BIOS, VGA, frame 0 reserved)  │
//! PHYS_LOAD   ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Kernel Image              │
//!             ├─────────────────────────────────┤ page aligned
//!             │   Frame Bitmap (preferred)      │
//!             ├─────────────────────────────────┤
//!             │    Available RAM                │
//!             │  (Managed by the allocator)     │
//!             └─────────────────────────────────┘
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
pub mod memory_map;
