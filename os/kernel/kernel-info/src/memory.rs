//! # Memory Layout

use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

/// End of userspace VA range after which Kernel space begins.
pub const LAST_USERSPACE_ADDRESS: u64 = 0xffff_0000_0000_0000;

/// The Higher Half Direct Map (HHDM) base the loader uses by default.
/// Anything mapped at [`HHDM_BASE`] + `pa` lets the kernel
/// access physical memory via a fixed offset.
///
/// The value actually in effect is handed over in
/// [`LinearMapInfo`](crate::boot::LinearMapInfo); this constant is what the
/// loader puts there.
pub const HHDM_BASE: u64 = 0xffff_8880_0000_0000;

/// Where the kernel executes (VMA), matches the linker script.
pub const KERNEL_BASE: u64 = 0xffff_ffff_8000_0000;

/// Where the kernel image bytes are placed in *physical* memory (LMA).
pub const PHYS_LOAD: u64 = 0x0010_0000; // 1 MiB

const _: () = {
    assert!(HHDM_BASE >= LAST_USERSPACE_ADDRESS);
    assert!(KERNEL_BASE > HHDM_BASE);
    assert!(PHYS_LOAD.is_multiple_of(4096));
};

/// Translates a kernel-image virtual address (a linker symbol) to its
/// physical load address: `PHYS_LOAD + (va - KERNEL_BASE)`.
///
/// Returns `None` for addresses below [`KERNEL_BASE`], which are not part of
/// the linked image.
///
/// ```rust
/// # use kernel_info::memory::*;
/// # use kernel_memory_addresses::VirtualAddress;
/// let pa = kernel_va_to_pa(VirtualAddress::new(KERNEL_BASE + 0x2345)).unwrap();
/// assert_eq!(pa.as_u64(), PHYS_LOAD + 0x2345);
/// assert!(kernel_va_to_pa(VirtualAddress::new(HHDM_BASE)).is_none());
/// ```
#[must_use]
pub const fn kernel_va_to_pa(va: VirtualAddress) -> Option<PhysicalAddress> {
    match va.as_u64().checked_sub(KERNEL_BASE) {
        Some(delta) => match PHYS_LOAD.checked_add(delta) {
            Some(pa) => Some(PhysicalAddress::new(pa)),
            None => None,
        },
        None => None,
    }
}
