/// Stop this core for good.
///
/// Interrupts are masked first so nothing can wake the core back into code
/// that has nowhere to go.
#[allow(unsafe_code)]
pub fn halt_forever() -> ! {
    loop {
        #[cfg(target_arch = "x86_64")]
        unsafe {
            core::arch::asm!("cli", "hlt", options(nomem, nostack));
        }

        #[cfg(target_arch = "aarch64")]
        unsafe {
            core::arch::asm!("msr daifset, #0xf", "wfi", options(nomem, nostack));
        }

        #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))]
        unsafe {
            core::arch::asm!("csrci mstatus, 8", "wfi", options(nomem, nostack));
        }

        #[cfg(not(any(
            target_arch = "x86_64",
            target_arch = "aarch64",
            target_arch = "riscv32",
            target_arch = "riscv64"
        )))]
        core::hint::spin_loop();
    }
}
