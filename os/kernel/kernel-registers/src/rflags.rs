use bitfield_struct::bitfield;

/// Architectural RFLAGS model for x86-64.
///
/// Only the interrupt-enable flag matters to the memory manager, but the full
/// layout is modeled so a raw `pushfq` snapshot can be decoded and re-encoded
/// without losing bits.
#[bitfield(u64, order = Lsb)]
#[derive(PartialEq, Eq)]
pub struct Rflags {
    /// Carry Flag
    pub cf_carry: bool, // 0

    /// Always 1 in 64-bit mode.
    #[bits(default = true)]
    pub always1: bool, // 1

    /// Parity Flag
    pub pf_parity: bool, // 2

    #[bits(1)]
    __: u8, // 3

    /// Adjust Flag
    pub af_adjust: bool, // 4

    #[bits(1)]
    __: u8, // 5

    /// Zero Flag
    pub zf_zero: bool, // 6

    /// Sign Flag
    pub sf_sign: bool, // 7

    /// Trap Flag
    pub tf_trap: bool, // 8

    /// Interrupt Enable Flag. Cleared by `cli`, set by `sti`.
    pub if_interrupt_enable: bool, // 9

    /// Direction Flag
    pub df_direction: bool, // 10

    /// Overflow Flag
    pub of_overflow: bool, // 11

    /// I/O Privilege Level
    #[bits(2)]
    pub iopl: u8, // 12–13

    /// Nested Task
    pub nt_nested: bool, // 14

    #[bits(1)]
    __: u8, // 15

    /// Resume Flag
    pub rf_resume: bool, // 16

    /// Virtual 8086 mode, always 0 in 64-bit mode.
    pub vm_virtual_8086: bool, // 17

    /// Alignment Check
    pub ac_alignment_check: bool, // 18

    /// Virtual Interrupt Flag
    pub vif_virtual_interrupt: bool, // 19

    /// Virtual Interrupt Pending
    pub vip_virtual_interrupt_pending: bool, // 20

    /// ID Flag: allows toggling CPUID.
    pub id_cpuid: bool, // 21

    #[bits(42)]
    __: u64, // 22–63
}

#[cfg(all(feature = "asm", target_arch = "x86_64"))]
impl crate::LoadRegister for Rflags {
    #[inline]
    fn load() -> Self {
        let r: u64;
        // SAFETY: reading RFLAGS through the stack is legal at any privilege level.
        unsafe {
            core::arch::asm!("pushfq; pop {}", out(reg) r, options(nomem, preserves_flags));
        }
        Self::from_bits(r)
    }
}
