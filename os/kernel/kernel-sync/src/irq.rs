//! # Interrupt masking
//!
//! The critical section the frame allocator runs under. On a single core the
//! only source of re-entrancy is an interrupt handler calling back into the
//! allocator, so masking interrupt delivery for the duration of a mutation
//! is enough to serialize it. This does **not** exclude other cores.
//!
//! The hardware side is abstracted behind [`InterruptControl`]. The kernel
//! uses [`CpuInterrupts`] (`pushfq`/`cli`/`sti`); host builds and tests use
//! [`NoInterrupts`] or their own mock.

/// Interrupt-enable state captured when a critical section was entered.
///
/// Handing it back to [`InterruptControl::restore`] reinstates exactly that
/// state, so nested critical sections compose.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use = "dropping the saved state leaves interrupts masked"]
pub struct IrqState {
    were_enabled: bool,
}

impl IrqState {
    #[inline]
    pub const fn new(were_enabled: bool) -> Self {
        Self { were_enabled }
    }

    #[inline]
    #[must_use]
    pub const fn were_enabled(self) -> bool {
        self.were_enabled
    }
}

/// Platform capability to mask and unmask interrupt delivery on the current core.
pub trait InterruptControl {
    /// Disables interrupt delivery and returns the state that was in effect before.
    fn save_and_disable(&self) -> IrqState;

    /// Reinstates a state previously returned by [`save_and_disable`](Self::save_and_disable).
    fn restore(&self, state: IrqState);
}

impl<C: InterruptControl + ?Sized> InterruptControl for &C {
    #[inline]
    fn save_and_disable(&self) -> IrqState {
        (**self).save_and_disable()
    }

    #[inline]
    fn restore(&self, state: IrqState) {
        (**self).restore(state);
    }
}

/// RAII guard that masks interrupts on creation and restores them on drop.
///
/// The restore runs on every exit path, early returns and unwinding included.
///
/// # Examples
///
/// ```
/// use kernel_sync::irq::{IrqGuard, NoInterrupts};
///
/// let ctl = NoInterrupts;
/// {
///     let _g = IrqGuard::enter(&ctl);
///     // critical section
/// }
/// // prior interrupt state restored here
/// ```
pub struct IrqGuard<'c, C: InterruptControl + ?Sized> {
    ctl: &'c C,
    state: IrqState,
}

impl<'c, C: InterruptControl + ?Sized> IrqGuard<'c, C> {
    #[inline]
    #[must_use]
    pub fn enter(ctl: &'c C) -> Self {
        let state = ctl.save_and_disable();
        Self { ctl, state }
    }

    /// The state that will be restored on drop.
    #[inline]
    pub const fn saved_state(&self) -> IrqState {
        self.state
    }
}

impl<C: InterruptControl + ?Sized> Drop for IrqGuard<'_, C> {
    fn drop(&mut self) {
        self.ctl.restore(self.state);
    }
}

/// No-op [`InterruptControl`] for host builds and tests, where there are no
/// interrupts to mask. Always reports interrupts as previously disabled.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoInterrupts;

impl InterruptControl for NoInterrupts {
    #[inline]
    fn save_and_disable(&self) -> IrqState {
        IrqState::new(false)
    }

    #[inline]
    fn restore(&self, _state: IrqState) {}
}

/// [`InterruptControl`] for the executing x86-64 core.
///
/// # Safety & Privilege
///
/// Uses `cli`/`sti` and therefore must only be used in contexts where these
/// are legal (CPL0). Executing it from user space faults.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Default, Copy, Clone)]
pub struct CpuInterrupts;

#[cfg(target_arch = "x86_64")]
impl InterruptControl for CpuInterrupts {
    #[inline]
    fn save_and_disable(&self) -> IrqState {
        use kernel_registers::{LoadRegister, Rflags};

        let enabled = Rflags::load().if_interrupt_enable();
        if enabled {
            cli_stop_interrupts();
        }
        IrqState::new(enabled)
    }

    #[inline]
    fn restore(&self, state: IrqState) {
        if state.were_enabled() {
            sti_enable_interrupts();
        }
    }
}

/// Disables hardware interrupts (`cli`).
///
/// Must only be called in contexts where `cli` is permitted.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn cli_stop_interrupts() {
    unsafe { core::arch::asm!("cli", options(nomem, nostack, preserves_flags)) }
}

/// Enables hardware interrupts (`sti`).
///
/// Must only be called in contexts where `sti` is permitted.
#[cfg(target_arch = "x86_64")]
#[inline]
pub fn sti_enable_interrupts() {
    unsafe { core::arch::asm!("sti", options(nomem, nostack, preserves_flags)) }
}
