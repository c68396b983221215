//! # Interrupt-masking spin mutex
//!
//! A spin lock that is only ever taken with interrupts masked through the
//! [`InterruptControl`] it owns. Acquisition masks first and then spins;
//! release drops the lock word first and then restores the saved interrupt
//! state. An interrupt handler can therefore never find the lock held by the
//! code it interrupted on the same core.

use crate::irq::{InterruptControl, IrqGuard};
use core::cell::UnsafeCell;
use core::hint::spin_loop;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

pub struct IrqSpinMutex<T, C: InterruptControl> {
    held: AtomicBool,
    irq: C,
    value: UnsafeCell<T>,
}

// SAFETY: `value` is only reachable through a guard, and a guard only exists
// while `held` is set by exactly one owner.
unsafe impl<T: Send, C: InterruptControl + Sync> Sync for IrqSpinMutex<T, C> {}

impl<T, C: InterruptControl> IrqSpinMutex<T, C> {
    pub const fn new(value: T, irq: C) -> Self {
        Self {
            held: AtomicBool::new(false),
            irq,
            value: UnsafeCell::new(value),
        }
    }

    /// Mask interrupts, then spin until the lock is ours.
    pub fn lock(&self) -> IrqSpinGuard<'_, T, C> {
        let irq = IrqGuard::enter(&self.irq);
        while !self.try_acquire() {
            while self.held.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
        IrqSpinGuard { mutex: self, _irq: irq }
    }

    /// Like [`lock`](Self::lock), but gives up instead of spinning. The
    /// interrupt state is back to what it was when this returns `None`.
    pub fn try_lock(&self) -> Option<IrqSpinGuard<'_, T, C>> {
        let irq = IrqGuard::enter(&self.irq);
        if self.try_acquire() {
            Some(IrqSpinGuard { mutex: self, _irq: irq })
        } else {
            None
        }
    }

    #[inline]
    pub const fn interrupt_control(&self) -> &C {
        &self.irq
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    #[inline]
    fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

/// Access to an [`IrqSpinMutex`]'s value, with interrupts masked.
pub struct IrqSpinGuard<'a, T, C: InterruptControl> {
    mutex: &'a IrqSpinMutex<T, C>,
    // Dropped after `Drop::drop` released the lock word.
    _irq: IrqGuard<'a, C>,
}

impl<T, C: InterruptControl> Deref for IrqSpinGuard<'_, T, C> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard owns the lock.
        unsafe { &*self.mutex.value.get() }
    }
}

impl<T, C: InterruptControl> DerefMut for IrqSpinGuard<'_, T, C> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard owns the lock, and `&mut self` makes this unique.
        unsafe { &mut *self.mutex.value.get() }
    }
}

impl<T, C: InterruptControl> Drop for IrqSpinGuard<'_, T, C> {
    fn drop(&mut self) {
        self.mutex.held.store(false, Ordering::Release);
    }
}
