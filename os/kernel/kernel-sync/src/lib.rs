//! # Kernel synchronization primitives
//!
//! * [`irq`]: interrupt masking behind the [`InterruptControl`] capability.
//! * [`IrqSpinMutex`]: a spin lock that is held only with interrupts masked.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod irq;
mod mutex;

#[cfg(target_arch = "x86_64")]
pub use irq::CpuInterrupts;
pub use irq::{InterruptControl, IrqGuard, IrqState, NoInterrupts};
pub use mutex::{IrqSpinGuard, IrqSpinMutex};
