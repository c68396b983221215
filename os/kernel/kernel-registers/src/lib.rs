//! # Typed `X86_64` Registers

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "rflags")]
mod rflags;

#[cfg(feature = "rflags")]
pub use rflags::Rflags;

pub trait LoadRegister {
    /// Reads the current value of the register.
    ///
    /// It is generally safe to load this register even from user mode.
    fn load() -> Self;
}
