use kernel_sync::{InterruptControl, IrqGuard, IrqSpinMutex, IrqState};
use std::panic;
use std::cell::Cell;

/// Software model of a single core's interrupt-enable flag.
struct FakeCpu {
    enabled: Cell<bool>,
    entered: Cell<usize>,
    left: Cell<usize>,
}

impl FakeCpu {
    fn new(enabled: bool) -> Self {
        Self {
            enabled: Cell::new(enabled),
            entered: Cell::new(0),
            left: Cell::new(0),
        }
    }
}

impl InterruptControl for FakeCpu {
    fn save_and_disable(&self) -> IrqState {
        self.entered.set(self.entered.get() + 1);
        IrqState::new(self.enabled.replace(false))
    }

    fn restore(&self, state: IrqState) {
        self.left.set(self.left.get() + 1);
        self.enabled.set(state.were_enabled());
    }
}

#[test]
fn guard_masks_and_restores() {
    let cpu = FakeCpu::new(true);
    {
        let g = IrqGuard::enter(&cpu);
        assert!(g.saved_state().were_enabled());
        assert!(!cpu.enabled.get());
    }
    assert!(cpu.enabled.get());
    assert_eq!((cpu.entered.get(), cpu.left.get()), (1, 1));
}

#[test]
fn nested_guards_restore_the_outer_state() {
    let cpu = FakeCpu::new(true);
    {
        let _outer = IrqGuard::enter(&cpu);
        {
            let inner = IrqGuard::enter(&cpu);
            assert!(!inner.saved_state().were_enabled());
        }
        // inner exit must not re-enable interrupts
        assert!(!cpu.enabled.get());
    }
    assert!(cpu.enabled.get());
}

#[test]
fn guard_keeps_interrupts_disabled_if_they_were() {
    let cpu = FakeCpu::new(false);
    {
        let _g = IrqGuard::enter(&cpu);
    }
    assert!(!cpu.enabled.get());
}

#[test]
fn early_return_still_restores() {
    fn work(cpu: &FakeCpu, bail: bool) -> Option<u32> {
        let _g = IrqGuard::enter(cpu);
        if bail {
            return None;
        }
        Some(1)
    }

    let cpu = FakeCpu::new(true);
    assert_eq!(work(&cpu, true), None);
    assert!(cpu.enabled.get());
    assert_eq!(work(&cpu, false), Some(1));
    assert_eq!((cpu.entered.get(), cpu.left.get()), (2, 2));
}

#[test]
fn mutex_masks_for_the_guard_lifetime() {
    let m = IrqSpinMutex::new(0u32, FakeCpu::new(true));
    {
        let mut g = m.lock();
        *g += 1;
        assert!(!m.interrupt_control().enabled.get());
    }
    let cpu = m.interrupt_control();
    assert!(cpu.enabled.get());
    assert_eq!((cpu.entered.get(), cpu.left.get()), (1, 1));
    assert_eq!(m.into_inner(), 1);
}

#[test]
fn failed_try_lock_restores_interrupts() {
    let m = IrqSpinMutex::new((), FakeCpu::new(true));
    let held = m.lock();
    assert!(m.try_lock().is_none());
    // still masked by the outstanding guard
    assert!(!m.interrupt_control().enabled.get());
    drop(held);

    let cpu = m.interrupt_control();
    assert!(cpu.enabled.get());
    assert_eq!((cpu.entered.get(), cpu.left.get()), (2, 2));
}

#[test]
fn panicking_section_restores_interrupts() {
    let m = IrqSpinMutex::new(0u32, FakeCpu::new(true));
    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let _g = m.lock();
        panic!("boom");
    }));
    assert!(res.is_err());
    assert!(m.interrupt_control().enabled.get());
    assert!(m.try_lock().is_some());
}
