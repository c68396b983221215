use kernel_sync::{IrqSpinMutex, NoInterrupts};
use std::panic;

#[test]
fn basic_lock_and_raii() {
    let m = IrqSpinMutex::new(0_u32, NoInterrupts);

    {
        let mut g = m.lock();
        *g = 41;
    }

    // lock again; previous drop must have unlocked
    {
        let mut g = m.lock();
        *g += 1;
        assert_eq!(*g, 42);
    }
    assert_eq!(m.into_inner(), 42);
}

#[test]
fn try_lock_fails_while_held() {
    let m = IrqSpinMutex::new(vec![1, 2], NoInterrupts);

    let mut g1 = m.try_lock().expect("uncontended");
    g1.push(3);
    assert!(m.try_lock().is_none());

    drop(g1);
    assert_eq!(m.try_lock().as_deref(), Some(&vec![1, 2, 3]));
}

#[test]
fn contended_increments_are_exact() {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let threads = 4;
    let iters = 2_000;

    let m = Arc::new(IrqSpinMutex::new(0usize, NoInterrupts));
    let start = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let m = Arc::clone(&m);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                for _ in 0..iters {
                    *m.lock() += 1;
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(*m.lock(), threads * iters);
}

#[test]
fn lock_is_released_on_panic() {
    let m = IrqSpinMutex::new(0u32, NoInterrupts);

    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        let mut g = m.lock();
        *g = 123;
        panic!("boom");
    }));
    assert!(res.is_err(), "expected panic");

    assert_eq!(*m.lock(), 123);
}
