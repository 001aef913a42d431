//! aoframe: a real-time active-object framework.
//!
//! Applications describe behavior as UML-style hierarchical state
//! machines; the framework dispatches events to them, schedules them by
//! fixed priority (preemptive under [`sched::qk`] or cooperative under
//! [`sched::qv`]), manages event lifetimes by reference counting, and
//! provides time-triggered events, publish/subscribe and event
//! deferral. Board-specific concerns (clock init, LED/button drivers,
//! the trace channel's transport) are supplied by the application
//! through the [`Bsp`] trait — see `src/bin/demo.rs` for a host-side
//! wiring example.
//!
//! Builds `no_std` by default; enable `std` (the crate default, for
//! host tests and the demo binary) or `cortex-m` (bare-metal target)
//! per deployment.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unused_must_use)]

pub mod ao;
pub mod bsp;
pub mod config;
pub mod equeue;
pub mod error;
pub mod event;
pub mod hsm;
pub mod pool;
pub mod pubsub;
pub mod sched;
pub mod time;
pub mod trace;

pub use bsp::Bsp;
pub use config::FrameworkConfig;
pub use error::{Fault, FrameworkError, Result};
pub use event::{Event, EventPayload, EventRef, Signal};

use core::cell::Cell;
use core::ptr::NonNull;
use critical_section::Mutex;

/// The single registered board. Framework code funnels every fatal
/// condition through this pointer to `Bsp::on_assert`; see design note
/// 9 ("global mutable state... immutable in structure after `run()`").
static BSP: Mutex<Cell<Option<NonNull<dyn Bsp>>>> = Mutex::new(Cell::new(None));

/// Registers the board implementation used for the lifetime of the
/// program.
///
/// # Safety
/// `bsp` must outlive every subsequent call into the framework (every
/// dispatch, every `assert_fault`), and no other registration may be
/// active concurrently — the framework assumes the single-core model
/// of spec §5.
pub unsafe fn register_bsp(bsp: &mut dyn Bsp) {
    let ptr = NonNull::from(bsp);
    critical_section::with(|cs| BSP.borrow(cs).set(Some(ptr)));
}

/// Clears the registered board. Only meaningful for test teardown; a
/// real target never calls this.
///
/// # Safety
/// Must not be called while any framework code could still observe the
/// previously registered pointer (e.g. from another priority's ISR).
pub unsafe fn clear_bsp() {
    critical_section::with(|cs| BSP.borrow(cs).set(None));
}

/// Raises a fatal fault: logs it, then calls the registered board's
/// `on_assert`, which never returns. Application code should reach
/// this through the [`crate::fault!`] macro, which fills in
/// `module_path!()`/`line!()` automatically.
///
/// Panics if called before a board has been registered — that is
/// itself a framework-misuse bug, not a runtime fault the spec models.
pub fn assert_fault(module: &'static str, line: u32, fault: Fault) -> ! {
    log::error!("assert_fault[{module}:{line}]: {fault}");
    critical_section::with(|cs| match BSP.borrow(cs).get() {
        Some(mut ptr) => unsafe { ptr.as_mut().on_assert(module, line) },
        None => panic!("assert_fault before a Bsp was registered: {module}:{line}: {fault}"),
    })
}

/// Wires components A–I together and registers the board. Must be
/// called exactly once, before [`run`].
pub fn init(bsp: &mut dyn Bsp, config: &FrameworkConfig) -> pool::PoolRegistry {
    // Safety: single-threaded init, called once before the scheduler
    // starts per spec §3 "Lifecycles".
    unsafe { register_bsp(bsp) };
    let mut pools = pool::PoolRegistry::new();
    for p in &config.pools {
        pools
            .add(p.block_size, p.block_count)
            .unwrap_or_else(|_| fault!(Fault::PoolOrderViolation));
    }
    pools.seal();
    bsp.on_startup();
    pools
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::bsp::test_support::RecordingBsp;
    use std::sync::Mutex;

    // The BSP singleton is process-global; serialize tests that touch
    // it rather than let them race on different threads.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    /// Registers a panicking [`RecordingBsp`] for the duration of `f`,
    /// serialized against other tests doing the same.
    pub fn with_test_bsp<R>(f: impl FnOnce() -> R) -> R {
        let guard = TEST_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut bsp = RecordingBsp::default();
        // Safety: `bsp` outlives the call to `f` below; cleared before
        // it goes out of scope.
        unsafe { super::register_bsp(&mut bsp) };
        let result = f();
        unsafe { super::clear_bsp() };
        drop(guard);
        result
    }
}
