//! QK: the preemptive, run-to-completion kernel (spec §4.H "QK
//! kernel"). Every active object still runs to completion on one
//! shared stack, but a higher-priority object that becomes ready while
//! a lower one is running preempts it at the next RTC step boundary —
//! there is no separate per-AO stack and no blocking inside a handler.
//!
//! On `cortex-m`, priority escalation is driven by retriggering PendSV
//! from [`on_event_posted`]; `activate` below is the trampoline PendSV
//! jumps to, looping `dispatch_one` until nothing at or above the
//! priority that was running when it fired remains ready. Host builds
//! (`feature = "std"`) call [`activate`] directly — there is no
//! interrupt controller to simulate.

use crate::pool::PoolRegistry;
use crate::sched::{self, AoRegistry};

/// Runs active objects at priorities strictly above `floor`, highest
/// first, until none remain ready. This is QK's "activator": the loop
/// that both the initial `run` call and every PendSV re-entry share.
///
/// # Safety
/// Same requirement as [`AoRegistry::dispatch_one`].
unsafe fn activate(registry: &mut AoRegistry, pools: &mut PoolRegistry, floor: u8) {
    sched::lock(floor);
    loop {
        match sched::highest_ready() {
            Some(p) if p > floor => registry.dispatch_one(p, pools),
            _ => break,
        }
    }
    sched::unlock();
}

/// Starts the QK kernel: runs every ready object, then idles. Never
/// returns.
///
/// # Safety
/// Every active object registered in `registry` must still be valid.
pub unsafe fn run(registry: &mut AoRegistry, pools: &mut PoolRegistry, bsp: &mut dyn crate::bsp::Bsp) -> ! {
    loop {
        activate(registry, pools, 0);
        bsp.on_idle();
    }
}

/// Call from the posting path (or an ISR's bottom half) right after a
/// `post`/`publish` marks some priority ready. On `cortex-m` this
/// pends the exception that runs [`on_pend_sv`]; on host builds it
/// just runs the activator inline, since there is no real asynchronous
/// preemption to model.
///
/// # Safety
/// Same requirement as [`AoRegistry::dispatch_one`].
#[cfg(not(feature = "cortex-m"))]
pub unsafe fn on_event_posted(registry: &mut AoRegistry, pools: &mut PoolRegistry) {
    activate(registry, pools, 0);
}

/// On `cortex-m` builds, posting only pends the exception; the actual
/// activator runs from [`on_pend_sv`] once the CPU takes it, exactly
/// like QK's `QK_ISR_EXIT` macro.
#[cfg(feature = "cortex-m")]
pub fn on_event_posted() {
    cortex_m::peripheral::SCB::set_pendsv();
    // Erratum 838869 (Cortex-M4/M4F r0p0/r0p1): a DSB is required after
    // setting PENDSVSET so the pend takes effect before the next
    // instruction can observe stale interrupt state.
    cortex_m::asm::dsb();
}

/// PendSV handler body. The `cortex-m-rt` `#[exception] fn PendSV()`
/// in application code should call this with the registry/pool
/// pointers it set up at `init` time.
///
/// # Safety
/// Must only be called from the real PendSV exception context, with a
/// still-valid `registry`/`pools`.
#[cfg(feature = "cortex-m")]
pub unsafe fn on_pend_sv(registry: &mut AoRegistry, pools: &mut PoolRegistry) {
    activate(registry, pools, 0);
}
