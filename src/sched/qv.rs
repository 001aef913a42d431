//! QV: the cooperative, single-stack scheduler (spec §4.H "QV kernel").
//!
//! Every active object runs to completion on the same stack; there is
//! no preemption. The run loop repeatedly dispatches the
//! highest-priority ready object and falls back to
//! [`Bsp::on_idle`](crate::bsp::Bsp::on_idle) once nothing is ready,
//! exactly like QV's main superloop.

use crate::bsp::Bsp;
use crate::pool::PoolRegistry;
use crate::sched::{self, AoRegistry};

/// Runs the QV superloop forever. Never returns.
///
/// # Safety
/// Every active object registered in `registry` must still be valid;
/// see [`AoRegistry::register`].
pub unsafe fn run(registry: &mut AoRegistry, pools: &mut PoolRegistry, bsp: &mut dyn Bsp) -> ! {
    loop {
        match sched::highest_ready() {
            Some(prio) => registry.dispatch_one(prio, pools),
            None => bsp.on_idle(),
        }
    }
}

/// Runs a single scheduling step: dispatches the highest-ready object
/// if any, otherwise calls `on_idle` once. Returns whether work was
/// done, for host tests and demos that need a bounded loop instead of
/// [`run`]'s `!`.
///
/// # Safety
/// Same requirement as [`run`].
pub unsafe fn step(registry: &mut AoRegistry, pools: &mut PoolRegistry, bsp: &mut dyn Bsp) -> bool {
    match sched::highest_ready() {
        Some(prio) => {
            registry.dispatch_one(prio, pools);
            true
        }
        None => {
            bsp.on_idle();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ao::ActiveObject;
    use crate::event::{Event, EventPayload, Signal};
    use crate::hsm::Outcome;

    fn top(_ctx: &mut u32, e: &Event) -> Outcome<u32> {
        match e.signal {
            Signal::ENTRY | Signal::EXIT => Outcome::Handled,
            Signal::INIT => Outcome::Tran(leaf),
            Signal::EMPTY => Outcome::Ignored,
            _ => Outcome::Handled,
        }
    }

    fn leaf(ctx: &mut u32, e: &Event) -> Outcome<u32> {
        match e.signal {
            Signal::ENTRY | Signal::EXIT | Signal::INIT => Outcome::Handled,
            Signal::EMPTY => Outcome::Super(top),
            _ => {
                *ctx += 1;
                Outcome::Handled
            }
        }
    }

    struct IdleCounter {
        idles: u32,
    }

    impl Bsp for IdleCounter {
        fn on_idle(&mut self) {
            self.idles += 1;
        }

        fn on_assert(&mut self, module: &'static str, line: u32) -> ! {
            panic!("on_assert({module}, {line})");
        }
    }

    #[test]
    fn step_dispatches_ready_then_idles() {
        let _guard = sched::test_support::reset();
        let mut ao: ActiveObject<u32, 4> = ActiveObject::new(1, 0, top);
        ao.start();
        let mut pools = PoolRegistry::new();
        pools.add(16, 2).unwrap();
        let mut registry = AoRegistry::new();
        unsafe { registry.register(&mut ao).unwrap() };

        let r = pools
            .new_event(Signal::user(5), EventPayload::Empty, 4)
            .unwrap();
        assert!(ao.post(r, 1, &mut pools));

        let mut bsp = IdleCounter { idles: 0 };
        let did_work = unsafe { step(&mut registry, &mut pools, &mut bsp) };
        assert!(did_work);
        assert_eq!(*ao.context(), 1);
        assert_eq!(bsp.idles, 0);

        let idled = unsafe { !step(&mut registry, &mut pools, &mut bsp) };
        assert!(idled);
        assert_eq!(bsp.idles, 1);
    }
}
