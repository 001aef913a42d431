//! Active objects (spec §3/§4.D): a task wrapping one [`Hsm`], one
//! private [`EventQueue`] and a fixed priority.
//!
//! The framework drives every active object through the object-safe
//! [`Dispatchable`] face so the scheduler ([`crate::sched`]) never
//! needs to know an AO's concrete context type `T`.

use crate::config::MAX_PRIORITY;
use crate::equeue::{EventQueue, PostOutcome};
use crate::event::EventRef;
use crate::hsm::{Hsm, StateHandler};
use crate::pool::PoolRegistry;
use crate::sched;

/// Object-safe face the scheduler dispatches through.
pub trait Dispatchable {
    fn priority(&self) -> u8;
    fn has_ready_event(&self) -> bool;
    /// Dequeues and dispatches exactly one event: one run-to-completion
    /// step. No-op if the queue is empty.
    fn run_to_completion(&mut self, pools: &mut PoolRegistry);
    /// FIFO-posts `e` at margin 0 (fatal on overflow). The delivery path
    /// for time events and publish/subscribe, neither of which can see
    /// this AO's concrete context type (spec §4.E/§4.F).
    fn post_margin0(&mut self, e: EventRef);
}

/// An active object: HSM instance `Hsm<T>` + private queue of capacity
/// `N` + fixed priority `1..=MAX_PRIORITY`.
pub struct ActiveObject<T, const N: usize> {
    hsm: Hsm<T>,
    queue: EventQueue<N>,
    prio: u8,
    ctx: T,
}

impl<T, const N: usize> ActiveObject<T, N> {
    /// Builds an un-started active object. `prio` must be in
    /// `1..=MAX_PRIORITY` and unique among registered AOs (checked at
    /// [`crate::sched::AoRegistry::register`] time).
    #[must_use]
    pub fn new(prio: u8, ctx: T, top: StateHandler<T>) -> Self {
        debug_assert!(prio > 0 && prio <= MAX_PRIORITY, "priority out of range");
        Self {
            hsm: Hsm::new(top),
            queue: EventQueue::new(),
            prio,
            ctx,
        }
    }

    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.prio
    }

    #[must_use]
    pub fn context(&self) -> &T {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut T {
        &mut self.ctx
    }

    /// Runs the topmost initial transition. Must be called once, before
    /// the scheduler starts (spec §4.D `start`).
    pub fn start(&mut self) {
        self.hsm.start(&mut self.ctx);
    }

    /// Queue-only half of `post`: no pool interaction. Used directly by
    /// [`Dispatchable::post_margin0`], whose callers ([`crate::time`],
    /// [`crate::pubsub`]) already manage the event's reference count
    /// themselves before handing it off.
    fn post_queue(&mut self, e: EventRef, margin: usize) -> bool {
        match self.queue.post(e, margin) {
            PostOutcome::Accepted { became_ready: true } => {
                sched::mark_ready(self.prio);
                true
            }
            PostOutcome::Accepted { became_ready: false } => true,
            PostOutcome::Rejected => false,
        }
    }

    /// FIFO post with margin (spec §4.D `post`). Returns `false` if
    /// rejected at `margin > 0`; `margin == 0` is fatal on overflow. On
    /// success, increments `e`'s reference count (spec §4.A/§4.D) —
    /// `run_to_completion` decrements it unconditionally after dispatch.
    pub fn post(&mut self, e: EventRef, margin: usize, pools: &mut PoolRegistry) -> bool {
        let accepted = self.post_queue(e, margin);
        if accepted {
            pools.increment_ref(e);
        }
        accepted
    }

    /// LIFO post (spec §4.D `post_lifo`). Always succeeds (overflow is
    /// fatal, never rejected), so the increment always runs.
    pub fn post_lifo(&mut self, e: EventRef, pools: &mut PoolRegistry) {
        if let PostOutcome::Accepted { became_ready: true } = self.queue.post_lifo(e) {
            sched::mark_ready(self.prio);
        }
        pools.increment_ref(e);
    }

    /// Moves `e` into a caller-owned deferred queue (spec §4.D
    /// `defer`). Net reference count is unchanged: both queues just
    /// hold `EventRef` handles, neither touches the pool.
    pub fn defer<const D: usize>(&self, deferred: &mut EventQueue<D>, e: EventRef) -> bool {
        defer(deferred, e)
    }

    /// Moves the oldest deferred event back onto this AO's own queue,
    /// LIFO, so it dispatches next (spec §4.D `recall`).
    pub fn recall<const D: usize>(&mut self, deferred: &mut EventQueue<D>) -> bool {
        recall(&mut self.queue, deferred)
    }
}

impl<T, const N: usize> Dispatchable for ActiveObject<T, N> {
    fn priority(&self) -> u8 {
        self.prio
    }

    fn has_ready_event(&self) -> bool {
        !self.queue.is_empty()
    }

    fn run_to_completion(&mut self, pools: &mut PoolRegistry) {
        let Some((eref, now_empty)) = self.queue.get() else {
            return;
        };
        if now_empty {
            sched::mark_idle(self.prio);
        }
        let event = pools.event(eref);
        self.hsm.dispatch(&mut self.ctx, &event);
        pools.garbage_collect(eref);
    }

    fn post_margin0(&mut self, e: EventRef) {
        let _ = self.post_queue(e, 0);
    }
}

/// Free-function form of defer, usable without an [`ActiveObject`]
/// handle (e.g. from inside a dispatch where only `&mut self` of the
/// context is available).
pub fn defer<const D: usize>(deferred: &mut EventQueue<D>, e: EventRef) -> bool {
    !matches!(deferred.post(e, 0), PostOutcome::Rejected)
}

/// Free-function form of recall.
pub fn recall<const N: usize, const D: usize>(queue: &mut EventQueue<N>, deferred: &mut EventQueue<D>) -> bool {
    match deferred.get() {
        Some((e, _)) => {
            queue.post_lifo(e);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, Signal};
    use crate::hsm::Outcome;

    fn top(_ctx: &mut u32, e: &Event) -> Outcome<u32> {
        match e.signal {
            Signal::INIT => Outcome::Handled,
            Signal::EMPTY => Outcome::Ignored,
            _ => Outcome::Handled,
        }
    }

    #[test]
    fn defer_then_recall_round_trip() {
        let mut incoming: EventQueue<4> = EventQueue::new();
        let mut deferred: EventQueue<4> = EventQueue::new();
        let e = EventRef { pool_id: 1, slot: 7 };

        assert!(defer(&mut deferred, e));
        assert!(incoming.get().is_none());
        assert!(recall(&mut incoming, &mut deferred));
        assert_eq!(incoming.get().unwrap().0, e);
    }

    #[test]
    fn recall_on_empty_deferred_queue_is_false() {
        let mut incoming: EventQueue<4> = EventQueue::new();
        let mut deferred: EventQueue<4> = EventQueue::new();
        assert!(!recall(&mut incoming, &mut deferred));
    }

    #[test]
    fn ao_priority_is_fixed() {
        let ao: ActiveObject<u32, 4> = ActiveObject::new(5, 0, top);
        assert_eq!(ao.priority(), 5);
    }
}
