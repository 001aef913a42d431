//! Event queues (spec §3/§4.B): the ring buffer + "front slot" each
//! active object uses to receive posted events.
//!
//! Every operation runs inside a single bounded `critical_section` so it
//! is safe to call from task context or from a kernel-aware ISR (spec
//! §5). The queue never decides scheduling itself — `post`/`get` report
//! whether the AO's readiness changed, and the caller ([`crate::ao`])
//! folds that into the ready set.

use crate::error::Fault;
use crate::event::EventRef;
use crate::fault;

/// Outcome of a `post`/`post_lifo` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostOutcome {
    /// Accepted. `became_ready` is true iff the queue was empty before
    /// this post (the AO transitions from suspended to ready).
    Accepted { became_ready: bool },
    /// Rejected: fewer than `margin` slots would remain free.
    Rejected,
}

/// Fixed-capacity FIFO/LIFO event queue with a front-slot fast path.
/// `N` is the ring's capacity; including the front slot, the queue
/// holds up to `N + 1` events.
pub struct EventQueue<const N: usize> {
    front: Option<EventRef>,
    ring: [Option<EventRef>; N],
    head: usize,
    tail: usize,
    n_free: usize,
    n_min: usize,
}

impl<const N: usize> EventQueue<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            front: None,
            ring: [None; N],
            head: 0,
            tail: 0,
            n_free: N,
            n_min: N,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.front.is_none()
    }

    #[must_use]
    pub const fn n_free(&self) -> usize {
        self.n_free
    }

    #[must_use]
    pub const fn low_watermark(&self) -> usize {
        self.n_min
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// FIFO post. `margin == 0` means "must succeed or fatal" (spec
    /// §4.B): if the ring has no room left at all, that is
    /// [`Fault::QueueOverflow`] regardless of the `margin` argument,
    /// since there is no slot left to reject into.
    pub fn post(&mut self, e: EventRef, margin: usize) -> PostOutcome {
        critical_section::with(|_cs| {
            if self.front.is_none() {
                self.front = Some(e);
                return PostOutcome::Accepted { became_ready: true };
            }
            if self.n_free <= margin {
                if margin == 0 {
                    fault!(Fault::QueueOverflow);
                }
                return PostOutcome::Rejected;
            }
            self.ring[self.head] = Some(e);
            self.head = (self.head + 1) % N;
            self.n_free -= 1;
            self.n_min = self.n_min.min(self.n_free);
            PostOutcome::Accepted { became_ready: false }
        })
    }

    /// LIFO post: `e` becomes the very next event dequeued, pushing the
    /// previous front (if any) back into the ring. Never accepts a
    /// margin; overflow is always fatal.
    pub fn post_lifo(&mut self, e: EventRef) -> PostOutcome {
        critical_section::with(|_cs| {
            let Some(old_front) = self.front.replace(e) else {
                return PostOutcome::Accepted { became_ready: true };
            };
            if self.n_free == 0 {
                fault!(Fault::QueueOverflow);
            }
            // Push the bumped front onto the *tail* side so it remains
            // the next event after `e` rather than the last.
            self.tail = (self.tail + N - 1) % N;
            self.ring[self.tail] = Some(old_front);
            self.n_free -= 1;
            self.n_min = self.n_min.min(self.n_free);
            PostOutcome::Accepted { became_ready: false }
        })
    }

    /// Dequeues the front event. Returns `(event, now_empty)` where
    /// `now_empty` tells the caller whether the AO transitions to
    /// suspended.
    pub fn get(&mut self) -> Option<(EventRef, bool)> {
        critical_section::with(|_cs| {
            let e = self.front.take()?;
            if self.n_free < N {
                let refilled = self.ring[self.tail].take();
                self.tail = (self.tail + 1) % N;
                self.n_free += 1;
                self.front = refilled;
            }
            Some((e, self.front.is_none()))
        })
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
