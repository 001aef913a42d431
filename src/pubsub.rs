//! Publish/Subscribe (spec §4.F): a signal fans out to every active
//! object subscribed to it, highest priority first, the event's
//! reference count incremented once per delivery.
//!
//! The per-signal subscriber set is the same priority bitset idiom as
//! [`crate::sched`]'s ready set — `u32`, `leading_zeros` for the
//! highest bit — just keyed by signal instead of global.

use crate::config::MAX_SUBSCRIBED_SIGNALS;
use crate::error::{FrameworkError, Result};
use crate::event::{EventRef, Signal};
use crate::pool::PoolRegistry;
use crate::sched::AoRegistry;

fn highest_bit(bits: u32) -> Option<u8> {
    if bits == 0 {
        None
    } else {
        Some(31 - bits.leading_zeros() as u8)
    }
}

struct Entry {
    signal: Signal,
    subscribers: u32,
}

/// Table of `signal -> subscriber priority bitset`.
pub struct SubscriberTable<const N: usize = MAX_SUBSCRIBED_SIGNALS> {
    entries: heapless::Vec<Entry, N>,
}

impl<const N: usize> SubscriberTable<N> {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: heapless::Vec::new() }
    }

    fn find_mut(&mut self, signal: Signal) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.signal == signal)
    }

    /// Sets `prio`'s bit for `signal`, creating the signal's entry if
    /// this is its first subscriber.
    ///
    /// # Errors
    /// Returns [`FrameworkError::SubscriberTableFull`] if `signal` is
    /// new and the table already tracks `N` distinct signals.
    pub fn subscribe(&mut self, prio: u8, signal: Signal) -> Result<()> {
        if let Some(entry) = self.find_mut(signal) {
            entry.subscribers |= 1u32 << prio;
            return Ok(());
        }
        self.entries
            .push(Entry { signal, subscribers: 1u32 << prio })
            .map_err(|_| FrameworkError::SubscriberTableFull)
    }

    /// Clears `prio`'s bit for `signal`. A no-op if nobody ever
    /// subscribed `prio` to `signal`.
    pub fn unsubscribe(&mut self, prio: u8, signal: Signal) {
        if let Some(entry) = self.find_mut(signal) {
            entry.subscribers &= !(1u32 << prio);
        }
    }

    #[must_use]
    pub fn is_subscribed(&self, prio: u8, signal: Signal) -> bool {
        self.entries
            .iter()
            .find(|e| e.signal == signal)
            .is_some_and(|e| e.subscribers & (1u32 << prio) != 0)
    }

    /// Delivers `event_ref` to every subscriber of `signal`, highest
    /// priority first: increments its reference count once per
    /// delivery, then FIFO-posts at margin 0 (spec §4.F). A no-op if
    /// nobody is subscribed.
    ///
    /// # Safety
    /// Every subscribed priority must currently be registered in
    /// `registry` (see [`AoRegistry::register`]).
    pub unsafe fn publish(
        &mut self,
        signal: Signal,
        event_ref: EventRef,
        registry: &mut AoRegistry,
        pools: &mut PoolRegistry,
    ) {
        let Some(entry) = self.find_mut(signal) else {
            return;
        };
        let mut remaining = entry.subscribers;
        while let Some(prio) = highest_bit(remaining) {
            pools.increment_ref(event_ref);
            unsafe { registry.post_margin0(prio, event_ref) };
            remaining &= !(1u32 << prio);
        }
    }
}

impl<const N: usize> Default for SubscriberTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
