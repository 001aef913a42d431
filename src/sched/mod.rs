//! Scheduling (spec §4.G/§4.H): the ready set, the priority-indexed
//! active-object registry, and the schedule lock/unlock ceiling shared
//! by both [`qk`] (preemptive) and [`qv`] (cooperative) variants.

pub mod qk;
pub mod qv;

use crate::ao::Dispatchable;
use crate::config::MAX_PRIORITY;
use crate::error::{Fault, FrameworkError};
use crate::fault;
use core::cell::Cell;
use core::ptr::NonNull;
use critical_section::Mutex;

const SLOTS: usize = MAX_PRIORITY as usize + 1;

/// Bitset over priorities `1..=MAX_PRIORITY` with an event pending.
/// `O(1)` highest-ready lookup via `leading_zeros`, the software
/// equivalent of a hardware `clz` (spec §3 "Ready Set").
static READY: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Current schedule-lock ceiling: no priority at or below this value
/// may run (spec §4.G "Schedule lock / unlock").
static CEILING: Mutex<Cell<u8>> = Mutex::new(Cell::new(0));

/// Stack of ceilings saved across nested `lock`/`unlock` pairs.
static CEILING_STACK: Mutex<Cell<[u8; 8]>> = Mutex::new(Cell::new([0; 8]));
static CEILING_DEPTH: Mutex<Cell<usize>> = Mutex::new(Cell::new(0));

pub fn mark_ready(prio: u8) {
    critical_section::with(|cs| {
        let r = READY.borrow(cs);
        r.set(r.get() | (1u32 << prio));
    });
}

pub fn mark_idle(prio: u8) {
    critical_section::with(|cs| {
        let r = READY.borrow(cs);
        r.set(r.get() & !(1u32 << prio));
    });
}

fn mask_upto(ceiling: u8) -> u32 {
    if ceiling >= 31 {
        u32::MAX
    } else {
        (1u32 << (ceiling + 1)) - 1
    }
}

/// Highest ready priority strictly above the current schedule-lock
/// ceiling, or `None` if nothing eligible is ready.
#[must_use]
pub fn highest_ready() -> Option<u8> {
    critical_section::with(|cs| {
        let ceiling = CEILING.borrow(cs).get();
        let bits = READY.borrow(cs).get() & !mask_upto(ceiling);
        if bits == 0 {
            None
        } else {
            Some(31 - bits.leading_zeros() as u8)
        }
    })
}

/// Raises the schedule-lock ceiling to `prio`, returning the prior
/// ceiling (push it onto the lock stack; restore on [`unlock`]). Tasks
/// at or below `prio` cannot preempt until the matching `unlock`.
pub fn lock(prio: u8) -> u8 {
    critical_section::with(|cs| {
        let prior = CEILING.borrow(cs).replace(prio);
        let depth = CEILING_DEPTH.borrow(cs).get();
        let mut stack = CEILING_STACK.borrow(cs).get();
        if depth >= stack.len() {
            fault!(Fault::LockNestingOverflow);
        }
        stack[depth] = prior;
        CEILING_STACK.borrow(cs).set(stack);
        CEILING_DEPTH.borrow(cs).set(depth + 1);
        prior
    })
}

/// Restores the ceiling saved by the matching [`lock`] call.
pub fn unlock() {
    critical_section::with(|cs| {
        let depth = CEILING_DEPTH.borrow(cs).get();
        debug_assert!(depth > 0, "unlock without matching lock");
        let stack = CEILING_STACK.borrow(cs).get();
        let prior = stack[depth - 1];
        CEILING_DEPTH.borrow(cs).set(depth - 1);
        CEILING.borrow(cs).set(prior);
    });
}

/// Priority-indexed table of every registered active object (spec §3
/// "dense priority-indexed table"). Populated once during `init`,
/// immutable in structure thereafter — only the AOs' own internal
/// state mutates, under critical section, as design note 9 requires.
pub struct AoRegistry {
    slots: [Option<NonNull<dyn Dispatchable>>; SLOTS],
}

impl AoRegistry {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: [None; SLOTS] }
    }

    /// Registers `ao` at its own priority.
    ///
    /// # Safety
    /// `ao` must outlive every subsequent scheduling pass; in practice
    /// this means it is a `'static` active object (a `static mut` in
    /// application code, or leaked from a pinned allocation on host
    /// builds).
    ///
    /// # Errors
    /// [`FrameworkError::InvalidPriority`] if out of range or already
    /// occupied.
    pub unsafe fn register(&mut self, ao: &mut dyn Dispatchable) -> Result<(), FrameworkError> {
        let prio = ao.priority();
        if prio == 0 || prio as usize >= SLOTS || self.slots[prio as usize].is_some() {
            return Err(FrameworkError::InvalidPriority);
        }
        self.slots[prio as usize] = Some(NonNull::from(ao));
        Ok(())
    }

    /// # Safety
    /// The pointer stored at `prio` must still be valid (see
    /// [`AoRegistry::register`]).
    pub unsafe fn dispatch_one(&mut self, prio: u8, pools: &mut crate::pool::PoolRegistry) {
        if let Some(mut ptr) = self.slots[prio as usize] {
            ptr.as_mut().run_to_completion(pools);
        }
    }

    /// Delivers `e` to the AO registered at `prio` at margin 0, used by
    /// the time wheel and publish/subscribe — neither of which knows
    /// the concrete context type of the AO they're posting to.
    ///
    /// # Safety
    /// Same requirement as [`AoRegistry::dispatch_one`].
    pub unsafe fn post_margin0(&mut self, prio: u8, e: crate::event::EventRef) {
        if let Some(mut ptr) = self.slots[prio as usize] {
            ptr.as_mut().post_margin0(e);
        }
    }
}

impl Default for AoRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// READY/CEILING/CEILING_DEPTH are process-global, so any test touching
// them (here or in sched::qk/sched::qv) must serialize against the
// others; `qk`/`qv` reuse `reset` rather than keep their own copy.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    pub fn reset() -> std::sync::MutexGuard<'static, ()> {
        let guard = TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        critical_section::with(|cs| {
            READY.borrow(cs).set(0);
            CEILING.borrow(cs).set(0);
            CEILING_DEPTH.borrow(cs).set(0);
        });
        guard
    }
}
