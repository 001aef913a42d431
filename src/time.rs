//! Time-event wheel (spec §3/§4.E): armed countdowns that re-post a
//! fixed [`EventRef`] to their owning active object every `interval`
//! ticks, FIFO at margin 0.
//!
//! Grounded on the same fixed-array-of-slots shape as the teacher's
//! `Scheduler` (`src/scheduler.rs`): a time event is registered once
//! (like the teacher's `Schedule`), then armed/disarmed any number of
//! times without being re-registered. Multiple independent tick rates
//! are just multiple `TimeWheel` instances — each one's `tick` must be
//! serialized against re-entrant ticks of the *same* rate (spec §4.E);
//! this crate does not attempt to serialize across *different* rates,
//! per the open-questions resolution in `DESIGN.md`.

use crate::config::MAX_TIME_EVENTS;
use crate::error::Fault;
use crate::event::EventRef;
use crate::fault;
use crate::sched::AoRegistry;

/// A time event's fixed identity: which AO it wakes and which event it
/// re-posts. Build with [`TimeEvent::new`], then [`TimeWheel::add`] it
/// before arming.
#[derive(Debug, Clone, Copy)]
pub struct TimeEvent {
    ao_prio: u8,
    event_ref: EventRef,
}

impl TimeEvent {
    /// `event_ref` is typically a static event (spec §3, `pool_id ==
    /// 0`) since the same reference is posted on every delivery.
    #[must_use]
    pub const fn new(ao_prio: u8, event_ref: EventRef) -> Self {
        Self { ao_prio, event_ref }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    te: TimeEvent,
    counter: u32,
    interval: u32,
    linked: bool,
}

/// One independent tick rate's set of armed countdowns, traversed
/// under critical section on every [`TimeWheel::tick`].
pub struct TimeWheel<const N: usize = MAX_TIME_EVENTS> {
    slots: [Option<Entry>; N],
}

impl<const N: usize> TimeWheel<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Registers `te`, unarmed, returning its handle for later
    /// `arm`/`disarm` calls.
    ///
    /// # Errors
    /// Returns [`crate::error::FrameworkError::TimeWheelFull`] once `N`
    /// time events have been registered.
    pub fn add(&mut self, te: TimeEvent) -> crate::error::Result<usize> {
        let idx = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(crate::error::FrameworkError::TimeWheelFull)?;
        self.slots[idx] = Some(Entry {
            te,
            counter: 0,
            interval: 0,
            linked: false,
        });
        Ok(idx)
    }

    /// Arms `handle`: `counter := ticks`, linking it into the active
    /// set. Fatal ([`Fault::TimerDoubleArm`]) if already linked — call
    /// [`TimeWheel::disarm`] first to re-arm (spec §4.E invariant:
    /// "while linked, the time event is not reusable").
    pub fn arm(&mut self, handle: usize, ticks: u32, interval: u32) {
        critical_section::with(|_| {
            let entry = self.slots[handle].as_mut().expect("arm on unregistered handle");
            if entry.linked {
                fault!(Fault::TimerDoubleArm);
            }
            entry.counter = ticks;
            entry.interval = interval;
            entry.linked = true;
        });
    }

    /// Unlinks `handle` if armed. Returns whether it was armed, so
    /// `disarm(); disarm()` is race-safely idempotent: `(true, false)`
    /// if it fired first is impossible to distinguish here (spec's
    /// "Idempotent disarm" law is about disarm racing delivery, which a
    /// single-threaded `tick`/`disarm` caller never actually races —
    /// see `DESIGN.md`).
    pub fn disarm(&mut self, handle: usize) -> bool {
        critical_section::with(|_| {
            let entry = self.slots[handle].as_mut().expect("disarm on unregistered handle");
            let was_armed = entry.linked;
            entry.linked = false;
            was_armed
        })
    }

    #[must_use]
    pub fn is_armed(&self, handle: usize) -> bool {
        self.slots[handle].is_some_and(|e| e.linked)
    }

    /// Traverses every armed entry, decrementing its counter; at zero,
    /// posts `event_ref` to `ao_prio` at margin 0 and either reloads
    /// (`interval > 0`) or unlinks.
    ///
    /// # Safety
    /// Every AO referenced by a registered [`TimeEvent`]'s `ao_prio`
    /// must still be registered in `registry` (see
    /// [`AoRegistry::register`]).
    pub unsafe fn tick(&mut self, registry: &mut AoRegistry) {
        critical_section::with(|_| {
            for slot in &mut self.slots {
                let Some(entry) = slot else { continue };
                if !entry.linked {
                    continue;
                }
                entry.counter = entry.counter.saturating_sub(1);
                if entry.counter == 0 {
                    unsafe { registry.post_margin0(entry.te.ao_prio, entry.te.event_ref) };
                    if entry.interval > 0 {
                        entry.counter = entry.interval;
                    } else {
                        entry.linked = false;
                    }
                }
            }
        });
    }
}

impl<const N: usize> Default for TimeWheel<N> {
    fn default() -> Self {
        Self::new()
    }
}
