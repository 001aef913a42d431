//! Property tests for the "Laws" in spec §8: FIFO, LIFO, idempotent
//! disarm, and the defer/recall round-trip. Each law is checked against
//! arbitrary generated sequences with `proptest`, the same property
//! testing crate carried from the teacher's `[dev-dependencies]`.

use aoframe::ao::{defer, recall};
use aoframe::equeue::EventQueue;
use aoframe::event::EventRef;
use aoframe::time::{TimeEvent, TimeWheel};
use proptest::prelude::*;

fn arb_event_ref() -> impl Strategy<Value = EventRef> {
    (1u8..=4, 0u16..200).prop_map(|(pool_id, slot)| EventRef { pool_id, slot })
}

proptest! {
    /// "FIFO: given posts e1,e2,...,en from a single producer with no
    /// intervening LIFO, get yields them in order."
    #[test]
    fn fifo_law(refs in prop::collection::vec(arb_event_ref(), 0..16)) {
        let mut q: EventQueue<16> = EventQueue::new();
        for &e in &refs {
            q.post(e, 0);
        }
        for &expected in &refs {
            prop_assert_eq!(q.get().map(|(e, _)| e), Some(expected));
        }
        prop_assert!(q.get().is_none());
    }

    /// "LIFO: post_lifo(e) then get returns e irrespective of prior
    /// queued events."
    #[test]
    fn lifo_law(
        prior in prop::collection::vec(arb_event_ref(), 0..8),
        lifo_event in arb_event_ref(),
    ) {
        let mut q: EventQueue<16> = EventQueue::new();
        for &e in &prior {
            q.post(e, 0);
        }
        q.post_lifo(lifo_event);
        prop_assert_eq!(q.get().map(|(e, _)| e), Some(lifo_event));
    }

    /// "Defer/recall round-trip: defer(q,e); recall(q) makes e the next
    /// dispatched event" — regardless of what else is already queued.
    #[test]
    fn defer_recall_round_trip(
        queued in prop::collection::vec(arb_event_ref(), 0..8),
        deferred_event in arb_event_ref(),
    ) {
        let mut incoming: EventQueue<16> = EventQueue::new();
        let mut deferred: EventQueue<4> = EventQueue::new();
        for &e in &queued {
            incoming.post(e, 0);
        }

        prop_assert!(defer(&mut deferred, deferred_event));
        prop_assert!(recall(&mut incoming, &mut deferred));
        prop_assert_eq!(incoming.get().map(|(e, _)| e), Some(deferred_event));
    }

    /// "Idempotent disarm: disarm() twice returns (true, false) if the
    /// timer was armed, or (false, false) if not."
    #[test]
    fn idempotent_disarm_law(was_armed in any::<bool>(), ticks in 1u32..50) {
        let mut wheel: TimeWheel<4> = TimeWheel::new();
        let handle = wheel
            .add(TimeEvent::new(1, EventRef { pool_id: 0, slot: 0 }))
            .unwrap();
        if was_armed {
            wheel.arm(handle, ticks, 0);
        }

        let first = wheel.disarm(handle);
        let second = wheel.disarm(handle);
        prop_assert_eq!(first, was_armed);
        prop_assert_eq!(second, false);
    }
}
