//! Fixed-block event pools (spec §3/§4.A).
//!
//! Every dynamic [`Event`] lives in a block owned by exactly one
//! [`EventPool`]; pools are registered with [`PoolRegistry::add`] in
//! strictly non-decreasing `block_size` order and never grow or shrink
//! after [`crate::init`] seals the table. `new_event`/`increment_ref`/
//! `garbage_collect` are the only legal lifetime operations, matching
//! `src/error.rs`'s `Fault` vocabulary for the two ways a pool can be
//! misused: `PoolExhausted` (allocate with nothing free) and
//! `PoolUnderflow` (free more than was ever allocated).
//!
//! `pool_id == 0` is reserved for immutable static events, resolved
//! through this same registry's small `statics` table rather than any
//! `EventPool` — their `ref_count` is ignored entirely (spec §3), which
//! is why a time event can re-post the same `EventRef` on every tick
//! without ever touching a pool.

use crate::config::MAX_POOL_BLOCKS;
use crate::error::Fault;
use crate::event::{Event, EventPayload, EventRef, Signal};
use crate::fault;

#[derive(Clone, Copy)]
struct Slot {
    event: Event,
    ref_count: u8,
    in_use: bool,
}

impl Slot {
    const EMPTY: Slot = Slot {
        event: Event::empty(Signal::EMPTY),
        ref_count: 0,
        in_use: false,
    };
}

/// One fixed-block allocator. `capacity` is the number of blocks
/// actually in service; slots beyond it are unused padding so every
/// pool can share this one concrete type (spec: pools are statically
/// allocated, never resized).
pub struct EventPool {
    block_size: usize,
    capacity: usize,
    slots: [Slot; MAX_POOL_BLOCKS],
    free: heapless::Vec<u16, MAX_POOL_BLOCKS>,
    min_free: usize,
}

impl EventPool {
    /// Builds a pool with `capacity` blocks of `block_size` bytes, all
    /// initially free. `capacity` must be `<= MAX_POOL_BLOCKS`.
    #[must_use]
    pub fn new(block_size: usize, capacity: usize) -> Self {
        debug_assert!(capacity <= MAX_POOL_BLOCKS);
        let mut free = heapless::Vec::new();
        for i in (0..capacity as u16).rev() {
            let _ = free.push(i);
        }
        Self {
            block_size,
            capacity,
            slots: [Slot::EMPTY; MAX_POOL_BLOCKS],
            free,
            min_free: capacity,
        }
    }

    #[must_use]
    pub const fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    /// Minimum observed free-count over the pool's lifetime.
    #[must_use]
    pub const fn low_watermark(&self) -> usize {
        self.min_free
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocates a block, returning the slot index with `ref_count ==
    /// 0` (the caller must post it or call [`EventPool::garbage_collect`]).
    /// Fatal ([`Fault::PoolExhausted`]) if no block is free.
    pub fn alloc(&mut self, signal: Signal, payload: EventPayload) -> u16 {
        let Some(idx) = self.free.pop() else {
            fault!(Fault::PoolExhausted);
        };
        let slot = &mut self.slots[idx as usize];
        debug_assert!(!slot.in_use, "allocated a block already in use");
        slot.event = Event::new(signal, payload);
        slot.ref_count = 0;
        slot.in_use = true;
        if self.free.len() < self.min_free {
            self.min_free = self.free.len();
        }
        idx
    }

    #[must_use]
    pub fn get(&self, slot: u16) -> Event {
        debug_assert!(self.slots[slot as usize].in_use);
        self.slots[slot as usize].event
    }

    pub fn increment_ref(&mut self, slot: u16) {
        let s = &mut self.slots[slot as usize];
        debug_assert!(s.in_use, "increment_ref on a block not allocated");
        s.ref_count += 1;
    }

    /// Decrements the reference count, returning the block to the free
    /// list once it reaches zero. Fatal ([`Fault::PoolUnderflow`]) if
    /// the count was already zero or the slot was not allocated.
    pub fn garbage_collect(&mut self, slot: u16) {
        let s = &mut self.slots[slot as usize];
        if !s.in_use || s.ref_count == 0 {
            fault!(Fault::PoolUnderflow);
        }
        s.ref_count -= 1;
        if s.ref_count == 0 {
            s.in_use = false;
            let _ = self.free.push(slot);
        }
    }
}

/// Registry of every pool a deployment configured, ordered smallest
/// block first (enforced at registration time), plus the table of
/// immutable static events addressed by `pool_id == 0` (spec §3:
/// "Events with `pool_id == 0` are immutable statics").
#[derive(Default)]
pub struct PoolRegistry {
    pools: heapless::Vec<EventPool, crate::config::MAX_POOLS>,
    statics: heapless::Vec<Event, crate::config::MAX_STATIC_EVENTS>,
    sealed: bool,
}

impl PoolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: heapless::Vec::new(),
            statics: heapless::Vec::new(),
            sealed: false,
        }
    }

    /// Registers an immutable static event, returning an [`EventRef`]
    /// with `pool_id == 0`. `increment_ref`/`garbage_collect` are no-ops
    /// on the result — its `ref_count` is ignored, per spec §3 — so it
    /// can be posted to any number of queues and never needs freeing.
    /// Typically used once, during setup, for a time event's re-posted
    /// signal.
    ///
    /// # Errors
    /// Returns [`crate::error::FrameworkError::StaticTableFull`] once
    /// [`crate::config::MAX_STATIC_EVENTS`] have been registered.
    pub fn new_static(&mut self, signal: Signal, payload: EventPayload) -> crate::error::Result<EventRef> {
        let slot = self.statics.len() as u16;
        self.statics
            .push(Event::new(signal, payload))
            .map_err(|_| crate::error::FrameworkError::StaticTableFull)?;
        Ok(EventRef {
            pool_id: EventRef::STATIC_POOL_ID,
            slot,
        })
    }

    /// Registers a pool. Must be called before [`PoolRegistry::seal`],
    /// in non-decreasing `block_size` order (spec §3/§6's
    /// `pool_init` contract).
    ///
    /// # Errors
    /// Returns [`crate::error::FrameworkError::PoolsSealed`] after
    /// sealing.
    pub fn add(&mut self, block_size: usize, capacity: usize) -> crate::error::Result<u8> {
        if self.sealed {
            return Err(crate::error::FrameworkError::PoolsSealed);
        }
        if let Some(last) = self.pools.last() {
            if block_size < last.block_size() {
                fault!(Fault::PoolOrderViolation);
            }
        }
        let pool_id = (self.pools.len() + 1) as u8; // 0 is reserved for statics
        self.pools
            .push(EventPool::new(block_size, capacity))
            .unwrap_or_else(|_| fault!(Fault::PoolOrderViolation));
        Ok(pool_id)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    fn pool_mut(&mut self, pool_id: u8) -> &mut EventPool {
        debug_assert!(pool_id > 0, "pool_id 0 is reserved for immutable statics");
        &mut self.pools[pool_id as usize - 1]
    }

    fn pool(&self, pool_id: u8) -> &EventPool {
        debug_assert!(pool_id > 0, "pool_id 0 is reserved for immutable statics");
        &self.pools[pool_id as usize - 1]
    }

    /// Picks the smallest registered pool whose block size fits
    /// `requested_size`, then allocates from it.
    ///
    /// # Errors
    /// Returns [`crate::error::FrameworkError::NoFittingPool`] if no
    /// pool's block size is large enough.
    pub fn new_event(
        &mut self,
        signal: Signal,
        payload: EventPayload,
        requested_size: usize,
    ) -> crate::error::Result<EventRef> {
        let pool_id = self
            .pools
            .iter()
            .position(|p| p.block_size() >= requested_size)
            .map(|i| (i + 1) as u8)
            .ok_or(crate::error::FrameworkError::NoFittingPool)?;
        let slot = self.pool_mut(pool_id).alloc(signal, payload);
        Ok(EventRef { pool_id, slot })
    }

    #[must_use]
    pub fn event(&self, r: EventRef) -> Event {
        if r.is_static() {
            self.statics[r.slot as usize]
        } else {
            self.pool(r.pool_id).get(r.slot)
        }
    }

    pub fn increment_ref(&mut self, r: EventRef) {
        if r.is_static() {
            return;
        }
        self.pool_mut(r.pool_id).increment_ref(r.slot);
    }

    pub fn garbage_collect(&mut self, r: EventRef) {
        if r.is_static() {
            return;
        }
        self.pool_mut(r.pool_id).garbage_collect(r.slot);
    }
}
