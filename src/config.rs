//! Framework configuration.
//!
//! Sizing knobs a deployment must pick before calling [`crate::init`]:
//! the number of active-object priorities, the event-pool layout, queue
//! capacities and tick-wheel rates. Mirrors the teacher firmware's
//! `SystemConfig` — a plain struct with a `Default` impl, `serde`-derived
//! so a board can persist tuning knobs across reboots even though this
//! crate ships no storage adapter of its own.

use serde::{Deserialize, Serialize};

/// Maximum number of distinct active-object priorities the ready set can
/// address. Priority `0` is reserved for idle, so AOs occupy `1..=31`.
pub const MAX_PRIORITY: u8 = 31;

/// Maximum nesting depth of the state hierarchy any single HSM may use.
/// Bounds the fixed-size stacks the LCA search walks (spec §4.C).
pub const MAX_STATE_DEPTH: usize = 8;

/// Maximum number of composite states any single HSM may track history
/// for (spec §4.C "History").
pub const MAX_HISTORY: usize = 4;

/// Maximum number of event pools a deployment may register.
pub const MAX_POOLS: usize = 4;

/// Maximum number of blocks any single pool may hold. Bounds the fixed
/// storage behind [`crate::pool::EventPool`] so every registered pool
/// can share one concrete type regardless of its configured
/// `block_count`.
pub const MAX_POOL_BLOCKS: usize = 32;

/// Maximum number of independent tick rates the time-event wheel supports.
pub const MAX_TICK_RATES: usize = 2;

/// Maximum number of armed time events any single tick-rate's wheel may
/// track (spec §4.E).
pub const MAX_TIME_EVENTS: usize = 16;

/// Maximum number of immutable static events ([`crate::event::EventRef::STATIC_POOL_ID`])
/// a deployment may register.
pub const MAX_STATIC_EVENTS: usize = 16;

/// Maximum number of distinct signals the publish/subscribe table can
/// track subscribers for (spec §4.F).
pub const MAX_SUBSCRIBED_SIGNALS: usize = 16;

/// Descriptor for one registered event pool.
///
/// Pools are registered via [`crate::pool::PoolRegistry::add`] in
/// strictly non-decreasing `block_size` order (spec §3); allocation then
/// picks the smallest pool whose block size is `>=` the request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Size in bytes of each block in this pool.
    pub block_size: usize,
    /// Number of blocks the pool holds.
    pub block_count: usize,
}

/// Top-level framework configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkConfig {
    /// Highest active-object priority in use (`1..=MAX_PRIORITY`).
    pub max_active_priority: u8,
    /// Event-pool layout, smallest block size first.
    pub pools: heapless::Vec<PoolConfig, MAX_POOLS>,
    /// Per-AO default queue capacity (number of ring slots, excluding the
    /// front slot).
    pub default_queue_capacity: usize,
    /// Trace channel ring-buffer size in bytes.
    pub trace_ring_size: usize,
    /// Kernel-aware ISR priority threshold (spec §5, "ISR rules").
    /// ISRs numerically at or below this value may call framework
    /// services; ISRs above it must not.
    pub kernel_aware_isr_threshold: u8,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        let mut pools = heapless::Vec::new();
        // Three pool classes, smallest block size first — required order.
        let _ = pools.push(PoolConfig {
            block_size: 16,
            block_count: 16,
        });
        let _ = pools.push(PoolConfig {
            block_size: 32,
            block_count: 16,
        });
        let _ = pools.push(PoolConfig {
            block_size: 64,
            block_count: 8,
        });
        Self {
            max_active_priority: MAX_PRIORITY,
            pools,
            default_queue_capacity: 16,
            trace_ring_size: 1024,
            kernel_aware_isr_threshold: 8,
        }
    }
}
