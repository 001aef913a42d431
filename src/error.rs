//! Unified fault & error types for the aoframe runtime.
//!
//! Follows the two-tier failure model of the framework: almost every
//! invariant violation is *fatal* and funnels through [`Fault`] to the
//! board's [`on_assert`](crate::bsp::Bsp::on_assert) hook, which never
//! returns. A small set of operations are recoverable at the API
//! boundary and return [`Result<T>`] instead.

use core::fmt;

/// Every fatal invariant violation the framework can detect.
///
/// All variants are `Copy` so a fault can be captured and handed to the
/// assertion path without allocation, even from inside a critical
/// section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `post` called with `margin == 0` and no free slot.
    QueueOverflow,
    /// A pool's free list underflowed (more frees than blocks exist).
    PoolUnderflow,
    /// `new_event` called on a pool with no free blocks left.
    PoolExhausted,
    /// A block was returned to a pool it was not allocated from.
    ForeignBlockFree,
    /// An event's reference count underflowed past zero.
    RefCountUnderflow,
    /// A state handler returned `Tran` while servicing `ENTRY` or `EXIT`.
    TranFromEntryExit,
    /// The exit/entry path depth exceeded the compile-time maximum.
    HierarchyDepthOverflow,
    /// `arm()` called on a time event that is already linked.
    TimerDoubleArm,
    /// `post`/`publish` invoked from an ISR above the kernel-aware threshold.
    IsrPriorityViolation,
    /// Event pools were registered out of non-decreasing block-size order.
    PoolOrderViolation,
    /// `sched::lock` nested deeper than the fixed ceiling stack allows.
    LockNestingOverflow,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueOverflow => write!(f, "queue overflow at margin 0"),
            Self::PoolUnderflow => write!(f, "event pool underflow"),
            Self::PoolExhausted => write!(f, "event pool exhausted, no free blocks"),
            Self::ForeignBlockFree => write!(f, "block freed to the wrong pool"),
            Self::RefCountUnderflow => write!(f, "event ref-count underflow"),
            Self::TranFromEntryExit => write!(f, "TRAN returned from ENTRY/EXIT action"),
            Self::HierarchyDepthOverflow => write!(f, "state hierarchy depth overflow"),
            Self::TimerDoubleArm => write!(f, "time event armed while already linked"),
            Self::IsrPriorityViolation => write!(f, "framework call from an unaware ISR"),
            Self::PoolOrderViolation => write!(f, "event pools registered out of size order"),
            Self::LockNestingOverflow => write!(f, "sched::lock nested past the ceiling stack depth"),
        }
    }
}

/// Errors surfaced at the handful of recoverable API boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameworkError {
    /// No event pool has a block large enough for the request.
    NoFittingPool,
    /// Active-object priority is out of range, zero, or already registered.
    InvalidPriority,
    /// `pool_init` was called after the pool table was sealed by `init`.
    PoolsSealed,
    /// The static-event table ([`crate::config::MAX_STATIC_EVENTS`]) is full.
    StaticTableFull,
    /// The time-event wheel ([`crate::config::MAX_TIME_EVENTS`]) is full.
    TimeWheelFull,
    /// The subscriber table ([`crate::config::MAX_SUBSCRIBED_SIGNALS`]) is full.
    SubscriberTableFull,
}

impl fmt::Display for FrameworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFittingPool => write!(f, "no event pool fits the requested block size"),
            Self::InvalidPriority => write!(f, "invalid or already-registered priority"),
            Self::PoolsSealed => write!(f, "pool table already sealed"),
            Self::StaticTableFull => write!(f, "static event table is full"),
            Self::TimeWheelFull => write!(f, "time-event wheel has no free slot"),
            Self::SubscriberTableFull => write!(f, "subscriber table has no free slot for a new signal"),
        }
    }
}

/// Framework-wide `Result` alias for the recoverable-at-API-boundary paths.
pub type Result<T> = core::result::Result<T, FrameworkError>;

/// Raises a fatal [`Fault`] at the call site, tagged with the calling
/// module and line (spec §7). Never returns.
#[macro_export]
macro_rules! fault {
    ($f:expr) => {
        $crate::assert_fault(module_path!(), line!(), $f)
    };
}
