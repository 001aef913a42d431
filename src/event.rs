//! Events (spec §3/§4.A): the only unit of communication between active
//! objects, timers and publishers. Every event is `Copy` and lives in a
//! fixed-size block somewhere in a [`crate::pool`] — never on the heap —
//! so the whole event model can be statically allocated.

use core::fmt;

/// Number of bytes in [`EventPayload::Bytes`]. Chosen to match the
/// largest pool block class in the default [`crate::config::FrameworkConfig`];
/// applications with larger payloads should carry an index into their
/// own static table instead of inlining more bytes here.
pub const MAX_INLINE_BYTES: usize = 24;

/// Event signal. Values `0..4` are reserved for the pseudo-signals the
/// HSM engine dispatches internally; application signals start at
/// [`Signal::USER_START`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signal(pub u16);

impl Signal {
    /// Hierarchy probe: dispatched to discover a state's `Super` parent.
    pub const EMPTY: Signal = Signal(0);
    /// Entry action pseudo-signal.
    pub const ENTRY: Signal = Signal(1);
    /// Exit action pseudo-signal.
    pub const EXIT: Signal = Signal(2);
    /// Initial-transition pseudo-signal.
    pub const INIT: Signal = Signal(3);
    /// First signal value available to application code.
    pub const USER_START: u16 = 4;

    /// Builds a user signal, panicking in debug builds if it collides
    /// with a reserved pseudo-signal.
    #[must_use]
    pub const fn user(value: u16) -> Self {
        debug_assert!(value >= Self::USER_START, "signal value collides with a reserved pseudo-signal");
        Signal(value)
    }

    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::USER_START
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::EMPTY => write!(f, "EMPTY"),
            Self::ENTRY => write!(f, "ENTRY"),
            Self::EXIT => write!(f, "EXIT"),
            Self::INIT => write!(f, "INIT"),
            Signal(v) => write!(f, "SIG({v})"),
        }
    }
}

/// Event payload. A small tagged union covering the common cases so
/// every event stays `Copy` and fits in a fixed pool block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPayload {
    Empty,
    U32(u32),
    I32(i32),
    Bytes { len: u8, data: [u8; MAX_INLINE_BYTES] },
}

impl EventPayload {
    #[must_use]
    pub fn bytes(data: &[u8]) -> Self {
        let len = data.len().min(MAX_INLINE_BYTES);
        let mut buf = [0u8; MAX_INLINE_BYTES];
        buf[..len].copy_from_slice(&data[..len]);
        Self::Bytes { len: len as u8, data: buf }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes { len, data } => Some(&data[..*len as usize]),
            _ => None,
        }
    }
}

/// A handle to a block-allocated event. Never a raw pointer: `pool_id
/// == 0` marks an immutable static (spec §3), in which case `slot` is
/// unused; otherwise `(pool_id, slot)` addresses a block in
/// `pool_id`'s registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRef {
    pub pool_id: u8,
    pub slot: u16,
}

impl EventRef {
    pub const STATIC_POOL_ID: u8 = 0;

    #[must_use]
    pub const fn is_static(self) -> bool {
        self.pool_id == Self::STATIC_POOL_ID
    }
}

/// The event itself, as stored in a pool block.
///
/// `ref_count` is owned entirely by the pool that allocated it — no
/// other module mutates it directly, matching the "only legal lifetime
/// operations" rule of §4.A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub signal: Signal,
    pub payload: EventPayload,
}

impl Event {
    #[must_use]
    pub const fn new(signal: Signal, payload: EventPayload) -> Self {
        Self { signal, payload }
    }

    #[must_use]
    pub const fn empty(signal: Signal) -> Self {
        Self::new(signal, EventPayload::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_signals_are_distinct() {
        let reserved = [Signal::EMPTY, Signal::ENTRY, Signal::EXIT, Signal::INIT];
        for (i, a) in reserved.iter().enumerate() {
            for (j, b) in reserved.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
            assert!(a.is_reserved());
        }
    }

    #[test]
    fn user_signal_is_not_reserved() {
        assert!(!Signal::user(10).is_reserved());
    }

    #[test]
    fn bytes_payload_round_trips() {
        let p = EventPayload::bytes(&[1, 2, 3]);
        assert_eq!(p.as_bytes(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn bytes_payload_truncates_oversized_input() {
        let data = [7u8; MAX_INLINE_BYTES + 5];
        let p = EventPayload::bytes(&data);
        assert_eq!(p.as_bytes().unwrap().len(), MAX_INLINE_BYTES);
    }
}
