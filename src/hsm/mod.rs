//! The hierarchical state machine engine (spec §4.C): dispatch,
//! transition execution with least-common-ancestor exit/entry paths,
//! initial pseudotransitions and history pseudostates.
//!
//! A state is a plain function `fn(&mut T, &Event) -> Outcome<T>` — no
//! vtable, no allocation. The engine discovers the parent chain lazily
//! by dispatching the reserved [`Signal::EMPTY`] probe and reading back
//! `Outcome::Super`, rather than keeping a separate static parent
//! table in sync with the handler code (see module docs in
//! `SPEC_FULL.md` §4.C). The top state's handler must answer `EMPTY`
//! with `Outcome::Ignored` — it is its own sentinel.

use crate::config::{MAX_HISTORY, MAX_STATE_DEPTH};
use crate::error::Fault;
use crate::event::{Event, Signal};
use crate::fault;

/// A state's dispatch function.
pub type StateHandler<T> = fn(&mut T, &Event) -> Outcome<T>;

/// What a state handler reports back to the engine.
///
/// Entry/exit/init pseudo-signals reuse this same type: a handler's
/// default arm returns `Super(parent)` regardless of which signal hit
/// it, exactly as real-world HSM switch statements are written — it
/// simply means "no action for this signal here", not "forward it
/// further". The engine never re-bubbles `ENTRY`/`EXIT` past the state
/// it targeted.
pub enum Outcome<T> {
    Handled,
    Ignored,
    Tran(StateHandler<T>),
    Super(StateHandler<T>),
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Outcome<T> {}

impl<T> PartialEq for Outcome<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Handled, Outcome::Handled) | (Outcome::Ignored, Outcome::Ignored) => true,
            (Outcome::Tran(a), Outcome::Tran(b)) | (Outcome::Super(a), Outcome::Super(b)) => {
                *a as usize == *b as usize
            }
            _ => false,
        }
    }
}
impl<T> Eq for Outcome<T> {}

impl<T> core::fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Outcome::Handled => write!(f, "Handled"),
            Outcome::Ignored => write!(f, "Ignored"),
            Outcome::Tran(_) => write!(f, "Tran(..)"),
            Outcome::Super(_) => write!(f, "Super(..)"),
        }
    }
}

type Chain<T> = heapless::Vec<StateHandler<T>, MAX_STATE_DEPTH>;

fn handler_eq<T>(a: StateHandler<T>, b: StateHandler<T>) -> bool {
    a as usize == b as usize
}

/// One active object's state machine instance: just the current leaf
/// state plus whatever history composite states have recorded.
pub struct Hsm<T> {
    current: StateHandler<T>,
    history_enabled: heapless::Vec<StateHandler<T>, MAX_HISTORY>,
    history: heapless::Vec<(StateHandler<T>, StateHandler<T>), MAX_HISTORY>,
}

impl<T> Hsm<T> {
    /// Builds an un-started instance rooted at `top`. Call [`Hsm::start`]
    /// before dispatching any real event.
    #[must_use]
    pub fn new(top: StateHandler<T>) -> Self {
        Self {
            current: top,
            history_enabled: heapless::Vec::new(),
            history: heapless::Vec::new(),
        }
    }

    #[must_use]
    pub fn current_state(&self) -> StateHandler<T> {
        self.current
    }

    /// Marks `composite` as a history-recording state: a transition
    /// later targeting `composite` directly re-enters whichever
    /// substate was active when it was last exited, instead of running
    /// `composite`'s plain initial transition.
    pub fn enable_history(&mut self, composite: StateHandler<T>) {
        if self.history_enabled.iter().any(|s| handler_eq(*s, composite)) {
            return;
        }
        let _ = self.history_enabled.push(composite);
    }

    fn is_history_enabled(&self, s: StateHandler<T>) -> bool {
        self.history_enabled.iter().any(|h| handler_eq(*h, s))
    }

    fn history_of(&self, composite: StateHandler<T>) -> Option<StateHandler<T>> {
        self.history
            .iter()
            .find(|(c, _)| handler_eq(*c, composite))
            .map(|(_, sub)| *sub)
    }

    fn record_history(&mut self, composite: StateHandler<T>, substate: StateHandler<T>) {
        if let Some(entry) = self.history.iter_mut().find(|(c, _)| handler_eq(*c, composite)) {
            entry.1 = substate;
            return;
        }
        let _ = self.history.push((composite, substate));
    }

    /// Dispatches [`Signal::EMPTY`] to `s` and reads back its parent,
    /// `None` at the top state.
    fn super_of(&self, ctx: &mut T, s: StateHandler<T>) -> Option<StateHandler<T>> {
        match s(ctx, &Event::empty(Signal::EMPTY)) {
            Outcome::Super(parent) => Some(parent),
            Outcome::Ignored => None,
            _ => fault!(Fault::HierarchyDepthOverflow),
        }
    }

    /// A state's own chain, from itself up to (and including) the top.
    fn chain_to_top(&self, ctx: &mut T, start: StateHandler<T>) -> Chain<T> {
        let mut chain = Chain::new();
        let mut s = start;
        loop {
            if chain.push(s).is_err() {
                fault!(Fault::HierarchyDepthOverflow);
            }
            match self.super_of(ctx, s) {
                Some(parent) => s = parent,
                None => return chain,
            }
        }
    }

    /// Dispatches a pseudo-signal directly at `s` (no bubbling — see
    /// `Outcome` docs). `Tran` is only legal for `Signal::INIT`.
    fn dispatch_pseudo(&self, ctx: &mut T, s: StateHandler<T>, signal: Signal) -> Outcome<T> {
        let outcome = s(ctx, &Event::empty(signal));
        if matches!(outcome, Outcome::Tran(_)) && signal != Signal::INIT {
            fault!(Fault::TranFromEntryExit);
        }
        outcome
    }

    fn enter_each(&self, ctx: &mut T, entries: &[StateHandler<T>]) {
        for s in entries {
            self.dispatch_pseudo(ctx, *s, Signal::ENTRY);
        }
    }

    /// Reversed prefix of `chain` strictly before the first occurrence
    /// of `boundary` (or the whole chain if `boundary` is absent).
    fn entries_before(chain: &Chain<T>, boundary: StateHandler<T>) -> Chain<T> {
        let idx = chain
            .iter()
            .position(|s| handler_eq(*s, boundary))
            .unwrap_or(chain.len());
        let mut out = Chain::new();
        for s in chain[..idx].iter().rev() {
            let _ = out.push(*s);
        }
        out
    }

    /// Finds the least common ancestor of `h` and `t`. Self-transitions
    /// (`h == t`) force the LCA to `h`'s parent so the state is both
    /// exited and re-entered, matching spec §4.C case 1.
    fn find_lca(chain_h: &Chain<T>, chain_t: &Chain<T>, h: StateHandler<T>, t: StateHandler<T>) -> StateHandler<T> {
        if handler_eq(h, t) {
            return chain_h[1.min(chain_h.len() - 1)];
        }
        for candidate in chain_h {
            if chain_t.iter().any(|s| handler_eq(*s, *candidate)) {
                return *candidate;
            }
        }
        fault!(Fault::HierarchyDepthOverflow);
    }

    /// Runs the chained initial-transition chase after entering `leaf`:
    /// repeatedly dispatches `INIT`, entering each nested initial
    /// target, until a state reports no further initial transition.
    fn init_chase(&mut self, ctx: &mut T, mut leaf: StateHandler<T>) {
        loop {
            match self.dispatch_pseudo(ctx, leaf, Signal::INIT) {
                Outcome::Tran(next) => {
                    self.dispatch_pseudo(ctx, next, Signal::ENTRY);
                    self.current = next;
                    leaf = next;
                }
                _ => return,
            }
        }
    }

    /// Enters `t`, honoring history if `t` is history-enabled and has a
    /// recorded substate, then runs the initial-transition chase.
    fn enter_target(&mut self, ctx: &mut T, t: StateHandler<T>) {
        if self.is_history_enabled(t) {
            if let Some(recorded) = self.history_of(t) {
                let chain = self.chain_to_top(ctx, recorded);
                let entries = Self::entries_before(&chain, t);
                self.enter_each(ctx, &entries);
                self.current = recorded;
                self.init_chase(ctx, recorded);
                return;
            }
        }
        self.current = t;
        self.init_chase(ctx, t);
    }

    /// Runs the topmost initial transition. Must be called exactly
    /// once, before any [`Hsm::dispatch`].
    pub fn start(&mut self, ctx: &mut T) {
        let top = self.current;
        match top(ctx, &Event::empty(Signal::INIT)) {
            Outcome::Tran(t0) => {
                self.dispatch_pseudo(ctx, top, Signal::ENTRY);
                let chain_t0 = self.chain_to_top(ctx, t0);
                let entries = Self::entries_before(&chain_t0, top);
                self.enter_each(ctx, &entries);
                self.enter_target(ctx, t0);
            }
            _ => fault!(Fault::HierarchyDepthOverflow),
        }
    }

    fn execute_transition(&mut self, ctx: &mut T, h: StateHandler<T>, t: StateHandler<T>) {
        let chain_h = self.chain_to_top(ctx, h);
        let chain_t = self.chain_to_top(ctx, t);
        let lca = Self::find_lca(&chain_h, &chain_t, h, t);

        // Exit from the real current leaf (which may sit below `h`)
        // up to, but not including, the LCA.
        let mut s = self.current;
        let mut previously_exited: Option<StateHandler<T>> = None;
        while !handler_eq(s, lca) {
            self.dispatch_pseudo(ctx, s, Signal::EXIT);
            if self.is_history_enabled(s) {
                if let Some(child) = previously_exited {
                    self.record_history(s, child);
                }
            }
            previously_exited = Some(s);
            s = self
                .super_of(ctx, s)
                .unwrap_or_else(|| fault!(Fault::HierarchyDepthOverflow));
        }

        let entries = Self::entries_before(&chain_t, lca);
        self.enter_each(ctx, &entries);
        self.enter_target(ctx, t);
    }

    /// Dispatches `event` to the current state, walking `Super` chains
    /// until a state handles it, and executing the full transition if
    /// the result is `Tran`. Run-to-completion: never yields.
    pub fn dispatch(&mut self, ctx: &mut T, event: &Event) {
        let mut s = self.current;
        loop {
            match s(ctx, event) {
                Outcome::Handled | Outcome::Ignored => return,
                Outcome::Super(parent) => s = parent,
                Outcome::Tran(t) => {
                    self.execute_transition(ctx, s, t);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
