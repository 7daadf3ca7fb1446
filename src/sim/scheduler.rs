/// Simulated-time scheduler.
///
/// Owns the clock (integer milliseconds) and decides what fires when:
///   - `Fired::Tick`      every `tick_rate_ms`      (physics)
///   - `Fired::Second`    every 1000 ms             (run clock)
///   - `Fired::Action(_)` once, at its due time     (deferred work)
///
/// Firings come out in chronological order. Ties resolve Tick, then
/// Second, then actions in scheduling order.
///
/// Callers either take a whole batch with `advance`, or call
/// `begin_advance` and drain with `poll`; the latter sees actions that
/// are scheduled while the batch is being processed.

use std::cell::Cell;
use std::rc::Rc;

pub const SECOND_MS: u64 = 1000;
/// Catch-up cap for one advance, in ticks. A long stall (debugger,
/// suspended terminal) is dropped rather than replayed.
pub const MAX_CATCH_UP_TICKS: u64 = 10;

/// Work deferred to a later point in simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deferred {
    /// Respawn the player, if `generation` still matches the world's.
    Respawn { generation: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fired {
    Tick,
    Second,
    Action(Deferred),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActionId(u64);

/// Shared stop flag. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug)]
struct Pending {
    id: ActionId,
    due_ms: u64,
    action: Deferred,
}

#[derive(Debug)]
pub struct Scheduler {
    now_ms: u64,
    horizon_ms: u64,
    tick_rate_ms: u64,
    next_tick_ms: u64,
    next_second_ms: u64,
    pending: Vec<Pending>,
    next_id: u64,
    token: CancelToken,
}

impl Scheduler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let tick_rate_ms = tick_rate_ms.max(1);
        Scheduler {
            now_ms: 0,
            horizon_ms: 0,
            tick_rate_ms,
            next_tick_ms: tick_rate_ms,
            next_second_ms: SECOND_MS,
            pending: Vec::new(),
            next_id: 0,
            token: CancelToken::new(),
        }
    }

    pub fn now_ms(&self) -> u64 { self.now_ms }

    pub fn token(&self) -> CancelToken { self.token.clone() }

    pub fn is_stopped(&self) -> bool { self.token.is_cancelled() }

    pub fn pending_count(&self) -> usize { self.pending.len() }

    /// Run `action` once, `delay_ms` after the current simulated time.
    pub fn schedule(&mut self, delay_ms: u64, action: Deferred) -> ActionId {
        let id = ActionId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, due_ms: self.now_ms + delay_ms, action });
        id
    }

    /// Drop a deferred action. Returns false if it already fired or was
    /// never scheduled.
    pub fn cancel(&mut self, id: ActionId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Deregister everything. A stopped scheduler never fires again.
    pub fn stop(&mut self) {
        self.token.cancel();
        self.pending.clear();
    }

    /// Move the clock forward and return everything that came due.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<Fired> {
        self.begin_advance(elapsed_ms);
        let mut fired = Vec::new();
        while let Some(f) = self.poll() {
            fired.push(f);
        }
        fired
    }

    /// Open a batch ending `elapsed_ms` from now (capped).
    pub fn begin_advance(&mut self, elapsed_ms: u64) {
        let capped = elapsed_ms.min(MAX_CATCH_UP_TICKS * self.tick_rate_ms);
        self.horizon_ms = self.now_ms.max(self.horizon_ms) + capped;
    }

    /// Next firing within the open batch, or None once the batch is done.
    pub fn poll(&mut self) -> Option<Fired> {
        if self.is_stopped() { return None; }

        let action = self.pending.iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.due_ms, p.id.0))
            .map(|(i, p)| (i, p.due_ms));

        let mut due = self.next_tick_ms.min(self.next_second_ms);
        if let Some((_, at)) = action { due = due.min(at); }
        if due > self.horizon_ms {
            self.now_ms = self.horizon_ms;
            return None;
        }
        self.now_ms = self.now_ms.max(due);

        if self.next_tick_ms == due {
            self.next_tick_ms += self.tick_rate_ms;
            return Some(Fired::Tick);
        }
        if self.next_second_ms == due {
            self.next_second_ms += SECOND_MS;
            return Some(Fired::Second);
        }
        let (index, _) = action?;
        Some(Fired::Action(self.pending.remove(index).action))
    }
}
