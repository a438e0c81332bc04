//! Cancellable deferred actions on a caller-driven tick.
//!
//! The scheduler is a due-time queue with no threads of its own: the owner
//! arms entries, then drains them with [`EventScheduler::pop_due`] from its
//! tick loop. Entries pop in due order (arming order breaks ties) and carry
//! their due time, so a late tick can process each action at the instant it
//! was supposed to fire rather than at the instant the tick happened.
//!
//! Recurrence is deliberately not built in. A periodic action arms only its
//! first fire; the processor re-arms the next occurrence when it handles the
//! fire (reschedule-on-fire). That keeps cancellation possible between any
//! two fires and bounds drift at one interval.
//!
//! Once `cancel` returns, the entry is guaranteed never to pop. There is no
//! mid-execution race to worry about: everything runs on the host's single
//! logical thread of control.

use serde::{Deserialize, Serialize};

/// Identifies a scheduled entry for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(u64);

/// A popped entry: the action together with the instant it was due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<A> {
    pub handle: Handle,
    pub due_ms: u64,
    pub action: A,
}

#[derive(Debug, Clone)]
struct Entry<A> {
    id: u64,
    due_ms: u64,
    action: A,
}

/// Due-time queue of cancellable deferred actions.
#[derive(Debug, Clone)]
pub struct EventScheduler<A> {
    entries: Vec<Entry<A>>,
    next_id: u64,
}

impl<A> EventScheduler<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Arm `action` to fire once at `now + delay`.
    pub fn schedule_once(&mut self, now_ms: u64, delay_ms: u64, action: A) -> Handle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due_ms: now_ms.saturating_add(delay_ms),
            action,
        });
        Handle(id)
    }

    /// Arm the first fire of a recurring action at `now + interval`.
    ///
    /// The scheduler fires it exactly once; the processor re-arms the next
    /// occurrence from the fire time when it handles this one.
    pub fn schedule_periodic(&mut self, now_ms: u64, interval_ms: u64, action: A) -> Handle {
        self.schedule_once(now_ms, interval_ms, action)
    }

    /// Cancel an entry. Idempotent: cancelling an already-fired or
    /// already-cancelled handle is a no-op.
    pub fn cancel(&mut self, handle: Handle) {
        self.entries.retain(|e| e.id != handle.0);
    }

    /// Cancel every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Remove and return the earliest entry with `due <= now`, if any.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<Fired<A>> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.id))
            .map(|(i, _)| i)?;
        let entry = self.entries.swap_remove(idx);
        Some(Fired {
            handle: Handle(entry.id),
            due_ms: entry.due_ms,
            action: entry.action,
        })
    }

    /// Due time of the next pending entry, if any.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<A> Default for EventScheduler<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Act {
        A,
        B,
        C,
    }

    #[test]
    fn pops_in_due_order() {
        let mut s = EventScheduler::new();
        s.schedule_once(0, 500, Act::B);
        s.schedule_once(0, 100, Act::A);
        s.schedule_once(0, 900, Act::C);
        assert_eq!(s.pop_due(1_000).unwrap().action, Act::A);
        assert_eq!(s.pop_due(1_000).unwrap().action, Act::B);
        assert_eq!(s.pop_due(1_000).unwrap().action, Act::C);
        assert!(s.pop_due(1_000).is_none());
    }

    #[test]
    fn nothing_pops_before_due() {
        let mut s = EventScheduler::new();
        s.schedule_once(0, 500, Act::A);
        assert!(s.pop_due(499).is_none());
        assert!(s.pop_due(500).is_some());
    }

    #[test]
    fn fired_carries_due_time() {
        let mut s = EventScheduler::new();
        s.schedule_once(200, 300, Act::A);
        let fired = s.pop_due(10_000).unwrap();
        assert_eq!(fired.due_ms, 500);
    }

    #[test]
    fn ties_break_by_arming_order() {
        let mut s = EventScheduler::new();
        s.schedule_once(0, 100, Act::A);
        s.schedule_once(0, 100, Act::B);
        assert_eq!(s.pop_due(100).unwrap().action, Act::A);
        assert_eq!(s.pop_due(100).unwrap().action, Act::B);
    }

    #[test]
    fn cancel_prevents_fire_even_after_due() {
        let mut s = EventScheduler::new();
        let h = s.schedule_once(0, 100, Act::A);
        s.cancel(h);
        assert!(s.pop_due(10_000).is_none());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = EventScheduler::new();
        let h = s.schedule_once(0, 100, Act::A);
        s.cancel(h);
        s.cancel(h);
        let h2 = s.schedule_once(0, 100, Act::B);
        s.cancel(h);
        assert_eq!(s.pop_due(100).unwrap().handle, h2);
    }

    #[test]
    fn clear_cancels_everything() {
        let mut s = EventScheduler::new();
        s.schedule_once(0, 100, Act::A);
        s.schedule_periodic(0, 200, Act::B);
        s.clear();
        assert!(s.is_empty());
        assert!(s.pop_due(u64::MAX).is_none());
    }

    #[test]
    fn next_due_reports_earliest() {
        let mut s = EventScheduler::new();
        assert_eq!(s.next_due_ms(), None);
        s.schedule_once(0, 700, Act::A);
        s.schedule_once(0, 300, Act::B);
        assert_eq!(s.next_due_ms(), Some(300));
    }
}
