//! Tick-driven timers
//!
//! Pending events count down by the tick's `dt` and fire once their delay
//! runs out. Anything scheduled can be cancelled through its `TimerId`,
//! which is how a despawning cart kills its outstanding timers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Pending<E> {
    id: TimerId,
    remaining: f32,
    event: E,
}

/// Queue of delayed events
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    pending: Vec<Pending<E>>,
    next_id: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 1,
        }
    }

    /// Fire `event` after `delay` seconds of ticks
    pub fn schedule(&mut self, delay: f32, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            remaining: delay.max(0.0),
            event,
        });
        id
    }

    /// Drop a pending event; false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Count every timer down by `dt` and return the events that came due,
    /// earliest deadline first (ties in scheduling order)
    pub fn advance(&mut self, dt: f32) -> Vec<E> {
        for p in &mut self.pending {
            p.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].remaining <= 0.0 {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        due.into_iter().map(|p| p.event).collect()
    }
}
