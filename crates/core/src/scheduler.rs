use std::collections::BTreeMap;
use std::time::Duration;

pub trait Scheduler<E> {
    fn now(&self) -> Duration;
    fn schedule_after(&mut self, delay: Duration, event: E);
}

/// Virtual clock with a queue of pending events. Time only moves when the
/// owner advances it, either step by step or by an elapsed wall-clock span.
/// Events due at the same instant fire in scheduling order.
#[derive(Debug)]
pub struct Timeline<E> {
    now: Duration,
    next_seq: u64,
    pending: BTreeMap<(Duration, u64), E>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Jumps to the earliest pending event and returns it.
    pub fn advance_to_next(&mut self) -> Option<E> {
        let key = *self.pending.keys().next()?;
        let event = self.pending.remove(&key)?;
        self.now = self.now.max(key.0);
        Some(event)
    }

    /// Pops the earliest event due no later than `deadline`, moving the clock
    /// to its due time.
    pub fn pop_due(&mut self, deadline: Duration) -> Option<E> {
        match self.next_due() {
            Some(due) if due <= deadline => self.advance_to_next(),
            _ => None,
        }
    }

    pub fn advance_to(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

impl<E> Scheduler<E> for Timeline<E> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_after(&mut self, delay: Duration, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert((self.now.saturating_add(delay), seq), event);
    }
}
