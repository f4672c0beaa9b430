//! Deferred work on the simulation clock.
//!
//! [`TaskQueue`] is a priority queue of actions keyed by the time they fire.
//! It is polled once per fixed tick and never blocks; an action scheduled
//! for the past fires on the next poll.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use bevy::prelude::*;

/// Monotonic clock advanced by the controller's fixed timestep.
#[derive(Resource, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Resource)]
pub struct SimulationClock {
    elapsed: Duration,
    ticks: u64,
}

impl SimulationClock {
    /// Advance by one tick of `dt` seconds. Non-finite or negative steps
    /// still count as a tick but do not move time.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += Duration::try_from_secs_f32(dt).unwrap_or_default();
        self.ticks += 1;
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

struct Scheduled<A> {
    fire_at: Duration,
    seq: u64,
    action: A,
}

impl<A> Scheduled<A> {
    fn key(&self) -> (Duration, u64) {
        (self.fire_at, self.seq)
    }
}

impl<A> PartialEq for Scheduled<A> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<A> Eq for Scheduled<A> {}

impl<A> PartialOrd for Scheduled<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Scheduled<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Actions waiting for their fire time. Actions due at the same time fire in
/// scheduling order.
pub struct TaskQueue<A> {
    heap: BinaryHeap<Reverse<Scheduled<A>>>,
    next_seq: u64,
}

impl<A> Default for TaskQueue<A> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<A> TaskQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to fire `delay` after `now`.
    pub fn schedule(&mut self, now: Duration, delay: Duration, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled {
            fire_at: now + delay,
            seq,
            action,
        }));
    }

    /// Remove and return the earliest action due at `now`, if any.
    pub fn pop_due(&mut self, now: Duration) -> Option<A> {
        if self.heap.peek()?.0.fire_at > now {
            return None;
        }
        self.heap.pop().map(|Reverse(task)| task.action)
    }

    /// Remove and return every action due at `now`, earliest first.
    pub fn drain_due(&mut self, now: Duration) -> Vec<A> {
        std::iter::from_fn(|| self.pop_due(now)).collect()
    }

    /// Fire time of the next pending action.
    pub fn next_fire_time(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(task)| task.fire_at)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<A> std::fmt::Debug for TaskQueue<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.heap.len())
            .field("next_fire_time", &self.next_fire_time())
            .finish()
    }
}
