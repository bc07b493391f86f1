//! Deferred reactivation
//!
//! Assemble and print freeze particles and release them after a per-particle
//! delay. The field does not own a clock: it asks a [`Scheduler`] to hold the
//! pending releases and later drains the ones that came due. [`TimerQueue`] is
//! a virtual-clock implementation driven by the host's frame timestamps.

use particle_physics::ReactivationHandle;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// Capability for scheduling and cancelling particle reactivations
pub trait Scheduler {
    /// Schedule the release of particle `index` after `delay` from the
    /// scheduler's current time.
    fn schedule(&mut self, delay: Duration, index: usize) -> ReactivationHandle;

    /// Cancel a pending release. Unknown or already fired handles are a no-op
    /// and return `false`.
    fn cancel(&mut self, handle: ReactivationHandle) -> bool;

    /// Advance the clock to `now` and append every release due at or before it
    /// to `fired`, earliest first. Equal deadlines fire in scheduling order.
    fn fire_due(&mut self, now: Duration, fired: &mut Vec<(ReactivationHandle, usize)>);

    /// Number of releases still pending
    fn pending(&self) -> usize;
}

/// Virtual-clock scheduler ordered by deadline
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    // (deadline, id) -> particle index
    timers: BTreeMap<(Duration, u64), usize>,
    deadlines: HashMap<u64, Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, index: usize) -> ReactivationHandle {
        let id = self.next_id;
        self.next_id += 1;

        let deadline = self.now + delay;
        self.timers.insert((deadline, id), index);
        self.deadlines.insert(id, deadline);
        ReactivationHandle(id)
    }

    fn cancel(&mut self, handle: ReactivationHandle) -> bool {
        match self.deadlines.remove(&handle.0) {
            Some(deadline) => self.timers.remove(&(deadline, handle.0)).is_some(),
            None => false,
        }
    }

    fn fire_due(&mut self, now: Duration, fired: &mut Vec<(ReactivationHandle, usize)>) {
        // The clock never runs backwards
        self.now = self.now.max(now);

        while let Some((&(deadline, id), _)) = self.timers.first_key_value() {
            if deadline > self.now {
                break;
            }
            if let Some((_, index)) = self.timers.pop_first() {
                self.deadlines.remove(&id);
                fired.push((ReactivationHandle(id), index));
            }
        }
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(ms(3), 30);
        queue.schedule(ms(1), 10);
        queue.schedule(ms(2), 20);

        let mut fired = Vec::new();
        queue.fire_due(ms(2), &mut fired);
        let indices: Vec<usize> = fired.iter().map(|&(_, index)| index).collect();
        assert_eq!(indices, vec![10, 20]);
        assert_eq!(queue.pending(), 1);

        fired.clear();
        queue.fire_due(ms(10), &mut fired);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, 30);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut queue = TimerQueue::new();
        for index in 0..5 {
            queue.schedule(ms(1), index);
        }
        let mut fired = Vec::new();
        queue.fire_due(ms(1), &mut fired);
        let indices: Vec<usize> = fired.iter().map(|&(_, index)| index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(5), 0);

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));
        assert!(!queue.cancel(ReactivationHandle(999)));

        let mut fired = Vec::new();
        queue.fire_due(ms(100), &mut fired);
        assert!(fired.is_empty());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule(ms(1), 0);
        let mut fired = Vec::new();
        queue.fire_due(ms(1), &mut fired);
        assert!(!queue.cancel(handle));
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut queue = TimerQueue::new();
        let mut fired = Vec::new();
        queue.fire_due(ms(100), &mut fired);
        queue.schedule(ms(5), 7);

        queue.fire_due(ms(104), &mut fired);
        assert!(fired.is_empty());
        queue.fire_due(ms(105), &mut fired);
        assert_eq!(fired.len(), 1);

        // Going back in time does not rewind the clock
        queue.fire_due(ms(0), &mut fired);
        assert_eq!(queue.now(), ms(105));
    }
}
