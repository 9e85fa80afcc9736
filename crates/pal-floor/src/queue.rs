//! FIFO wait queue with unique membership.
//!
//! [`WaitQueue`] keeps arrival order in a `VecDeque` and membership in a
//! `HashSet`, so duplicate checks are O(1) and a participant can never be
//! queued twice.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use crate::id::ParticipantId;

/// A participant waiting for the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub participant: ParticipantId,
    /// When the participant joined the queue.
    pub requested_at: Instant,
}

/// Participants waiting for the floor, earliest first.
#[derive(Debug, Default, Clone)]
pub struct WaitQueue {
    entries: VecDeque<QueueEntry>,
    members: HashSet<ParticipantId>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `participant` at the tail. Returns `false` without changing
    /// anything if it is already queued.
    pub fn enqueue(&mut self, participant: ParticipantId, requested_at: Instant) -> bool {
        if !self.members.insert(participant) {
            return false;
        }
        self.entries.push_back(QueueEntry {
            participant,
            requested_at,
        });
        true
    }

    /// Removes and returns the earliest entry.
    pub fn dequeue_head(&mut self) -> Option<QueueEntry> {
        let entry = self.entries.pop_front()?;
        self.members.remove(&entry.participant);
        Some(entry)
    }

    /// Removes `participant` from wherever it sits. Everyone behind it moves
    /// up one place; relative order is unchanged.
    pub fn remove(&mut self, participant: &ParticipantId) -> Option<QueueEntry> {
        if !self.members.remove(participant) {
            return None;
        }
        let index = self
            .entries
            .iter()
            .position(|e| e.participant == *participant)?;
        self.entries.remove(index)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.members.contains(participant)
    }

    /// 1-based queue position, `None` if not queued.
    pub fn position(&self, participant: &ParticipantId) -> Option<usize> {
        if !self.contains(participant) {
            return None;
        }
        self.entries
            .iter()
            .position(|e| e.participant == *participant)
            .map(|p| p + 1)
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// How long the head of the queue has been waiting.
    pub fn longest_wait(&self, now: Instant) -> Option<Duration> {
        self.head()
            .map(|e| now.saturating_duration_since(e.requested_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| ParticipantId::new()).collect()
    }

    fn order(queue: &WaitQueue) -> Vec<ParticipantId> {
        queue.iter().map(|e| e.participant).collect()
    }

    #[test]
    fn enqueue_is_unique_and_ordered() {
        let now = Instant::now();
        let p = ids(3);
        let mut queue = WaitQueue::new();

        assert!(queue.enqueue(p[0], now));
        assert!(queue.enqueue(p[1], now));
        assert!(!queue.enqueue(p[0], now));
        assert!(queue.enqueue(p[2], now));

        assert_eq!(order(&queue), vec![p[0], p[1], p[2]]);
        assert_eq!(queue.position(&p[2]), Some(3));
    }

    #[test]
    fn dequeue_head_pops_earliest() {
        let now = Instant::now();
        let p = ids(2);
        let mut queue = WaitQueue::new();
        queue.enqueue(p[0], now);
        queue.enqueue(p[1], now);

        assert_eq!(queue.dequeue_head().unwrap().participant, p[0]);
        assert!(!queue.contains(&p[0]));
        assert_eq!(queue.position(&p[1]), Some(1));
        assert_eq!(queue.dequeue_head().unwrap().participant, p[1]);
        assert!(queue.dequeue_head().is_none());
    }

    #[test]
    fn remove_from_middle_keeps_order() {
        let now = Instant::now();
        let p = ids(4);
        let mut queue = WaitQueue::new();
        for id in &p {
            queue.enqueue(*id, now);
        }

        assert_eq!(queue.remove(&p[1]).unwrap().participant, p[1]);
        assert_eq!(order(&queue), vec![p[0], p[2], p[3]]);
        assert!(queue.remove(&p[1]).is_none());

        // Removed participants can rejoin, at the tail.
        assert!(queue.enqueue(p[1], now));
        assert_eq!(queue.position(&p[1]), Some(4));
    }

    #[test]
    fn longest_wait_tracks_head() {
        let t0 = Instant::now();
        let p = ids(2);
        let mut queue = WaitQueue::new();
        assert_eq!(queue.longest_wait(t0), None);

        queue.enqueue(p[0], t0);
        queue.enqueue(p[1], t0 + Duration::from_secs(3));
        let now = t0 + Duration::from_secs(10);
        assert_eq!(queue.longest_wait(now), Some(Duration::from_secs(10)));

        queue.dequeue_head();
        assert_eq!(queue.longest_wait(now), Some(Duration::from_secs(7)));
    }
}
