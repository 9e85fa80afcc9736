//! Single-holder floor lease with a FIFO wait queue.
//!
//! [`LeaseManager`] is the only thing that mutates a floor's lease and queue.
//! Every operation takes `&mut self`, so callers serialize access however
//! suits them (the server keeps one manager per room inside a `DashMap`
//! entry). Nothing here blocks or owns a timer: stale leases are reclaimed
//! when an external scheduler calls [`LeaseManager::expire_if_stale`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::error::FloorError;
use crate::event::{FloorEvent, GrantReason, NoopNotifier, Notifier, ReleaseReason};
use crate::id::ParticipantId;
use crate::lease::Lease;
use crate::queue::WaitQueue;

/// Result of [`LeaseManager::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The caller now holds the floor.
    Granted,
    /// The caller is waiting at `position` (1-based).
    Queued { position: usize },
    /// The caller already held the floor; nothing changed.
    AlreadyHolder,
}

/// Result of a successful [`LeaseManager::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    /// Participant promoted from the queue, if anyone was waiting.
    pub next_holder: Option<ParticipantId>,
}

/// Result of [`LeaseManager::force_release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceReleaseOutcome {
    WasHolder { next_holder: Option<ParticipantId> },
    WasQueued,
    /// The participant neither held the floor nor waited for it.
    NotPresent,
}

/// A lease reclaimed by [`LeaseManager::expire_if_stale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiry {
    pub holder: ParticipantId,
    pub held_for: Duration,
    pub next_holder: Option<ParticipantId>,
}

/// One waiting participant in a [`FloorSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedView {
    pub participant: ParticipantId,
    pub position: usize,
    pub waiting_ms: u64,
}

/// Read-only view of a floor for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorSnapshot {
    pub holder: Option<ParticipantId>,
    pub held_for_ms: Option<u64>,
    pub muted: bool,
    pub queue: Vec<QueuedView>,
}

/// Serializes access to one shared floor.
pub struct LeaseManager {
    lease: Option<Lease>,
    queue: WaitQueue,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
}

impl LeaseManager {
    /// Creates a free floor that timestamps with `clock` and reports changes
    /// to `notifier`.
    pub fn new(clock: Arc<dyn Clock>, notifier: impl Notifier + 'static) -> Self {
        LeaseManager {
            lease: None,
            queue: WaitQueue::new(),
            clock,
            notifier: Box::new(notifier),
        }
    }

    /// Asks for the floor on behalf of `participant`.
    ///
    /// A free floor with nobody waiting is granted immediately. Otherwise the
    /// caller joins the tail of the queue (once; repeats are no-ops) and, if
    /// the floor happens to be free, the queue head is promoted so arrival
    /// order is preserved.
    pub fn request(&mut self, participant: ParticipantId) -> RequestOutcome {
        let now = self.clock.now();

        match self.holder() {
            Some(holder) if holder == participant => RequestOutcome::AlreadyHolder,
            Some(_) => self.join_queue(participant, now),
            None if self.queue.is_empty() => {
                self.grant(participant, now, GrantReason::Immediate);
                RequestOutcome::Granted
            }
            None => {
                let queued = self.join_queue(participant, now);
                self.promote_head(now);
                if self.is_holder(&participant) {
                    RequestOutcome::Granted
                } else {
                    match self.queue.position(&participant) {
                        Some(position) => RequestOutcome::Queued { position },
                        None => queued,
                    }
                }
            }
        }
    }

    /// Gives up the floor. Fails with [`FloorError::NotHolder`] without
    /// changing anything if `participant` is not the holder.
    pub fn release(&mut self, participant: ParticipantId) -> Result<ReleaseOutcome, FloorError> {
        let holder = self.holder();
        if holder != Some(participant) {
            return Err(FloorError::NotHolder {
                participant,
                holder,
            });
        }

        let now = self.clock.now();
        let next_holder = self.vacate(ReleaseReason::Released, now);
        Ok(ReleaseOutcome { next_holder })
    }

    /// Removes every trace of `participant`, as on disconnect. Never fails.
    pub fn force_release(&mut self, participant: ParticipantId) -> ForceReleaseOutcome {
        if self.is_holder(&participant) {
            let now = self.clock.now();
            let next_holder = self.vacate(ReleaseReason::Disconnected, now);
            tracing::info!(%participant, ?next_holder, "floor holder disconnected");
            return ForceReleaseOutcome::WasHolder { next_holder };
        }

        if self.queue.remove(&participant).is_some() {
            tracing::debug!(%participant, "disconnected participant left floor queue");
            self.notifier.notify(FloorEvent::Withdrawn { participant });
            return ForceReleaseOutcome::WasQueued;
        }

        ForceReleaseOutcome::NotPresent
    }

    /// Reclaims the floor if it has been held longer than `max_hold` as of
    /// `now`, promoting the next waiter.
    pub fn expire_if_stale(&mut self, now: Instant, max_hold: Duration) -> Option<Expiry> {
        let lease = self.lease.as_ref()?;
        if !lease.is_stale(now, max_hold) {
            return None;
        }

        let holder = lease.holder;
        let held_for = lease.held_for(now);
        tracing::warn!(
            %holder,
            held_for_ms = held_for.as_millis() as u64,
            max_hold_ms = max_hold.as_millis() as u64,
            "expiring stale floor lease"
        );
        let next_holder = self.vacate(ReleaseReason::Expired, now);

        Some(Expiry {
            holder,
            held_for,
            next_holder,
        })
    }

    /// Takes a waiting participant out of the queue.
    pub fn withdraw(&mut self, participant: ParticipantId) -> Result<(), FloorError> {
        match self.queue.remove(&participant) {
            Some(_) => {
                self.notifier.notify(FloorEvent::Withdrawn { participant });
                Ok(())
            }
            None => Err(FloorError::NotQueued { participant }),
        }
    }

    /// Sets the holder's mute flag. Only the holder may do this.
    pub fn set_muted(&mut self, participant: ParticipantId, muted: bool) -> Result<(), FloorError> {
        match self.lease.as_mut() {
            Some(lease) if lease.holder == participant => {
                if lease.muted != muted {
                    lease.muted = muted;
                    self.notifier
                        .notify(FloorEvent::MuteChanged { participant, muted });
                }
                Ok(())
            }
            other => Err(FloorError::NotHolder {
                participant,
                holder: other.map(|l| l.holder),
            }),
        }
    }

    pub fn holder(&self) -> Option<ParticipantId> {
        self.lease.as_ref().map(|l| l.holder)
    }

    pub fn lease(&self) -> Option<&Lease> {
        self.lease.as_ref()
    }

    pub fn is_holder(&self, participant: &ParticipantId) -> bool {
        self.lease
            .as_ref()
            .is_some_and(|l| l.holder == *participant)
    }

    /// 1-based position of `participant` in the queue.
    pub fn queue_position(&self, participant: &ParticipantId) -> Option<usize> {
        self.queue.position(participant)
    }

    pub fn queue(&self) -> &WaitQueue {
        &self.queue
    }

    /// True when nobody holds the floor and nobody is waiting.
    pub fn is_idle(&self) -> bool {
        self.lease.is_none() && self.queue.is_empty()
    }

    pub fn snapshot(&self) -> FloorSnapshot {
        let now = self.clock.now();
        FloorSnapshot {
            holder: self.holder(),
            held_for_ms: self
                .lease
                .as_ref()
                .map(|l| l.held_for(now).as_millis() as u64),
            muted: self.lease.as_ref().is_some_and(|l| l.muted),
            queue: self
                .queue
                .iter()
                .enumerate()
                .map(|(i, entry)| QueuedView {
                    participant: entry.participant,
                    position: i + 1,
                    waiting_ms: now.saturating_duration_since(entry.requested_at).as_millis()
                        as u64,
                })
                .collect(),
        }
    }

    fn join_queue(&mut self, participant: ParticipantId, now: Instant) -> RequestOutcome {
        if self.queue.enqueue(participant, now) {
            let position = self.queue.len();
            tracing::debug!(%participant, position, "participant queued for floor");
            self.notifier
                .notify(FloorEvent::Queued { participant, position });
        }
        let position = self
            .queue
            .position(&participant)
            .unwrap_or(self.queue.len());
        RequestOutcome::Queued { position }
    }

    fn grant(&mut self, participant: ParticipantId, now: Instant, reason: GrantReason) {
        tracing::debug!(%participant, ?reason, "floor granted");
        self.lease = Some(Lease::new(participant, now));
        self.notifier
            .notify(FloorEvent::Granted { participant, reason });
    }

    /// Hands the free floor to the queue head, or announces it is free.
    fn promote_head(&mut self, now: Instant) -> Option<ParticipantId> {
        match self.queue.dequeue_head() {
            Some(entry) => {
                self.grant(entry.participant, now, GrantReason::Promoted);
                Some(entry.participant)
            }
            None => {
                self.notifier.notify(FloorEvent::Freed);
                None
            }
        }
    }

    /// Clears the current lease and promotes the next waiter.
    fn vacate(&mut self, reason: ReleaseReason, now: Instant) -> Option<ParticipantId> {
        if let Some(lease) = self.lease.take() {
            self.notifier.notify(FloorEvent::Released {
                participant: lease.holder,
                reason,
            });
        }
        self.promote_head(now)
    }
}

impl Default for LeaseManager {
    fn default() -> Self {
        LeaseManager::new(Arc::new(SystemClock), NoopNotifier)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;
    use crate::clock::ManualClock;

    struct Harness {
        manager: LeaseManager,
        clock: Arc<ManualClock>,
        events: Arc<Mutex<Vec<FloorEvent>>>,
    }

    impl Harness {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new());
            let events = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&events);
            let manager = LeaseManager::new(clock.clone(), move |event: FloorEvent| {
                sink.lock().unwrap().push(event);
            });
            Harness {
                manager,
                clock,
                events,
            }
        }

        fn take_events(&self) -> Vec<FloorEvent> {
            std::mem::take(&mut *self.events.lock().unwrap())
        }

        fn queued(&self) -> Vec<ParticipantId> {
            self.manager.queue().iter().map(|e| e.participant).collect()
        }
    }

    fn ids<const N: usize>() -> [ParticipantId; N] {
        std::array::from_fn(|_| ParticipantId::new())
    }

    #[test]
    fn request_release_scenario() {
        let mut h = Harness::new();
        let [a, b] = ids();

        assert_eq!(h.manager.request(a), RequestOutcome::Granted);
        assert_eq!(h.manager.holder(), Some(a));

        assert_eq!(h.manager.request(b), RequestOutcome::Queued { position: 1 });
        assert_eq!(h.queued(), vec![b]);

        let outcome = h.manager.release(a).unwrap();
        assert_eq!(outcome.next_holder, Some(b));
        assert_eq!(h.manager.holder(), Some(b));
        assert!(h.manager.queue().is_empty());

        let err = h.manager.release(a).unwrap_err();
        assert_eq!(
            err,
            FloorError::NotHolder {
                participant: a,
                holder: Some(b)
            }
        );
        assert_eq!(h.manager.holder(), Some(b));
    }

    #[test]
    fn repeated_request_by_holder_is_idempotent() {
        let mut h = Harness::new();
        let [a] = ids();

        assert_eq!(h.manager.request(a), RequestOutcome::Granted);
        let acquired_at = h.manager.lease().unwrap().acquired_at;
        h.take_events();

        h.clock.advance(Duration::from_secs(1));
        assert_eq!(h.manager.request(a), RequestOutcome::AlreadyHolder);
        assert_eq!(h.manager.request(a), RequestOutcome::AlreadyHolder);
        assert_eq!(h.manager.lease().unwrap().acquired_at, acquired_at);
        assert!(h.manager.queue().is_empty());
        assert!(h.take_events().is_empty());
    }

    #[test]
    fn duplicate_request_while_queued_keeps_position() {
        let mut h = Harness::new();
        let [a, b, c] = ids();

        h.manager.request(a);
        h.manager.request(b);
        h.manager.request(c);
        h.take_events();

        assert_eq!(h.manager.request(b), RequestOutcome::Queued { position: 1 });
        assert_eq!(h.manager.request(c), RequestOutcome::Queued { position: 2 });
        assert_eq!(h.queued(), vec![b, c]);
        assert!(h.take_events().is_empty());
    }

    #[test]
    fn release_by_non_holder_changes_nothing() {
        let mut h = Harness::new();
        let [a, b] = ids();

        assert!(matches!(
            h.manager.release(a),
            Err(FloorError::NotHolder { holder: None, .. })
        ));

        h.manager.request(a);
        h.manager.request(b);
        h.take_events();

        assert!(h.manager.release(b).is_err());
        assert_eq!(h.manager.holder(), Some(a));
        assert_eq!(h.queued(), vec![b]);
        assert!(h.take_events().is_empty());
    }

    #[test]
    fn release_with_empty_queue_frees_floor() {
        let mut h = Harness::new();
        let [a] = ids();

        h.manager.request(a);
        h.take_events();
        assert_eq!(h.manager.release(a).unwrap().next_holder, None);
        assert!(h.manager.is_idle());
        assert_eq!(
            h.take_events(),
            vec![
                FloorEvent::Released {
                    participant: a,
                    reason: ReleaseReason::Released
                },
                FloorEvent::Freed,
            ]
        );
    }

    #[test]
    fn force_release_holder_promotes_next() {
        let mut h = Harness::new();
        let [a, b, c] = ids();

        h.manager.request(a);
        h.manager.request(b);
        h.manager.request(c);
        h.take_events();

        assert_eq!(
            h.manager.force_release(a),
            ForceReleaseOutcome::WasHolder { next_holder: Some(b) }
        );
        assert_eq!(h.manager.holder(), Some(b));
        assert_eq!(h.queued(), vec![c]);
        assert_eq!(
            h.take_events(),
            vec![
                FloorEvent::Released {
                    participant: a,
                    reason: ReleaseReason::Disconnected
                },
                FloorEvent::Granted {
                    participant: b,
                    reason: GrantReason::Promoted
                },
            ]
        );
    }

    #[test]
    fn force_release_queued_preserves_order() {
        let mut h = Harness::new();
        let [a, b, c, d] = ids();

        for p in [a, b, c, d] {
            h.manager.request(p);
        }
        assert_eq!(h.manager.force_release(c), ForceReleaseOutcome::WasQueued);
        assert_eq!(h.manager.holder(), Some(a));
        assert_eq!(h.queued(), vec![b, d]);
        assert_eq!(h.manager.queue_position(&d), Some(2));

        let stranger = ParticipantId::new();
        assert_eq!(
            h.manager.force_release(stranger),
            ForceReleaseOutcome::NotPresent
        );
    }

    #[test]
    fn stale_lease_is_reclaimed() {
        let mut h = Harness::new();
        let [a, b] = ids();
        let max_hold = Duration::from_secs(30);

        h.manager.request(a);
        h.manager.request(b);
        let t0 = h.manager.lease().unwrap().acquired_at;

        assert_eq!(h.manager.expire_if_stale(t0 + max_hold, max_hold), None);
        assert_eq!(h.manager.holder(), Some(a));

        let now = t0 + max_hold + Duration::from_millis(1);
        let expiry = h.manager.expire_if_stale(now, max_hold).unwrap();
        assert_eq!(expiry.holder, a);
        assert_eq!(expiry.next_holder, Some(b));
        assert_eq!(expiry.held_for, max_hold + Duration::from_millis(1));
        assert_eq!(h.manager.holder(), Some(b));
        assert_eq!(h.manager.lease().unwrap().acquired_at, now);
    }

    #[test]
    fn expire_on_free_floor_is_noop() {
        let mut h = Harness::new();
        assert_eq!(
            h.manager
                .expire_if_stale(h.clock.now() + Duration::from_secs(999), Duration::ZERO),
            None
        );
        assert!(h.take_events().is_empty());
    }

    #[test]
    fn withdraw_requires_queue_membership() {
        let mut h = Harness::new();
        let [a, b, c] = ids();

        h.manager.request(a);
        h.manager.request(b);
        h.manager.request(c);

        h.manager.withdraw(b).unwrap();
        assert_eq!(h.queued(), vec![c]);
        assert_eq!(
            h.manager.withdraw(b),
            Err(FloorError::NotQueued { participant: b })
        );
        // The holder is not queued either.
        assert!(h.manager.withdraw(a).is_err());
    }

    #[test]
    fn mute_is_holder_only_and_resets_on_grant() {
        let mut h = Harness::new();
        let [a, b] = ids();

        h.manager.request(a);
        h.manager.request(b);
        assert!(h.manager.set_muted(b, true).is_err());

        h.manager.set_muted(a, true).unwrap();
        assert!(h.manager.snapshot().muted);

        h.manager.release(a).unwrap();
        assert_eq!(h.manager.holder(), Some(b));
        assert!(!h.manager.snapshot().muted);
    }

    #[test]
    fn free_floor_with_waiters_serves_queue_first() {
        // A free floor with waiters is only reachable transiently; build it
        // directly to check the request path keeps arrival order.
        let mut h = Harness::new();
        let [a, b] = ids();
        let now = h.clock.now();
        h.manager.queue.enqueue(a, now);

        assert_eq!(h.manager.request(b), RequestOutcome::Queued { position: 1 });
        assert_eq!(h.manager.holder(), Some(a));
        assert_eq!(h.queued(), vec![b]);

        // A waiter that is already at the head gets the floor on request.
        let mut h = Harness::new();
        h.manager.queue.enqueue(a, now);
        assert_eq!(h.manager.request(a), RequestOutcome::Granted);
        assert!(h.manager.queue().is_empty());
    }

    #[test]
    fn snapshot_reports_positions_and_hold_time() {
        let mut h = Harness::new();
        let [a, b, c] = ids();

        h.manager.request(a);
        h.clock.advance(Duration::from_millis(250));
        h.manager.request(b);
        h.manager.request(c);
        h.clock.advance(Duration::from_millis(750));

        let snapshot = h.manager.snapshot();
        assert_eq!(snapshot.holder, Some(a));
        assert_eq!(snapshot.held_for_ms, Some(1000));
        assert_eq!(
            snapshot.queue,
            vec![
                QueuedView {
                    participant: b,
                    position: 1,
                    waiting_ms: 750
                },
                QueuedView {
                    participant: c,
                    position: 2,
                    waiting_ms: 750
                },
            ]
        );
    }

    /// Operations against a pool of four participants.
    #[derive(Debug, Clone)]
    enum Op {
        Request(usize),
        Release(usize),
        ForceRelease(usize),
        Withdraw(usize),
        Expire,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..4usize).prop_map(Op::Request),
            2 => (0..4usize).prop_map(Op::Release),
            1 => (0..4usize).prop_map(Op::ForceRelease),
            1 => (0..4usize).prop_map(Op::Withdraw),
            1 => Just(Op::Expire),
        ]
    }

    /// Straightforward reference model: holder plus a plain FIFO vector.
    #[derive(Default)]
    struct Model {
        holder: Option<usize>,
        queue: Vec<usize>,
    }

    impl Model {
        fn promote(&mut self) {
            self.holder = if self.queue.is_empty() {
                None
            } else {
                Some(self.queue.remove(0))
            };
        }

        fn apply(&mut self, op: &Op) {
            match *op {
                Op::Request(i) => {
                    if self.holder == Some(i) {
                        return;
                    }
                    if !self.queue.contains(&i) {
                        self.queue.push(i);
                    }
                    if self.holder.is_none() {
                        self.promote();
                    }
                }
                Op::Release(i) | Op::ForceRelease(i) if self.holder == Some(i) => self.promote(),
                Op::ForceRelease(i) | Op::Withdraw(i) => self.queue.retain(|q| *q != i),
                Op::Release(_) => {}
                Op::Expire => {
                    if self.holder.is_some() {
                        self.promote();
                    }
                }
            }
        }
    }

    proptest! {
        #[test]
        fn manager_matches_fifo_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let mut h = Harness::new();
            let pool: [ParticipantId; 4] = ids();
            let mut model = Model::default();
            let max_hold = Duration::from_secs(10);

            for op in &ops {
                match *op {
                    Op::Request(i) => { h.manager.request(pool[i]); }
                    Op::Release(i) => { let _ = h.manager.release(pool[i]); }
                    Op::ForceRelease(i) => { h.manager.force_release(pool[i]); }
                    Op::Withdraw(i) => { let _ = h.manager.withdraw(pool[i]); }
                    Op::Expire => {
                        h.clock.advance(max_hold + Duration::from_secs(1));
                        h.manager.expire_if_stale(h.clock.now(), max_hold);
                    }
                }
                model.apply(op);

                prop_assert_eq!(h.manager.holder(), model.holder.map(|i| pool[i]));
                let expected: Vec<_> = model.queue.iter().map(|i| pool[*i]).collect();
                prop_assert_eq!(h.queued(), expected);
                if let Some(holder) = h.manager.holder() {
                    prop_assert!(!h.manager.queue().contains(&holder));
                }
            }
        }

        #[test]
        fn waiters_are_granted_in_arrival_order(n in 2usize..12) {
            let mut h = Harness::new();
            let pool: Vec<ParticipantId> = (0..n).map(|_| ParticipantId::new()).collect();
            for p in &pool {
                h.manager.request(*p);
            }

            let mut granted = vec![h.manager.holder().unwrap()];
            while let Some(holder) = h.manager.holder() {
                if let Some(next) = h.manager.release(holder).unwrap().next_holder {
                    granted.push(next);
                }
            }
            prop_assert_eq!(granted, pool);
        }
    }
}
