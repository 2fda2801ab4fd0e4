use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Identifies a timer scheduled on a [`Timeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Latest deadline a timer is given when its delay cannot be represented.
pub const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Single-threaded timer queue ordered by deadline.
///
/// Timers scheduled for the same instant fire in insertion order. Nothing
/// fires on its own: the owner polls [`Timeline::pop_due`] from its event
/// loop, and dropping the timeline invalidates every pending timer.
#[derive(Debug)]
pub struct Timeline<E> {
    next_id: u64,
    queue: BTreeMap<(Instant, u64), E>,
    deadlines: HashMap<u64, Instant>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Instant, event: E) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.insert((deadline, id), event);
        self.deadlines.insert(id, deadline);
        TimerId(id)
    }

    /// Schedules `event` `delay` after `now`. Delays past what `Instant` can
    /// represent are clamped to [`FAR_FUTURE`].
    pub fn schedule_after(&mut self, now: Instant, delay: Duration, event: E) -> TimerId {
        let deadline = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.schedule_at(deadline, event)
    }

    /// Removes a pending timer. Returns the event if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        let deadline = self.deadlines.remove(&id.0)?;
        self.queue.remove(&(deadline, id.0))
    }

    /// Drops every pending timer and returns how many were invalidated.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.queue.len();
        self.queue.clear();
        self.deadlines.clear();
        cancelled
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id.0)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pops the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerId, E)> {
        let key = *self.queue.keys().next()?;
        if key.0 > now {
            return None;
        }
        let event = self.queue.remove(&key)?;
        self.deadlines.remove(&key.1);
        Some((TimerId(key.1), event))
    }

    pub fn drain_due(&mut self, now: Instant) -> Vec<(TimerId, E)> {
        let mut fired = Vec::new();
        while let Some(entry) = self.pop_due(now) {
            fired.push(entry);
        }
        fired
    }
}

/// Token for a requested display refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket(u64);

/// Tracks the single outstanding frame request of a draw loop.
///
/// A loop calls [`FrameGate::request`] to schedule its next tick and
/// [`FrameGate::take`] when the refresh arrives. A refresh that arrives after
/// [`FrameGate::cancel`] finds no ticket and must not draw.
#[derive(Debug, Default)]
pub struct FrameGate {
    issued: u64,
    pending: Option<FrameTicket>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the next tick. Repeated requests before the tick coalesce.
    pub fn request(&mut self) -> FrameTicket {
        if let Some(ticket) = self.pending {
            return ticket;
        }
        self.issued += 1;
        let ticket = FrameTicket(self.issued);
        self.pending = Some(ticket);
        ticket
    }

    pub fn cancel(&mut self) -> Option<FrameTicket> {
        self.pending.take()
    }

    pub fn take(&mut self) -> Option<FrameTicket> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameTicket> {
        self.pending
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// Fixed-interval frame pacing for hosts without a display refresh signal.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: f32) -> Self {
        let fps = if target_fps.is_finite() && target_fps > 0.0 {
            target_fps
        } else {
            60.0
        };
        Self {
            interval: Duration::from_secs_f32(1.0 / fps),
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.last_frame {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.last_frame.map(|last| last + self.interval)
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_delay_is_clamped_instead_of_overflowing() {
        let start = Instant::now();
        let mut timeline = Timeline::new();
        timeline.schedule_after(start, Duration::MAX, "never");
        let deadline = timeline.next_deadline().expect("scheduled");
        assert!(deadline > start);
        assert!(timeline.pop_due(start + Duration::from_secs(3600)).is_none());
    }

    #[test]
    fn fires_in_deadline_order() {
        let start = Instant::now();
        let mut timeline = Timeline::new();
        timeline.schedule_after(start, Duration::from_millis(30), "late");
        timeline.schedule_after(start, Duration::from_millis(10), "early");
        timeline.schedule_after(start, Duration::from_millis(10), "early-second");

        assert_eq!(
            timeline.next_deadline(),
            Some(start + Duration::from_millis(10))
        );
        let fired: Vec<_> = timeline
            .drain_due(start + Duration::from_millis(20))
            .into_iter()
            .map(|(_, event)| event)
            .collect();
        assert_eq!(fired, vec!["early", "early-second"]);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn nothing_fires_before_deadline() {
        let start = Instant::now();
        let mut timeline = Timeline::new();
        timeline.schedule_after(start, Duration::from_millis(500), ());
        assert!(timeline.pop_due(start).is_none());
        assert!(timeline
            .pop_due(start + Duration::from_millis(499))
            .is_none());
        assert!(timeline
            .pop_due(start + Duration::from_millis(500))
            .is_some());
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let start = Instant::now();
        let mut timeline = Timeline::new();
        let keep = timeline.schedule_after(start, Duration::from_millis(5), 1);
        let drop = timeline.schedule_after(start, Duration::from_millis(5), 2);
        assert_eq!(timeline.cancel(drop), Some(2));
        assert_eq!(timeline.cancel(drop), None);
        assert!(timeline.is_pending(keep));

        let fired = timeline.drain_due(start + Duration::from_secs(1));
        assert_eq!(fired, vec![(keep, 1)]);
    }

    #[test]
    fn cancel_all_empties_queue() {
        let start = Instant::now();
        let mut timeline = Timeline::new();
        for step in 0..4 {
            timeline.schedule_after(start, Duration::from_millis(step * 100), step);
        }
        assert_eq!(timeline.cancel_all(), 4);
        assert!(timeline.is_empty());
        assert!(timeline.next_deadline().is_none());
        assert!(timeline.drain_due(start + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn frame_requests_coalesce_until_taken() {
        let mut gate = FrameGate::new();
        let first = gate.request();
        assert_eq!(gate.request(), first);
        assert_eq!(gate.take(), Some(first));
        assert_eq!(gate.take(), None);
        let second = gate.request();
        assert_ne!(first, second);
        assert_eq!(gate.issued(), 2);
    }

    #[test]
    fn cancelled_frame_is_not_delivered() {
        let mut gate = FrameGate::new();
        gate.request();
        assert!(gate.cancel().is_some());
        assert!(gate.pending().is_none());
        assert!(gate.take().is_none());
    }

    #[test]
    fn pacer_waits_one_interval_between_frames() {
        let mut pacer = FramePacer::new(50.0);
        let start = Instant::now();
        assert!(pacer.ready_for_frame(start));
        pacer.mark_rendered(start);
        assert!(!pacer.ready_for_frame(start + Duration::from_millis(10)));
        assert!(pacer.ready_for_frame(start + Duration::from_millis(20)));
        assert_eq!(pacer.next_deadline(), Some(start + pacer.interval()));
    }

    #[test]
    fn pacer_rejects_nonsense_rates() {
        let pacer = FramePacer::new(0.0);
        assert_eq!(pacer.interval(), Duration::from_secs_f32(1.0 / 60.0));
    }
}
