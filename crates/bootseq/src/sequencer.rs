use std::time::Instant;

use bootconfig::BootTimings;
use scheduler::{Timeline, TimerId};
use tracing::{debug, info, warn};

use crate::latch::ReadinessJoin;
use crate::stage::BootStage;

/// Notifications produced while the sequence advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootEvent {
    StageEntered(BootStage),
    /// The watchdog fired before the join opened. Followed by `Completed`.
    /// Never emitted once `Finalizing` has been entered.
    TimedOut,
    Completed,
}

/// Observable snapshot of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootState {
    pub stage: BootStage,
    pub progress: u8,
    pub label: &'static str,
    pub renderer_ready: bool,
    pub progress_gate: bool,
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootTimer {
    Advance(BootStage),
    Settle,
    Watchdog,
}

/// Drives the boot stages from progress timers and the renderer's ready
/// signal.
///
/// Nothing runs on its own: the host calls [`BootSequencer::advance`] when
/// [`BootSequencer::next_deadline`] passes and forwards the renderer's ready
/// report through [`BootSequencer::mark_renderer_ready`]. Every pending
/// timer lives in the sequencer's own timeline, so [`BootSequencer::teardown`]
/// or dropping the sequencer guarantees nothing fires afterwards.
#[derive(Debug)]
pub struct BootSequencer {
    timings: BootTimings,
    stage: BootStage,
    join: ReadinessJoin,
    timeline: Timeline<BootTimer>,
    watchdog: Option<TimerId>,
    started: bool,
    torn_down: bool,
}

impl BootSequencer {
    pub fn new(timings: BootTimings) -> Self {
        Self {
            timings,
            stage: BootStage::Init,
            join: ReadinessJoin::default(),
            timeline: Timeline::new(),
            watchdog: None,
            started: false,
            torn_down: false,
        }
    }

    pub fn timings(&self) -> &BootTimings {
        &self.timings
    }

    pub fn state(&self) -> BootState {
        BootState {
            stage: self.stage,
            progress: self.stage.progress(),
            label: self.stage.label(),
            renderer_ready: self.join.renderer_ready(),
            progress_gate: self.join.progress_gate(),
            complete: self.is_complete(),
        }
    }

    pub fn stage(&self) -> BootStage {
        self.stage
    }

    pub fn is_complete(&self) -> bool {
        self.stage == BootStage::Complete
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Enters the first timed stage and arms the progress chain and the
    /// watchdog. Later calls do nothing.
    pub fn start(&mut self, now: Instant) -> Vec<BootEvent> {
        let mut events = Vec::new();
        if self.started || self.torn_down {
            return events;
        }
        self.started = true;
        self.enter(BootStage::DetectingCapabilities, &mut events);
        self.schedule_next_timed(now);
        self.watchdog = Some(self.timeline.schedule_after(
            now,
            self.timings.max_wait,
            BootTimer::Watchdog,
        ));
        debug!(
            stage_interval = ?self.timings.stage_interval,
            max_wait = ?self.timings.max_wait,
            "boot sequence started"
        );
        // The renderer may already have reported ready.
        self.recompute_join(now, &mut events);
        events
    }

    /// Latches the renderer-ready precondition and re-evaluates the join.
    pub fn mark_renderer_ready(&mut self, now: Instant) -> Vec<BootEvent> {
        let mut events = Vec::new();
        if self.torn_down {
            return events;
        }
        if self.join.mark_renderer_ready() {
            debug!(stage = ?self.stage, "renderer ready latched");
            self.recompute_join(now, &mut events);
        }
        events
    }

    /// Fires every timer due at `now`, in deadline order.
    pub fn advance(&mut self, now: Instant) -> Vec<BootEvent> {
        let mut events = Vec::new();
        while let Some((_, timer)) = self.timeline.pop_due(now) {
            match timer {
                BootTimer::Advance(stage) => {
                    self.enter(stage, &mut events);
                    if stage == BootStage::AwaitingBackground && self.join.mark_progress_gate() {
                        debug!("progress gate latched");
                        self.recompute_join(now, &mut events);
                    } else {
                        self.schedule_next_timed(now);
                    }
                }
                BootTimer::Settle => self.complete(&mut events),
                BootTimer::Watchdog => {
                    self.watchdog = None;
                    if self.stage == BootStage::Finalizing {
                        debug!("watchdog elapsed during settle; letting it finish");
                    } else if !self.is_complete() {
                        warn!(
                            stage = ?self.stage,
                            renderer_ready = self.join.renderer_ready(),
                            max_wait = ?self.timings.max_wait,
                            "boot did not finish in time; forcing completion"
                        );
                        self.timeline.cancel_all();
                        events.push(BootEvent::TimedOut);
                        self.complete(&mut events);
                    }
                }
            }
        }
        events
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timeline.next_deadline()
    }

    /// Invalidates every pending timer. Subsequent calls are no-ops.
    pub fn teardown(&mut self) {
        let cancelled = self.timeline.cancel_all();
        self.watchdog = None;
        if !self.torn_down {
            debug!(cancelled, stage = ?self.stage, "boot sequence torn down");
        }
        self.torn_down = true;
    }

    fn schedule_next_timed(&mut self, now: Instant) {
        if let Some(next) = self.stage.next().filter(|stage| stage.is_timed()) {
            self.timeline
                .schedule_after(now, self.timings.stage_interval, BootTimer::Advance(next));
        }
    }

    fn recompute_join(&mut self, now: Instant, events: &mut Vec<BootEvent>) {
        if self.join.is_open() && self.stage == BootStage::AwaitingBackground {
            self.enter(BootStage::Finalizing, events);
            self.timeline
                .schedule_after(now, self.timings.settle_delay, BootTimer::Settle);
        }
    }

    fn complete(&mut self, events: &mut Vec<BootEvent>) {
        if self.is_complete() {
            return;
        }
        if let Some(watchdog) = self.watchdog.take() {
            self.timeline.cancel(watchdog);
        }
        self.enter(BootStage::Complete, events);
        events.push(BootEvent::Completed);
    }

    fn enter(&mut self, stage: BootStage, events: &mut Vec<BootEvent>) {
        if stage <= self.stage {
            debug!(current = ?self.stage, requested = ?stage, "ignoring backward stage transition");
            return;
        }
        self.stage = stage;
        info!(progress = stage.progress(), status = stage.label(), "boot stage");
        events.push(BootEvent::StageEntered(stage));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn timings() -> BootTimings {
        BootTimings {
            stage_interval: Duration::from_millis(500),
            settle_delay: Duration::from_millis(800),
            selector_delay: Duration::from_millis(300),
            max_wait: Duration::from_secs(10),
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn start_enters_detecting_capabilities_immediately() {
        let t0 = Instant::now();
        let mut seq = BootSequencer::new(timings());
        assert_eq!(seq.state().progress, 0);
        assert_eq!(seq.state().label, "Initializing");

        let events = seq.start(t0);
        assert_eq!(
            events,
            vec![BootEvent::StageEntered(BootStage::DetectingCapabilities)]
        );
        assert_eq!(seq.state().progress, 20);
        assert_eq!(seq.next_deadline(), Some(t0 + ms(500)));
        assert!(seq.start(t0).is_empty());
    }

    #[test]
    fn timers_walk_the_progress_chain() {
        let t0 = Instant::now();
        let mut seq = BootSequencer::new(timings());
        seq.start(t0);

        assert!(seq.advance(t0 + ms(499)).is_empty());
        assert_eq!(
            seq.advance(t0 + ms(500)),
            vec![BootEvent::StageEntered(BootStage::LoadingExperience)]
        );
        assert_eq!(
            seq.advance(t0 + ms(1000)),
            vec![BootEvent::StageEntered(BootStage::PreparingInterface)]
        );
        assert_eq!(
            seq.advance(t0 + ms(1500)),
            vec![BootEvent::StageEntered(BootStage::AwaitingBackground)]
        );
        let state = seq.state();
        assert_eq!(state.progress, 80);
        assert!(state.progress_gate);
        assert!(!state.complete);
        // Only the watchdog remains.
        assert_eq!(seq.next_deadline(), Some(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn stalled_timers_catch_up_in_order() {
        let t0 = Instant::now();
        let mut seq = BootSequencer::new(timings());
        seq.start(t0);
        seq.mark_renderer_ready(t0);

        // A single late poll only fires timers that were already due; each
        // stage schedules its successor relative to the poll time.
        let events = seq.advance(t0 + ms(600));
        assert_eq!(
            events,
            vec![BootEvent::StageEntered(BootStage::LoadingExperience)]
        );
        assert_eq!(seq.next_deadline(), Some(t0 + ms(1100)));
    }

    #[test]
    fn watchdog_completes_without_renderer_ready() {
        let t0 = Instant::now();
        let mut seq = BootSequencer::new(timings());
        seq.start(t0);
        for step in 1..=3 {
            seq.advance(t0 + ms(500 * step));
        }
        assert!(seq.advance(t0 + ms(9_999)).is_empty());

        let events = seq.advance(t0 + Duration::from_secs(10));
        assert_eq!(
            events,
            vec![
                BootEvent::TimedOut,
                BootEvent::StageEntered(BootStage::Complete),
                BootEvent::Completed
            ]
        );
        let state = seq.state();
        assert!(state.complete);
        assert_eq!(state.progress, 100);
        assert_eq!(state.label, "Ready");
        assert!(!state.renderer_ready);
        assert_eq!(seq.next_deadline(), None);
    }

    #[test]
    fn teardown_cancels_pending_timers() {
        let t0 = Instant::now();
        let mut seq = BootSequencer::new(timings());
        seq.start(t0);
        seq.teardown();
        seq.teardown();

        assert!(seq.is_torn_down());
        assert_eq!(seq.next_deadline(), None);
        assert!(seq.advance(t0 + Duration::from_secs(60)).is_empty());
        assert!(seq.mark_renderer_ready(t0).is_empty());
        assert_eq!(seq.state().stage, BootStage::DetectingCapabilities);
    }

    #[test]
    fn ready_before_start_is_remembered() {
        let t0 = Instant::now();
        let mut seq = BootSequencer::new(timings());
        assert!(seq.mark_renderer_ready(t0).is_empty());
        seq.start(t0);
        for step in 1..=3 {
            seq.advance(t0 + ms(500 * step));
        }
        assert_eq!(seq.stage(), BootStage::Finalizing);
    }
}
