/// One-way boolean flag. Once set it stays set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latch(bool);

impl Latch {
    /// Sets the latch. Returns true only on the call that flipped it.
    pub fn set(&mut self) -> bool {
        let changed = !self.0;
        self.0 = true;
        changed
    }

    pub fn is_set(self) -> bool {
        self.0
    }
}

/// Barrier over the two boot preconditions: the renderer has drawn, and the
/// progress timers have reached the background gate. Arrival order is
/// irrelevant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessJoin {
    renderer_ready: Latch,
    progress_gate: Latch,
}

impl ReadinessJoin {
    pub fn mark_renderer_ready(&mut self) -> bool {
        self.renderer_ready.set()
    }

    pub fn mark_progress_gate(&mut self) -> bool {
        self.progress_gate.set()
    }

    pub fn renderer_ready(&self) -> bool {
        self.renderer_ready.is_set()
    }

    pub fn progress_gate(&self) -> bool {
        self.progress_gate.is_set()
    }

    pub fn is_open(&self) -> bool {
        self.renderer_ready() && self.progress_gate()
    }
}
