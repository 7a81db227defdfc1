use std::time::Duration;

use crate::view_model::HarvestView;

/// 1-based index of an item in the feed's rendering order.
pub type Position = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Positioning,
    Probing,
    ScrollBackoff,
    LoadBackoff,
    Emitting,
    Exhausted,
}

/// Thresholds and waits of the nested scroll/load retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive scroll cycles without progress before the feed counts as exhausted.
    pub max_scroll_failures: u32,
    /// Re-probes inside one scroll cycle before that cycle is given up.
    pub max_load_failures: u32,
    /// Wait after each scroll-to-bottom so lazy rendering can catch up.
    pub settle: Duration,
    /// Wait between re-probes inside a scroll cycle.
    pub load_retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_scroll_failures: 10,
            max_load_failures: 10,
            settle: Duration::from_millis(1200),
            load_retry_interval: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Same thresholds, zero waits. Used for recorded replays and tests.
    pub fn without_waits(self) -> Self {
        Self {
            settle: Duration::ZERO,
            load_retry_interval: Duration::ZERO,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestState {
    pub(crate) policy: RetryPolicy,
    pub(crate) phase: Phase,
    pub(crate) position: Position,
    pub(crate) scroll_failures: u32,
    pub(crate) load_failures: u32,
    pub(crate) emitted: u64,
    pub(crate) scroll_cycles: u64,
}

impl Default for HarvestState {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl HarvestState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            phase: Phase::Positioning,
            position: 1,
            scroll_failures: 0,
            load_failures: 0,
            emitted: 0,
            scroll_cycles: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn scroll_failures(&self) -> u32 {
        self.scroll_failures
    }

    pub fn load_failures(&self) -> u32 {
        self.load_failures
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase == Phase::Exhausted
    }

    pub fn view(&self) -> HarvestView {
        HarvestView {
            phase: self.phase,
            position: self.position,
            emitted: self.emitted,
            scroll_cycles: self.scroll_cycles,
            scroll_failures: self.scroll_failures,
            load_failures: self.load_failures,
        }
    }

    pub(crate) fn restart(&mut self) {
        *self = Self::new(self.policy);
    }

    pub(crate) fn record_emission(&mut self) {
        self.emitted += 1;
        self.scroll_failures = 0;
        self.load_failures = 0;
        self.position += 1;
    }

    pub(crate) fn begin_scroll_cycle(&mut self) {
        self.phase = Phase::ScrollBackoff;
        self.scroll_failures += 1;
        self.scroll_cycles += 1;
        self.load_failures = 0;
    }

    /// The load retries for the current position ran out; move past it.
    pub(crate) fn abandon_position(&mut self) {
        self.load_failures = 0;
        self.position += 1;
    }
}
