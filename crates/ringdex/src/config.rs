//! Cache construction parameters.

use crate::schema::FieldSpec;

/// Configuration for an [`IndexedRing`](crate::IndexedRing).
///
/// `params` is the only required piece; everything else defaults to the
/// values below. The eviction sink, fan-out transport, and clock are
/// runtime handles and are supplied through
/// [`IndexedRing::builder`](crate::IndexedRing::builder) instead.
#[derive(Debug, Clone)]
pub struct RingConfig {
    /// Ordered schema parameter list.
    pub params: Vec<FieldSpec>,

    /// Starting ring capacity.
    ///
    /// Default: 1,000,000
    pub initial_size: u64,

    /// Enables the capacity controller.
    ///
    /// Default: false
    pub auto_resize: bool,

    /// Target mean residency of a record, in minutes.
    ///
    /// Default: 15
    pub desired_eject_mins: f64,

    /// Absolute lower bound for auto-resize.
    ///
    /// Default: 10,000
    pub auto_min_size: u64,

    /// Absolute upper bound for auto-resize.
    ///
    /// Default: 10,000,000
    pub auto_max_size: u64,

    /// Length of the controller's monitoring window, in minutes.
    ///
    /// Default: 10
    pub monitor_period_mins: f64,

    /// Deadband around the residency target, in percent. No resize fires
    /// while the observed mean stays within this band.
    ///
    /// Default: 20
    pub trigger_adjust_percent: f64,

    /// Slew cap for growing, in percent of current capacity per decision.
    ///
    /// Default: 25
    pub max_adjust_percent_up: f64,

    /// Slew cap for shrinking, in percent of current capacity per
    /// decision.
    ///
    /// Default: 10
    pub max_adjust_percent_down: f64,

    /// Batch size for the parallel eject transport during drains and
    /// shrinks.
    ///
    /// Default: 100
    pub drain_parallel_items: usize,
}

impl RingConfig {
    /// Configuration with the given schema and default tuning.
    pub fn new(params: Vec<FieldSpec>) -> Self {
        Self {
            params,
            initial_size: 1_000_000,
            auto_resize: false,
            desired_eject_mins: 15.0,
            auto_min_size: 10_000,
            auto_max_size: 10_000_000,
            monitor_period_mins: 10.0,
            trigger_adjust_percent: 20.0,
            max_adjust_percent_up: 25.0,
            max_adjust_percent_down: 10.0,
            drain_parallel_items: 100,
        }
    }

    /// Sets the starting capacity.
    pub fn with_initial_size(mut self, size: u64) -> Self {
        self.initial_size = size;
        self
    }

    /// Enables or disables the capacity controller.
    pub fn with_auto_resize(mut self, enabled: bool) -> Self {
        self.auto_resize = enabled;
        self
    }

    /// Sets the target mean residency in minutes.
    pub fn with_desired_eject_mins(mut self, mins: f64) -> Self {
        self.desired_eject_mins = mins;
        self
    }

    /// Sets the absolute capacity bounds for auto-resize.
    pub fn with_auto_bounds(mut self, min: u64, max: u64) -> Self {
        self.auto_min_size = min;
        self.auto_max_size = max;
        self
    }

    /// Sets the monitoring window length in minutes.
    pub fn with_monitor_period_mins(mut self, mins: f64) -> Self {
        self.monitor_period_mins = mins;
        self
    }

    /// Sets the deadband around the residency target, in percent.
    pub fn with_trigger_adjust_percent(mut self, pct: f64) -> Self {
        self.trigger_adjust_percent = pct;
        self
    }

    /// Sets the asymmetric slew caps (grow, shrink) in percent.
    pub fn with_max_adjust_percent(mut self, up: f64, down: f64) -> Self {
        self.max_adjust_percent_up = up;
        self.max_adjust_percent_down = down;
        self
    }

    /// Sets the parallel-eject batch size.
    pub fn with_drain_parallel_items(mut self, items: usize) -> Self {
        self.drain_parallel_items = items;
        self
    }
}
