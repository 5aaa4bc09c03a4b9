//! Capacity controller decision math.
//!
//! Pure functions only: the window bookkeeping (sampling, the
//! first-writer-wins `locked` gate, reinitialization) lives with the
//! ring core, which calls [`decide`] once per closed monitoring window.
//! Keeping the math free of store access makes the asymmetric-slew
//! behavior unit-testable against exact numbers.

use crate::config::RingConfig;

/// Outcome of evaluating one closed monitoring window.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Decision {
    /// Observed mean residency over the window, minutes.
    pub avg_eject_mins: f64,
    /// Target capacity, clamped by slew and bounds. `None` when the
    /// observed mean stayed inside the deadband.
    pub new_size: Option<u64>,
}

/// Evaluates a closed window: `items_in_period` new-id inserts were
/// observed while capacity was `current_size`.
///
/// Returns `None` for a window with zero samples (nothing to conclude;
/// the next window will try again).
pub(crate) fn decide(
    current_size: u64,
    items_in_period: u64,
    config: &RingConfig,
) -> Option<Decision> {
    if items_in_period == 0 {
        return None;
    }

    let current = current_size as f64;
    let count = items_in_period as f64;

    // Mean time a record survives in the ring at the observed fill rate.
    let avg_eject_mins = (current / count) * config.monitor_period_mins;

    let deviation_pct = (1.0 - avg_eject_mins / config.desired_eject_mins).abs() * 100.0;
    if deviation_pct <= config.trigger_adjust_percent {
        return Some(Decision {
            avg_eject_mins,
            new_size: None,
        });
    }

    // Capacity that would hold records for exactly the target residency.
    let desired_size = (count / config.monitor_period_mins) * config.desired_eject_mins;
    let diff_pct = (desired_size - current) / current;
    let slew = if diff_pct >= 0.0 {
        config.max_adjust_percent_up
    } else {
        config.max_adjust_percent_down
    };

    let new_size = if diff_pct.abs() * 100.0 > slew {
        let step = (current * slew / 100.0).floor();
        if diff_pct >= 0.0 {
            current + step
        } else {
            current - step
        }
    } else {
        desired_size.floor()
    };

    let clamped = (new_size as u64)
        .max(config.auto_min_size)
        .min(config.auto_max_size);

    Some(Decision {
        avg_eject_mins,
        new_size: Some(clamped),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn config() -> RingConfig {
        // desired 15m, window 10m, deadband 20%, slew +25/-10, bounds wide open
        RingConfig::new(vec![FieldSpec::new("a")])
            .with_auto_bounds(1, u64::MAX)
    }

    #[test]
    fn zero_samples_skips_evaluation() {
        assert_eq!(decide(1_000, 0, &config()), None);
    }

    #[test]
    fn up_adjust_clamped_by_slew() {
        // 2000 inserts over a 10m window at size 1000: mean residency 5m,
        // 66% off target, desired size 3000, +200% clamped to +25%.
        let decision = decide(1_000, 2_000, &config()).unwrap();
        assert_eq!(decision.avg_eject_mins, 5.0);
        assert_eq!(decision.new_size, Some(1_250));
    }

    #[test]
    fn down_adjust_clamped_by_slew() {
        // 100 inserts over 10m at size 10_000: mean residency 1000m,
        // desired size 150, shrink clamped to -10%.
        let decision = decide(10_000, 100, &config()).unwrap();
        assert_eq!(decision.avg_eject_mins, 1_000.0);
        assert_eq!(decision.new_size, Some(9_000));
    }

    #[test]
    fn inside_deadband_keeps_size() {
        // Size 1500, 1000 inserts over 10m: mean residency 15m, dead on
        // target.
        let decision = decide(1_500, 1_000, &config()).unwrap();
        assert_eq!(decision.avg_eject_mins, 15.0);
        assert_eq!(decision.new_size, None);

        // 13m observed vs 15m target is a 13.3% deviation, under the 20%
        // trigger.
        let decision = decide(1_300, 1_000, &config()).unwrap();
        assert_eq!(decision.new_size, None);
    }

    #[test]
    fn small_diff_uses_desired_size_directly() {
        // Size 1000, 550 inserts over 10m: residency ~18.2m (21% off, past
        // the trigger); desired size 825, -17.5%... exceeds the 10% down
        // slew, so clamp applies.
        let decision = decide(1_000, 550, &config()).unwrap();
        assert_eq!(decision.new_size, Some(900));

        // With a generous down slew the desired size is taken as-is.
        let cfg = config().with_max_adjust_percent(25.0, 50.0);
        let decision = decide(1_000, 550, &cfg).unwrap();
        assert_eq!(decision.new_size, Some(825));
    }

    #[test]
    fn bounds_clamp_the_result() {
        let cfg = config().with_auto_bounds(1_200, 1_220);
        let decision = decide(1_000, 2_000, &cfg).unwrap();
        assert_eq!(decision.new_size, Some(1_220));

        let cfg = config().with_auto_bounds(9_500, 20_000);
        let decision = decide(10_000, 100, &cfg).unwrap();
        assert_eq!(decision.new_size, Some(9_500));
    }
}
