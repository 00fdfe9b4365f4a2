//! Customer spawn pacing: the per-day interval ramp and daily schedules.
//!
//! The interval ramps linearly from a start value down to a floor as days
//! pass, but the effective interval is clamped from below by
//! `phase_duration / max_spawns_per_day` so late-game spawn rates can never
//! exceed the hard daily cap regardless of the ramp.

use crate::constants::customers::{
    MAX_SPAWNED_PER_DAY, SPAWN_INTERVAL_MIN, SPAWN_INTERVAL_START, SPAWN_RAMP_DAYS,
};

/// Ramped spawn interval for `day` (seconds), before the daily-cap clamp.
pub fn customer_spawn_interval(day: u32) -> f64 {
    let progress = (day.saturating_sub(1) as f64 / SPAWN_RAMP_DAYS as f64).min(1.0);
    SPAWN_INTERVAL_START - (SPAWN_INTERVAL_START - SPAWN_INTERVAL_MIN) * progress
}

/// Interval actually used when scheduling: the larger of the ramp interval
/// and the interval implied by the hard per-day spawn cap.
pub fn effective_spawn_interval(day: u32, phase_duration: f64) -> f64 {
    let cap_interval = phase_duration / MAX_SPAWNED_PER_DAY as f64;
    customer_spawn_interval(day).max(cap_interval)
}

/// Spawn offsets (seconds from day-phase start) for one day, capped at the
/// hard daily maximum and never past the end of the phase.
pub fn build_spawn_schedule(day: u32, phase_duration: f64) -> Vec<f64> {
    let interval = effective_spawn_interval(day, phase_duration);
    let mut offsets = Vec::new();
    for i in 0..MAX_SPAWNED_PER_DAY {
        let offset = i as f64 * interval;
        if offset >= phase_duration {
            break;
        }
        offsets.push(offset);
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::phase::DAY_DURATION_SECONDS;

    #[test]
    fn ramp_endpoints() {
        assert_eq!(customer_spawn_interval(1), SPAWN_INTERVAL_START);
        assert_eq!(customer_spawn_interval(1 + SPAWN_RAMP_DAYS), SPAWN_INTERVAL_MIN);
        assert_eq!(customer_spawn_interval(1 + 2 * SPAWN_RAMP_DAYS), SPAWN_INTERVAL_MIN);
    }

    #[test]
    fn ramp_non_increasing_and_bounded() {
        let mut prev = customer_spawn_interval(1);
        for day in 2..=(1 + 2 * SPAWN_RAMP_DAYS) {
            let interval = customer_spawn_interval(day);
            assert!(interval <= prev, "day {day}");
            assert!(interval >= SPAWN_INTERVAL_MIN && interval <= SPAWN_INTERVAL_START);
            prev = interval;
        }
    }

    #[test]
    fn effective_interval_respects_daily_cap() {
        let effective = effective_spawn_interval(100, DAY_DURATION_SECONDS);
        assert!(effective >= DAY_DURATION_SECONDS / MAX_SPAWNED_PER_DAY as f64);
        assert!(effective >= customer_spawn_interval(100));
    }

    #[test]
    fn short_phase_clamps_harder() {
        // A 10-second phase cannot host more than a couple of spawns even on
        // day 1.
        let schedule = build_spawn_schedule(1, 10.0);
        assert!(schedule.len() <= 2);
    }

    #[test]
    fn schedule_within_phase_and_cap() {
        let schedule = build_spawn_schedule(30, DAY_DURATION_SECONDS);
        assert!(!schedule.is_empty());
        assert!(schedule.len() <= MAX_SPAWNED_PER_DAY);
        for pair in schedule.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert!(*schedule.last().unwrap() < DAY_DURATION_SECONDS);
    }

    #[test]
    fn schedule_starts_at_phase_start() {
        let schedule = build_spawn_schedule(1, DAY_DURATION_SECONDS);
        assert_eq!(schedule[0], 0.0);
    }
}
