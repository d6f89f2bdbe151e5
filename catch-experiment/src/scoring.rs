use catch_core::Feedback;
use serde::{Deserialize, Serialize};

/// Median-relative scoring rules and the stimulus display window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub on_time_bonus: i32,
    pub late_bonus: i32,
    pub early_penalty: u32,
    /// Seconds past the running median still counted as on time.
    pub on_time_margin: f64,
    /// Hard cap on how long the stimulus stays visible, seconds.
    pub max_stimulus_secs: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            on_time_bonus: 3,
            late_bonus: 1,
            early_penalty: 2,
            on_time_margin: 0.1,
            max_stimulus_secs: 1.5,
        }
    }
}

impl ScoringPolicy {
    /// Without a median the response can't be placed relative to it and
    /// scores as late.
    pub fn score_response(&self, rt: f64, median_rt: f64, has_median: bool) -> (i32, Feedback) {
        if has_median && rt < median_rt + self.on_time_margin {
            (self.on_time_bonus, Feedback::CaughtOnTime)
        } else {
            (self.late_bonus, Feedback::CaughtLate)
        }
    }

    /// Score after an early press. Never drops below zero.
    pub fn score_early_press(&self, current_score: u32) -> u32 {
        current_score.saturating_sub(self.early_penalty)
    }

    pub fn apply(&self, current_score: u32, delta: i32) -> u32 {
        current_score.saturating_add_signed(delta)
    }

    /// Whether a visible stimulus should be hidden `elapsed` seconds after onset.
    pub fn should_hide(&self, elapsed: f64, median_rt: Option<f64>) -> bool {
        median_rt.is_some_and(|m| elapsed > m + self.on_time_margin)
            || elapsed > self.max_stimulus_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_response_is_on_time() {
        let policy = ScoringPolicy::default();
        assert_eq!(
            policy.score_response(0.35, 0.30, true),
            (3, Feedback::CaughtOnTime)
        );
    }

    #[test]
    fn slow_response_is_late() {
        let policy = ScoringPolicy::default();
        assert_eq!(
            policy.score_response(0.50, 0.30, true),
            (1, Feedback::CaughtLate)
        );
    }

    #[test]
    fn no_median_scores_late() {
        let policy = ScoringPolicy::default();
        assert_eq!(
            policy.score_response(0.05, 0.0, false),
            (1, Feedback::CaughtLate)
        );
    }

    #[test]
    fn early_press_floors_at_zero() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.score_early_press(1), 0);
        assert_eq!(policy.score_early_press(5), 3);
        assert_eq!(policy.score_early_press(0), 0);
    }

    #[test]
    fn hide_without_samples_waits_for_cap() {
        let policy = ScoringPolicy::default();
        assert!(!policy.should_hide(1.0, None));
        assert!(!policy.should_hide(1.5, None));
        assert!(policy.should_hide(1.5001, None));
    }

    #[test]
    fn hide_after_median_margin() {
        let policy = ScoringPolicy::default();
        assert!(!policy.should_hide(0.39, Some(0.30)));
        assert!(policy.should_hide(0.41, Some(0.30)));
    }

    #[test]
    fn apply_saturates() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.apply(4, 3), 7);
        assert_eq!(policy.apply(0, -1), 0);
    }
}
