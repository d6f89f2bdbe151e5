use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::schedule::{IsiScheduler, MAX_SCHEDULE_LEN};
use crate::scoring::ScoringPolicy;

/// Session parameters. Missing fields fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub isi_low: f64,
    pub isi_high: f64,
    pub isi_step: f64,
    /// How many times each ISI value is repeated.
    pub isi_rep: usize,
    /// Index of the last trial to run. Negative disables the limit.
    pub trial_limit: i64,
    pub stimulus_show_scale: f32,
    /// Fixed shuffle seed. `None` draws one from the OS.
    pub seed: Option<u64>,
    pub participant_name: String,
    /// Defaults to the platform string when unset.
    pub user_agent: Option<String>,
    /// Seconds after onset at which an unanswered trial is closed as missed.
    pub response_timeout: Option<f64>,
    pub scoring: ScoringPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            isi_low: 0.2,
            isi_high: 3.5,
            isi_step: 0.1,
            isi_rep: 3,
            trial_limit: -1,
            stimulus_show_scale: 1.0,
            seed: None,
            participant_name: "No Name".to_string(),
            user_agent: None,
            response_timeout: None,
            scoring: ScoringPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        validate_isi(self.isi_low, self.isi_high, self.isi_step, self.isi_rep)?;
        if !(self.stimulus_show_scale.is_finite() && self.stimulus_show_scale > 0.0) {
            return Err(ConfigurationError::InvalidStimulusScale(
                self.stimulus_show_scale as f64,
            ));
        }
        if let Some(timeout) = self.response_timeout {
            if timeout.is_nan() || timeout <= 0.0 {
                return Err(ConfigurationError::NonPositiveTimeout(timeout));
            }
        }
        Ok(())
    }

    /// True when `trial_n` is the last trial the limit allows.
    pub fn is_limit_trial(&self, trial_n: usize) -> bool {
        self.trial_limit >= 0 && trial_n as i64 == self.trial_limit
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH))
    }
}

pub(crate) fn validate_isi(
    low: f64,
    high: f64,
    step: f64,
    repeats: usize,
) -> Result<(), ConfigurationError> {
    if !(low.is_finite() && high.is_finite()) || high < low {
        return Err(ConfigurationError::InvalidRange { low, high });
    }
    if low <= 0.0 {
        return Err(ConfigurationError::NonPositiveLow(low));
    }
    if !(step > 0.0 && step.is_finite()) {
        return Err(ConfigurationError::NonPositiveStep(step));
    }
    if repeats == 0 {
        return Err(ConfigurationError::ZeroRepeats);
    }
    match IsiScheduler::schedule_len(low, high, step, repeats) {
        Some(len) if len <= MAX_SCHEDULE_LEN => Ok(()),
        len => Err(ConfigurationError::ScheduleTooLarge {
            len: len.unwrap_or(usize::MAX),
            max: MAX_SCHEDULE_LEN,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trial_limit, -1);
        assert!(!config.is_limit_trial(0));
    }

    #[test]
    fn rejects_inverted_range() {
        let config = SessionConfig {
            isi_low: 2.0,
            isi_high: 1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::InvalidRange { low: 2.0, high: 1.0 })
        );
    }

    #[test]
    fn rejects_bad_step_and_repeats() {
        let zero_step = SessionConfig {
            isi_step: 0.0,
            ..Default::default()
        };
        assert_eq!(
            zero_step.validate(),
            Err(ConfigurationError::NonPositiveStep(0.0))
        );
        let no_reps = SessionConfig {
            isi_rep: 0,
            ..Default::default()
        };
        assert_eq!(no_reps.validate(), Err(ConfigurationError::ZeroRepeats));
    }

    #[test]
    fn rejects_schedule_past_length_cap() {
        let huge = SessionConfig {
            isi_low: 0.1,
            isi_high: 1e300,
            isi_step: 1e-300,
            isi_rep: 2,
            ..Default::default()
        };
        assert_eq!(
            huge.validate(),
            Err(ConfigurationError::ScheduleTooLarge {
                len: usize::MAX,
                max: MAX_SCHEDULE_LEN,
            })
        );

        // 3 values per block: 33_334 repeats is one block over the cap.
        let many_reps = SessionConfig {
            isi_low: 0.5,
            isi_high: 1.5,
            isi_step: 0.5,
            isi_rep: 33_334,
            ..Default::default()
        };
        assert!(matches!(
            many_reps.validate(),
            Err(ConfigurationError::ScheduleTooLarge { len: 100_002, .. })
        ));
        let at_cap = SessionConfig {
            isi_rep: 33_333,
            ..many_reps
        };
        assert!(at_cap.validate().is_ok());
    }

    #[test]
    fn rejects_zero_timeout() {
        let config = SessionConfig {
            response_timeout: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::NonPositiveTimeout(_))
        ));
    }

    #[test]
    fn limit_trial_matches_index() {
        let config = SessionConfig {
            trial_limit: 2,
            ..Default::default()
        };
        assert!(config.is_limit_trial(2));
        assert!(!config.is_limit_trial(1));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"isi_rep": 1, "participant_name": "Rex"}"#).unwrap();
        assert_eq!(config.isi_rep, 1);
        assert_eq!(config.participant_name, "Rex");
        assert_eq!(config.isi_high, 3.5);
        assert_eq!(config.scoring, ScoringPolicy::default());
    }
}
