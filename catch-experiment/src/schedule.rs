use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::validate_isi;
use crate::error::ConfigurationError;

/// Decimal places ISI values are rounded to.
pub const ISI_DECIMALS: i32 = 1;

/// Upper bound on values in one schedule (block length times repeats).
pub const MAX_SCHEDULE_LEN: usize = 100_000;

/// Round `value` to `dp` decimal places, half away from zero.
pub fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// Shuffled wait times for a whole session, indexed by trial number.
#[derive(Debug, Clone, PartialEq)]
pub struct IsiSchedule {
    values: Vec<f64>,
}

impl IsiSchedule {
    /// Schedule with values in the given order. No validation or shuffling.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn get(&self, trial_n: usize) -> Option<f64> {
        self.values.get(trial_n).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn is_last(&self, trial_n: usize) -> bool {
        trial_n + 1 >= self.values.len()
    }
}

pub struct IsiScheduler;

impl IsiScheduler {
    /// Number of distinct ISI values in `[low, high]` at `step`.
    ///
    /// The ceiling absorbs floating-point error in the division, e.g.
    /// `(3.5 - 0.2) / 0.1` evaluating just under 33. Saturates at
    /// `usize::MAX` for degenerate ranges.
    pub fn block_len(low: f64, high: f64, step: f64) -> usize {
        let count = ((high - low) / step + 1.0).ceil();
        if count >= usize::MAX as f64 {
            usize::MAX
        } else {
            count as usize
        }
    }

    /// Total schedule length, or `None` if it does not fit in `usize`.
    pub fn schedule_len(low: f64, high: f64, step: f64, repeats: usize) -> Option<usize> {
        Self::block_len(low, high, step).checked_mul(repeats)
    }

    /// Builds `repeats` copies of the progression `low, low + step, ..`
    /// rounded to one decimal, then Fisher-Yates shuffles them.
    pub fn generate(
        low: f64,
        high: f64,
        step: f64,
        repeats: usize,
        seed: Option<u64>,
    ) -> Result<IsiSchedule, ConfigurationError> {
        validate_isi(low, high, step, repeats)?;

        let n = Self::block_len(low, high, step);
        let block: Vec<f64> = (0..n)
            .map(|i| round_to(low + i as f64 * step, ISI_DECIMALS))
            .collect();

        // Bounded by MAX_SCHEDULE_LEN after validation.
        let mut values = Vec::with_capacity(n * repeats);
        for _ in 0..repeats {
            values.extend_from_slice(&block);
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        shuffle(&mut values, &mut rng);

        log::debug!(
            "Generated ISI schedule: {} values ({} x {} repeats)",
            values.len(),
            n,
            repeats
        );
        Ok(IsiSchedule { values })
    }
}

/// In-place Fisher-Yates: walk from the last index down to 1, swapping each
/// slot with a uniformly chosen index in `[0, k]`.
pub fn shuffle<T, R: Rng>(values: &mut [T], rng: &mut R) {
    for k in (1..values.len()).rev() {
        let j = rng.random_range(0..=k);
        values.swap(k, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut v = values.to_vec();
        v.sort_by(|a, b| a.total_cmp(b));
        v
    }

    #[test]
    fn default_range_has_34_values_per_block() {
        assert_eq!(IsiScheduler::block_len(0.2, 3.5, 0.1), 34);
        let schedule = IsiScheduler::generate(0.2, 3.5, 0.1, 3, Some(7)).unwrap();
        assert_eq!(schedule.len(), 102);
    }

    #[test]
    fn values_are_rounded_to_one_decimal() {
        let schedule = IsiScheduler::generate(0.2, 1.0, 0.1, 1, Some(1)).unwrap();
        assert_eq!(
            sorted(schedule.as_slice()),
            vec![0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]
        );
    }

    #[test]
    fn single_value_schedule() {
        let schedule = IsiScheduler::generate(0.2, 0.2, 0.1, 1, None).unwrap();
        assert_eq!(schedule.as_slice(), &[0.2]);
        assert!(schedule.is_last(0));
    }

    #[test]
    fn same_seed_same_order() {
        let a = IsiScheduler::generate(0.5, 2.0, 0.1, 2, Some(42)).unwrap();
        let b = IsiScheduler::generate(0.5, 2.0, 0.1, 2, Some(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            IsiScheduler::generate(1.0, 0.5, 0.1, 1, None),
            Err(ConfigurationError::InvalidRange { .. })
        ));
        assert_eq!(
            IsiScheduler::generate(0.5, 1.0, -0.1, 1, None),
            Err(ConfigurationError::NonPositiveStep(-0.1))
        );
    }

    #[test]
    fn oversized_schedule_is_an_error_not_an_allocation() {
        assert_eq!(IsiScheduler::block_len(0.1, 1e300, 1e-300), usize::MAX);
        assert_eq!(IsiScheduler::schedule_len(0.1, 1e300, 1e-300, 2), None);
        assert_eq!(
            IsiScheduler::generate(0.1, 1e300, 1e-300, 2, Some(1)),
            Err(ConfigurationError::ScheduleTooLarge {
                len: usize::MAX,
                max: MAX_SCHEDULE_LEN,
            })
        );
        assert!(matches!(
            IsiScheduler::generate(0.1, 1000.0, 0.001, 1, Some(1)),
            Err(ConfigurationError::ScheduleTooLarge { .. })
        ));
    }

    #[test]
    fn shuffle_keeps_elements() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut v: Vec<u32> = (0..50).collect();
        shuffle(&mut v, &mut rng);
        let mut back = v.clone();
        back.sort();
        assert_eq!(back, (0..50).collect::<Vec<_>>());
        let mut empty: Vec<u32> = Vec::new();
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());
    }

    #[test]
    fn round_to_handles_float_noise() {
        assert_eq!(round_to(0.2 + 3.0 * 0.1, 1), 0.5);
        assert_eq!(round_to(0.30000000000000004, 1), 0.3);
        assert_eq!(round_to(0.123456789, 7), 0.1234568);
    }
}
