use crate::error::PrematureQueryError;

/// Reaction times observed so far, kept sorted on insert.
#[derive(Debug, Clone, Default)]
pub struct RunningMedianTracker {
    sorted: Vec<f64>,
}

impl RunningMedianTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rt: f64) {
        let idx = self.sorted.partition_point(|x| x.total_cmp(&rt).is_le());
        self.sorted.insert(idx, rt);
    }

    pub fn has_samples(&self) -> bool {
        !self.sorted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Odd count: the middle sample. Even count: mean of the samples at
    /// `count / 2` and `count / 2 - 1`.
    pub fn current_median(&self) -> Result<f64, PrematureQueryError> {
        let size = self.sorted.len();
        if size == 0 {
            return Err(PrematureQueryError);
        }
        let mid = size / 2;
        let mid_value = self.sorted[mid];
        Ok(if size % 2 != 0 {
            mid_value
        } else {
            (mid_value + self.sorted[mid - 1]) / 2.0
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.sorted
    }
}
