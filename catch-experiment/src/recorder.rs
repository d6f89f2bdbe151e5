use catch_core::TrialRecord;

/// Append-only log of completed trials, in trial order.
#[derive(Debug, Clone, Default)]
pub struct TrialRecorder {
    records: Vec<TrialRecord>,
    sealed: bool,
}

impl TrialRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. Returns false once the recorder is sealed.
    pub fn push(&mut self, record: TrialRecord) -> bool {
        if self.sealed {
            log::warn!("Dropping record for trial {}: session is closed", record.trial_n);
            return false;
        }
        self.records.push(record);
        true
    }

    /// Makes the log read-only.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
