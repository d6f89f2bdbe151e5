use catch_core::{Feedback, Phase};

/// Mutable per-session state advanced by the trial state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub trial_n: usize,
    pub score: u32,
    /// Early presses in the current trial's wait phase only.
    pub early_presses: u32,
    pub phase: Phase,
    /// ISI assigned to the current trial, seconds.
    pub isi: f64,
    pub stimulus_visible: bool,
    /// Most recent feedback, cleared when the next stimulus appears.
    pub feedback: Option<Feedback>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            trial_n: 0,
            score: 0,
            early_presses: 0,
            phase: Phase::Waiting,
            isi: 0.0,
            stimulus_visible: false,
            feedback: None,
        }
    }
}

impl SessionState {
    /// Resets the per-trial fields for trial `trial_n` with wait time `isi`.
    pub fn begin_trial(&mut self, trial_n: usize, isi: f64) {
        self.trial_n = trial_n;
        self.isi = isi;
        self.early_presses = 0;
        self.phase = Phase::Waiting;
        self.stimulus_visible = false;
    }

    pub fn show_stimulus(&mut self) {
        self.feedback = None;
        self.stimulus_visible = true;
        self.phase = Phase::RespondingWindow;
    }
}
