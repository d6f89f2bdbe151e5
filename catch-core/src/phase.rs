/// Phases of a single trial, plus the terminal session state.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// Stimulus hidden, ISI counting down. Presses here are early.
    #[default]
    Waiting,
    /// Stimulus shown (or auto-hidden), waiting for the single accepted press.
    RespondingWindow,
    SessionComplete,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionComplete)
    }

    /// Phase that follows a completed trial.
    pub fn after_trial(last_trial: bool) -> Self {
        if last_trial {
            Self::SessionComplete
        } else {
            Self::Waiting
        }
    }
}
