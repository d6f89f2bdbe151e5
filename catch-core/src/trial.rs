use serde::{Deserialize, Serialize};

use crate::Feedback;

/// Recorded result per completed trial. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// 0-based trial index.
    pub trial_n: usize,
    /// ISI assigned to the trial, seconds.
    pub isi: f64,
    /// Reaction time in seconds, `None` when the response window timed out.
    pub rt: Option<f64>,
    /// Local wall-clock time of the response, `YYYY-MM-DD HH:MM:SS`.
    pub datetime: String,
    /// Cumulative score after the trial.
    pub score: u32,
    pub early_presses: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    pub name: String,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Export envelope handed to collaborators on completion.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub metadata: SessionMetadata,
    pub trials: Vec<TrialRecord>,
}

impl SessionData {
    pub fn final_score(&self) -> u32 {
        self.trials.last().map_or(0, |t| t.score)
    }
}

/// Outcome of one `advance` tick.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    NoChange,
    StimulusShown,
    /// Stimulus hidden after the display window ran out. The trial is still open.
    StimulusAutoHidden,
    EarlyPenalty {
        new_score: u32,
    },
    TrialCompleted {
        record: TrialRecord,
        feedback: Feedback,
        new_score: u32,
    },
    /// Emitted exactly once, in place of `TrialCompleted` for the final trial.
    SessionComplete {
        record: TrialRecord,
        feedback: Feedback,
        new_score: u32,
        data: SessionData,
    },
}

impl SessionEvent {
    pub fn feedback(&self) -> Option<Feedback> {
        match self {
            SessionEvent::EarlyPenalty { .. } => Some(Feedback::TooEarly),
            SessionEvent::TrialCompleted { feedback, .. }
            | SessionEvent::SessionComplete { feedback, .. } => Some(*feedback),
            _ => None,
        }
    }

    /// Score after the event, when the event changed or confirmed it.
    pub fn new_score(&self) -> Option<u32> {
        match self {
            SessionEvent::EarlyPenalty { new_score }
            | SessionEvent::TrialCompleted { new_score, .. }
            | SessionEvent::SessionComplete { new_score, .. } => Some(*new_score),
            _ => None,
        }
    }

    pub fn is_session_complete(&self) -> bool {
        matches!(self, SessionEvent::SessionComplete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(trial_n: usize, score: u32) -> TrialRecord {
        TrialRecord {
            trial_n,
            isi: 0.5,
            rt: Some(0.31),
            datetime: "2024-03-01 10:00:00".into(),
            score,
            early_presses: 0,
        }
    }

    #[test]
    fn metadata_serializes_user_agent_in_camel_case() {
        let meta = SessionMetadata {
            id: "abc".into(),
            name: "Rex".into(),
            user_agent: "linux".into(),
            start: "2024-03-01 10:00:00".into(),
            end: None,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["userAgent"], "linux");
        assert!(json.get("end").is_none());
    }

    #[test]
    fn missing_rt_serializes_as_null() {
        let mut r = record(0, 0);
        r.rt = None;
        let json = serde_json::to_value(&r).unwrap();
        assert!(json["rt"].is_null());
        assert_eq!(json["trial_n"], 0);
    }

    #[test]
    fn final_score_is_last_trial_score() {
        let data = SessionData {
            metadata: SessionMetadata::default(),
            trials: vec![record(0, 3), record(1, 4)],
        };
        assert_eq!(data.final_score(), 4);
        assert_eq!(SessionData::default().final_score(), 0);
    }

    #[test]
    fn early_penalty_reports_too_early() {
        let ev = SessionEvent::EarlyPenalty { new_score: 1 };
        assert_eq!(ev.feedback(), Some(Feedback::TooEarly));
        assert_eq!(ev.new_score(), Some(1));
        assert_eq!(SessionEvent::NoChange.feedback(), None);
    }
}
