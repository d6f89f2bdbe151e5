use serde::{Deserialize, Serialize};

/// Feedback category shown to the participant after a scoring event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    /// Response landed within the margin of the running median.
    CaughtOnTime,
    CaughtLate,
    /// Press during the wait phase.
    TooEarly,
    /// Response window timed out without a press.
    Missed,
}

impl Feedback {
    pub fn headline(&self) -> &'static str {
        match self {
            Feedback::CaughtOnTime => "YUMMY!",
            Feedback::CaughtLate => "Good!",
            Feedback::TooEarly => "TOO QUICK!",
            Feedback::Missed => "Too slow!",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            Feedback::CaughtOnTime => "Doggo caught the bone!",
            Feedback::CaughtLate => "Doggo fetched the bone.",
            Feedback::TooEarly => "Wait until the bone has appeared.",
            Feedback::Missed => "The bone got away.",
        }
    }

    /// Text colour as straight RGBA.
    pub fn color(&self) -> [u8; 4] {
        match self {
            Feedback::CaughtOnTime => [17, 148, 0, 255], // forest
            Feedback::CaughtLate => [0, 0, 255, 255],
            Feedback::TooEarly | Feedback::Missed => [255, 0, 0, 255],
        }
    }
}
