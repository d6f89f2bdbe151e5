pub mod feedback;
pub mod phase;
pub mod trial;

pub use feedback::Feedback;
pub use phase::Phase;
pub use trial::{SessionData, SessionEvent, SessionMetadata, TrialRecord};
