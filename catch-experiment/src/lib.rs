pub mod config;
pub mod error;
pub mod export;
pub mod median;
pub mod metadata;
pub mod recorder;
pub mod schedule;
pub mod scoring;
pub mod session;
pub mod state;
pub use config::SessionConfig;
pub use error::{ConfigurationError, PrematureQueryError};
pub use export::UploadBody;
pub use median::RunningMedianTracker;
pub use recorder::TrialRecorder;
pub use schedule::{IsiSchedule, IsiScheduler};
pub use scoring::ScoringPolicy;
pub use session::SessionState;
pub use state::{TrialStateMachine, new_session};
