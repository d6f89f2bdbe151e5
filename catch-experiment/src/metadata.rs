use catch_core::SessionMetadata;
use chrono::Local;
use rand::Rng;
use rand::distr::Alphanumeric;

pub const SESSION_ID_LEN: usize = 24;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time as `YYYY-MM-DD HH:MM:SS`.
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn generate_session_id<R: Rng>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Metadata for a session starting now. `end` is filled on completion.
pub fn begin_session<R: Rng>(rng: &mut R, name: &str, user_agent: &str) -> SessionMetadata {
    SessionMetadata {
        id: generate_session_id(rng),
        name: name.to_string(),
        user_agent: user_agent.to_string(),
        start: timestamp_now(),
        end: None,
    }
}
