use catch_core::SessionData;
use serde::{Deserialize, Serialize};

/// Upload envelope: the session JSON wrapped as a string together with the
/// target experiment and a file name. Delivery belongs to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadBody {
    #[serde(rename = "experimentID")]
    pub experiment_id: String,
    pub filename: String,
    pub data: String,
}

impl UploadBody {
    pub fn new(experiment_id: &str, session: &SessionData) -> serde_json::Result<Self> {
        Ok(Self {
            experiment_id: experiment_id.to_string(),
            filename: session_filename(session),
            data: serde_json::to_string(session)?,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `<participant name>_<session id>.json`, with both parts reduced to a
/// single safe path component.
pub fn session_filename(session: &SessionData) -> String {
    format!(
        "{}_{}.json",
        file_component(&session.metadata.name),
        file_component(&session.metadata.id)
    )
}

/// Keeps alphanumerics, space, `-` and `_`; everything else (path
/// separators, dots, control characters) becomes `_`.
fn file_component(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c,
            ' ' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catch_core::{SessionMetadata, TrialRecord};

    fn session() -> SessionData {
        SessionData {
            metadata: SessionMetadata {
                id: "a1B2".into(),
                name: "Rex".into(),
                user_agent: "linux-x86_64".into(),
                start: "2024-03-01 10:00:00".into(),
                end: Some("2024-03-01 10:05:00".into()),
            },
            trials: vec![TrialRecord {
                trial_n: 0,
                isi: 0.2,
                rt: Some(0.3123456),
                datetime: "2024-03-01 10:00:01".into(),
                score: 3,
                early_presses: 1,
            }],
        }
    }

    #[test]
    fn filename_joins_name_and_id() {
        assert_eq!(session_filename(&session()), "Rex_a1B2.json");
    }

    #[test]
    fn filename_cannot_leave_its_directory() {
        let mut data = session();
        data.metadata.name = "../Rex/A\\B".into();
        let name = session_filename(&data);
        assert_eq!(name, "___Rex_A_B_a1B2.json");
        assert!(!name.contains('/') && !name.contains('\\') && !name.contains(".."));

        data.metadata.name = "No Name".into();
        assert_eq!(session_filename(&data), "No Name_a1B2.json");
    }

    #[test]
    fn body_embeds_session_as_string() {
        let body = UploadBody::new("EXP01", &session()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&body.to_json().unwrap()).unwrap();
        assert_eq!(json["experimentID"], "EXP01");
        assert_eq!(json["filename"], "Rex_a1B2.json");

        let inner: SessionData = serde_json::from_str(json["data"].as_str().unwrap()).unwrap();
        assert_eq!(inner, session());
    }

    #[test]
    fn trial_shape_matches_export_fields() {
        let json = serde_json::to_value(session()).unwrap();
        let trial = &json["trials"][0];
        for key in ["trial_n", "isi", "rt", "datetime", "score", "early_presses"] {
            assert!(trial.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["metadata"]["userAgent"], "linux-x86_64");
    }
}
