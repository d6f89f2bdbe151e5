use anyhow::{Context, Result};
use catch_core::SessionData;
use catch_experiment::UploadBody;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes the upload envelope for `data` into `dir` and returns its path.
pub fn write_session(dir: &Path, experiment_id: &str, data: &SessionData) -> Result<PathBuf> {
    let body = UploadBody::new(experiment_id, data).context("failed to encode session")?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create results directory {}", dir.display()))?;
    let path = dir.join(&body.filename);
    fs::write(&path, body.to_json()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("Wrote {} trials to {}", data.trials.len(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catch_core::SessionMetadata;

    #[test]
    fn writes_envelope_named_after_participant() {
        let dir = std::env::temp_dir().join(format!("catch-results-{}", std::process::id()));
        let data = SessionData {
            metadata: SessionMetadata {
                id: "XYZ".into(),
                name: "Rex".into(),
                ..Default::default()
            },
            trials: Vec::new(),
        };
        let path = write_session(&dir, "EXP", &data).unwrap();
        assert_eq!(path.file_name().unwrap(), "Rex_XYZ.json");
        let body: UploadBody = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(body.experiment_id, "EXP");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn hostile_participant_names_stay_inside_results_dir() {
        let dir = std::env::temp_dir().join(format!("catch-results-names-{}", std::process::id()));
        for name in ["Rex/A", "../x", "..", "/etc/passwd"] {
            let data = SessionData {
                metadata: SessionMetadata {
                    id: "XYZ".into(),
                    name: name.into(),
                    ..Default::default()
                },
                trials: Vec::new(),
            };
            let path = write_session(&dir, "EXP", &data).unwrap();
            assert_eq!(path.parent(), Some(dir.as_path()), "{name} escaped");
            assert!(path.is_file());
            let body: UploadBody =
                serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            let inner: SessionData = serde_json::from_str(&body.data).unwrap();
            assert_eq!(inner.metadata.name, name);
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}
