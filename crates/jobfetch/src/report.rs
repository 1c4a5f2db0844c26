use std::path::Path;

use serde_json::{Value, json};

use crate::pipeline::{FetchOutcome, PipelineError};

/// How results are presented on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable, field by field.
    #[default]
    Text,
    /// The job record only.
    Json,
    /// Envelope consumed by the job tracker import.
    Integration,
}

impl OutputMode {
    pub fn from_flags(json_output: bool, integration_mode: bool) -> Self {
        if integration_mode {
            OutputMode::Integration
        } else if json_output {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Progress logging is only wanted when a person is reading the output.
    pub fn is_verbose(self) -> bool {
        self == OutputMode::Text
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// JSON to print for a successful run; `None` in text mode.
pub fn success_payload(mode: OutputMode, outcome: &FetchOutcome) -> Option<Value> {
    let record = serde_json::to_value(&outcome.record).unwrap_or_else(|e| {
        log::error!("Error serializing job record: {}", e);
        Value::Null
    });

    match mode {
        OutputMode::Text => None,
        OutputMode::Json => Some(record),
        OutputMode::Integration => Some(json!({
            "success": true,
            "files": {
                "html": path_string(&outcome.html_path),
                "json": path_string(&outcome.json_path),
            },
            "job_data": record,
        })),
    }
}

/// JSON to print for a failed run; `None` in text mode.
pub fn error_payload(mode: OutputMode, error: &PipelineError) -> Option<Value> {
    match mode {
        OutputMode::Text => None,
        OutputMode::Json => Some(json!({
            "error": true,
            "error_type": error.error_type(),
            "message": error.to_string(),
        })),
        OutputMode::Integration => Some(json!({
            "success": false,
            "error": true,
            "error_type": error.error_type(),
            "message": error.to_string(),
            "files": {
                "html": error.html_path().map(path_string),
                "json": Value::Null,
            },
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobRecord;
    use std::path::PathBuf;

    #[test]
    fn test_mode_from_flags() {
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Text);
        assert_eq!(OutputMode::from_flags(true, false), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(false, true), OutputMode::Integration);
        assert!(OutputMode::Text.is_verbose());
        assert!(!OutputMode::Json.is_verbose());
    }

    #[test]
    fn test_text_mode_has_no_payload() {
        let err = PipelineError::InvalidUrl("nope".to_string());
        assert_eq!(error_payload(OutputMode::Text, &err), None);
    }

    #[test]
    fn test_integration_errors_always_carry_file_keys() {
        let errors = [
            PipelineError::InvalidUrl("nope".to_string()),
            PipelineError::MissingCookieFile(PathBuf::from("private/cookies.json")),
            PipelineError::ExtractionFailed {
                html_path: PathBuf::from("fetched_pages/linkedin_job_1.html"),
            },
        ];

        for err in &errors {
            let payload = error_payload(OutputMode::Integration, err).unwrap();
            assert_eq!(payload["success"], false);
            assert_eq!(payload["error_type"], err.error_type());
            let files = payload["files"].as_object().expect("files object");
            assert!(files.contains_key("html"));
            assert!(files.contains_key("json"));
            assert!(files["json"].is_null());
        }
    }

    #[test]
    fn test_json_error_payload_shape() {
        let err = PipelineError::MissingCookieFile(PathBuf::from("private/cookies.json"));
        let payload = error_payload(OutputMode::Json, &err).unwrap();

        assert_eq!(
            payload,
            json!({
                "error": true,
                "error_type": "auth_error",
                "message": "Cookie file not found at: private/cookies.json",
            })
        );
    }

    #[test]
    fn test_integration_success_envelope() {
        let outcome = FetchOutcome {
            status: 200,
            content_length: 10,
            final_url: "https://www.linkedin.com/jobs/view/1/".to_string(),
            html_path: PathBuf::from("out/linkedin_job_1.html"),
            json_path: PathBuf::from("out/linkedin_job_1.json"),
            record: JobRecord {
                title: Some("Rust Engineer".to_string()),
                ..Default::default()
            },
        };

        let payload = success_payload(OutputMode::Integration, &outcome).unwrap();
        assert_eq!(
            payload,
            json!({
                "success": true,
                "files": {"html": "out/linkedin_job_1.html", "json": "out/linkedin_job_1.json"},
                "job_data": {"title": "Rust Engineer"},
            })
        );
        assert_eq!(success_payload(OutputMode::Text, &outcome), None);
    }
}
