use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::cookies::load_cookies;
use crate::fetcher::{FetchError, PageFetcher, ReqwestTransport, Transport, TransportError};
use crate::parser::extract_job_record;
use crate::report::OutputMode;
use crate::stats::FetchStats;
use crate::storage::{save_job_record, save_page};
use crate::types::JobRecord;
use crate::validate::is_job_url;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(
        "Invalid LinkedIn job URL. URL must be from linkedin.com and contain 'jobs/view/' or 'jobs/collections/'"
    )]
    InvalidUrl(String),
    #[error("Cookie file not found at: {}", .0.display())]
    MissingCookieFile(PathBuf),
    #[error("Failed to fetch the page")]
    FetchFailed(#[source] FetchError),
    #[error("LinkedIn authentication failed. Please check your cookie file.")]
    AuthFailed(#[source] FetchError),
    #[error("Could not extract structured job data")]
    ExtractionFailed { html_path: PathBuf },
    #[error("Failed to save fetched data: {source}")]
    SaveFailed {
        #[source]
        source: std::io::Error,
        html_path: Option<PathBuf>,
    },
}

impl From<FetchError> for PipelineError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::LoginPage { .. } => PipelineError::AuthFailed(e),
            FetchError::RetriesExhausted { .. } => PipelineError::FetchFailed(e),
        }
    }
}

impl PipelineError {
    /// Stable tag for machine-readable error payloads.
    pub fn error_type(&self) -> &'static str {
        match self {
            PipelineError::InvalidUrl(_) => "invalid_url",
            PipelineError::MissingCookieFile(_) => "auth_error",
            PipelineError::FetchFailed(_) => "fetch_failed",
            PipelineError::AuthFailed(_) => "auth_failed",
            PipelineError::ExtractionFailed { .. } => "extraction_failed",
            PipelineError::SaveFailed { .. } => "save_failed",
        }
    }

    /// The saved raw page, when the run got that far.
    pub fn html_path(&self) -> Option<&Path> {
        match self {
            PipelineError::ExtractionFailed { html_path } => Some(html_path),
            PipelineError::SaveFailed { html_path, .. } => html_path.as_deref(),
            _ => None,
        }
    }

    pub fn hint(&self) -> Option<String> {
        match self {
            PipelineError::InvalidUrl(_) => Some(
                "Please provide a URL from linkedin.com that contains 'jobs/view/' or 'jobs/collections/'"
                    .to_string(),
            ),
            PipelineError::MissingCookieFile(path) => Some(format!(
                "Please ensure your LinkedIn cookies are saved in: {}",
                path.display()
            )),
            PipelineError::AuthFailed(_) => {
                Some("Received login page instead of job listing.".to_string())
            }
            PipelineError::ExtractionFailed { html_path } => Some(format!(
                "You can still use the HTML file at {} with an LLM for information extraction.",
                html_path.display()
            )),
            PipelineError::SaveFailed {
                html_path: Some(html_path),
                ..
            } => Some(format!("The raw page was kept at {}", html_path.display())),
            PipelineError::FetchFailed(_) | PipelineError::SaveFailed { .. } => None,
        }
    }
}

/// Everything a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub status: u16,
    pub content_length: usize,
    pub final_url: String,
    pub html_path: PathBuf,
    pub json_path: PathBuf,
    pub record: JobRecord,
}

impl Display for FetchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Success! Status code: {}", self.status)?;
        writeln!(f, "Content length: {} bytes", self.content_length)?;
        writeln!(f, "\nHTML content saved to: {}", self.html_path.display())?;
        writeln!(f, "\n--- Extracted Job Data ---")?;
        write!(f, "{}", self.record)?;
        writeln!(f, "\nExtracted data saved to: {}", self.json_path.display())
    }
}

/// Validate, fetch, persist and extract a single job page.
pub struct JobPipeline<T = ReqwestTransport> {
    fetcher: PageFetcher<T>,
    settings: Settings,
    mode: OutputMode,
    stats: FetchStats,
}

impl JobPipeline<ReqwestTransport> {
    pub fn new(settings: Settings, mode: OutputMode) -> Result<Self, TransportError> {
        let fetcher = PageFetcher::new(settings.retry_policy())?;
        Ok(Self::with_fetcher(settings, mode, fetcher))
    }
}

impl<T: Transport> JobPipeline<T> {
    pub fn with_fetcher(settings: Settings, mode: OutputMode, fetcher: PageFetcher<T>) -> Self {
        Self {
            fetcher: fetcher.verbose(mode.is_verbose()),
            settings,
            mode,
            stats: FetchStats::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &FetchStats {
        &self.stats
    }

    pub fn fetcher(&self) -> &PageFetcher<T> {
        &self.fetcher
    }

    pub async fn run(&mut self, url: &str) -> Result<FetchOutcome, PipelineError> {
        self.stats.set_urls_total(1);
        let result = self.execute(url).await;
        if let Err(e) = &result {
            log::error!("{} ({})", e, e.error_type());
            self.stats.record_error();
        }
        result
    }

    async fn execute(&mut self, url: &str) -> Result<FetchOutcome, PipelineError> {
        if !is_job_url(url) {
            return Err(PipelineError::InvalidUrl(url.into()));
        }

        let cookie_file = &self.settings.cookie_file;
        if !cookie_file.exists() {
            return Err(PipelineError::MissingCookieFile(cookie_file.clone()));
        }
        let cookies = load_cookies(cookie_file);

        let page = match self.fetcher.fetch(url, &cookies).await {
            Ok(page) => {
                self.stats.record_url_processed();
                page
            }
            Err(e) => {
                self.stats.record_url_failed();
                return Err(e.into());
            }
        };

        let html_path = save_page(&page.body, url, &self.settings.output_dir).map_err(|e| {
            PipelineError::SaveFailed {
                source: e,
                html_path: None,
            }
        })?;

        log::info!("Extracting job data from HTML...");
        let Some(mut record) = extract_job_record(&page.body).filter(|r| !r.is_empty()) else {
            self.stats.record_job_failed();
            return Err(PipelineError::ExtractionFailed { html_path });
        };
        self.stats.record_jobs_found(1);

        if self.mode == OutputMode::Integration {
            record.apply_integration_aliases();
        }

        let json_path = match save_job_record(&record, &html_path) {
            Ok(path) => path,
            Err(e) => {
                self.stats.record_job_failed();
                return Err(PipelineError::SaveFailed {
                    source: e,
                    html_path: Some(html_path),
                });
            }
        };
        self.stats.record_job_stored();

        Ok(FetchOutcome {
            status: page.status,
            content_length: page.body.len(),
            final_url: page.final_url,
            html_path,
            json_path,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::RetryPolicy;
    use crate::report::{error_payload, success_payload};
    use crate::testing::{ScriptedTransport, page};
    use crate::types::FetchResult;
    use std::fs;
    use std::time::Duration;

    const JOB_URL: &str = "https://www.linkedin.com/jobs/view/3912345678/";

    struct Workspace {
        _dir: tempfile::TempDir,
        settings: Settings,
    }

    fn workspace() -> Workspace {
        let dir = tempfile::tempdir().unwrap();
        let cookie_file = dir.path().join("cookies.json");
        fs::write(&cookie_file, r#"[{"name": "li_at", "value": "AQEDAT"}]"#).unwrap();
        let settings = Settings {
            cookie_file,
            output_dir: dir.path().join("fetched_pages"),
            retry_delay: Duration::ZERO,
            ..Default::default()
        };
        Workspace {
            _dir: dir,
            settings,
        }
    }

    fn pipeline(
        settings: &Settings,
        mode: OutputMode,
        responses: Vec<FetchResult>,
    ) -> JobPipeline<ScriptedTransport> {
        let policy = RetryPolicy {
            max_retries: settings.max_retries,
            delay: Duration::ZERO,
        };
        let fetcher = PageFetcher::with_transport(ScriptedTransport::new(responses), policy);
        JobPipeline::with_fetcher(settings.clone(), mode, fetcher)
    }

    fn fixture(name: &str) -> String {
        fs::read_to_string(format!("fixtures/{name}")).expect("Failed to read fixture")
    }

    #[tokio::test]
    async fn test_successful_run_saves_both_files() {
        let ws = workspace();
        let mut pipeline = pipeline(
            &ws.settings,
            OutputMode::Integration,
            vec![page(200, &fixture("job_view_data_island.html"))],
        );

        let outcome = pipeline.run(JOB_URL).await.expect("run should succeed");

        assert!(outcome.html_path.exists());
        assert!(outcome.json_path.exists());
        assert!(outcome.html_path.starts_with(&ws.settings.output_dir));
        assert_eq!(outcome.json_path, outcome.html_path.with_extension("json"));
        assert_eq!(outcome.record.company.as_deref(), Some("Ferrous Systems"));
        assert_eq!(
            outcome.record.description.as_deref(),
            Some("Build reliable services.\nRust\nTokio")
        );

        let saved: JobRecord =
            serde_json::from_str(&fs::read_to_string(&outcome.json_path).unwrap()).unwrap();
        assert_eq!(saved, outcome.record);

        let payload = success_payload(OutputMode::Integration, &outcome).unwrap();
        assert_eq!(payload["success"], true);
        assert!(payload["files"]["html"].is_string());
        assert!(payload["files"]["json"].is_string());
        assert_eq!(payload["job_data"]["title"], "Senior Rust Engineer");

        assert_eq!(pipeline.stats().jobs_stored(), 1);
        assert_eq!(pipeline.stats().errors(), 0);
    }

    #[tokio::test]
    async fn test_json_mode_keeps_extracted_fields_untouched() {
        let ws = workspace();
        let mut pipeline = pipeline(
            &ws.settings,
            OutputMode::Json,
            vec![page(200, &fixture("job_view_data_island.html"))],
        );

        let outcome = pipeline.run(JOB_URL).await.unwrap();

        assert_eq!(outcome.record.description, None);
        let payload = success_payload(OutputMode::Json, &outcome).unwrap();
        assert_eq!(payload["title"], "Senior Rust Engineer");
        assert!(payload.get("success").is_none());
    }

    #[tokio::test]
    async fn test_login_page_is_an_auth_failure() {
        let ws = workspace();
        let mut pipeline = pipeline(
            &ws.settings,
            OutputMode::Json,
            vec![page(200, &fixture("login_page.html"))],
        );

        let err = pipeline.run(JOB_URL).await.unwrap_err();

        assert!(matches!(err, PipelineError::AuthFailed(_)));
        let payload = error_payload(OutputMode::Json, &err).unwrap();
        assert_eq!(payload["error"], true);
        assert_eq!(payload["error_type"], "auth_failed");
        assert!(!ws.settings.output_dir.exists());
        assert_eq!(pipeline.stats().errors(), 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_keeps_raw_page() {
        let ws = workspace();
        let mut pipeline = pipeline(
            &ws.settings,
            OutputMode::Integration,
            vec![page(200, &fixture("empty_page.html"))],
        );

        let err = pipeline.run(JOB_URL).await.unwrap_err();

        let html_path = err.html_path().expect("raw page should be saved").to_path_buf();
        assert!(html_path.exists());
        assert!(!html_path.with_extension("json").exists());

        let payload = error_payload(OutputMode::Integration, &err).unwrap();
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error_type"], "extraction_failed");
        assert_eq!(
            payload["files"]["html"].as_str(),
            Some(html_path.display().to_string().as_str())
        );
        assert!(payload["files"]["json"].is_null());
    }

    #[tokio::test]
    async fn test_json_write_failure_still_reports_saved_page() {
        let ws = workspace();
        fs::create_dir_all(&ws.settings.output_dir).unwrap();
        // Directories squatting on every JSON name the run could pick.
        let now = chrono::Local::now().naive_local();
        for offset in 0..=5 {
            let stem = crate::storage::file_stem(JOB_URL, now + chrono::Duration::seconds(offset));
            fs::create_dir_all(ws.settings.output_dir.join(format!("{stem}.json"))).unwrap();
        }
        let mut pipeline = pipeline(
            &ws.settings,
            OutputMode::Integration,
            vec![page(200, &fixture("job_view_data_island.html"))],
        );

        let err = pipeline.run(JOB_URL).await.unwrap_err();

        assert_eq!(err.error_type(), "save_failed");
        let html_path = err.html_path().expect("raw page should be saved").to_path_buf();
        assert!(html_path.is_file());
        assert!(err.hint().is_some());

        let payload = error_payload(OutputMode::Integration, &err).unwrap();
        assert_eq!(payload["success"], false);
        assert_eq!(
            payload["files"]["html"].as_str(),
            Some(html_path.display().to_string().as_str())
        );
        assert!(payload["files"]["json"].is_null());
        assert_eq!(pipeline.stats().jobs_stored(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_a_fetch_failure() {
        let ws = workspace();
        let mut pipeline = pipeline(&ws.settings, OutputMode::Integration, vec![]);

        let err = pipeline.run(JOB_URL).await.unwrap_err();

        assert_eq!(err.error_type(), "fetch_failed");
        assert_eq!(pipeline.fetcher().transport().calls(), 3);
        let payload = error_payload(OutputMode::Integration, &err).unwrap();
        assert_eq!(payload["success"], false);
        assert!(payload["files"]["html"].is_null());
        assert!(payload["files"]["json"].is_null());
    }

    #[tokio::test]
    async fn test_invalid_url_short_circuits() {
        let ws = workspace();
        let mut pipeline = pipeline(&ws.settings, OutputMode::Text, vec![]);

        let err = pipeline.run("https://example.com/jobs/view/1/").await.unwrap_err();

        assert_eq!(err.error_type(), "invalid_url");
        assert!(err.hint().is_some());
        assert_eq!(pipeline.fetcher().transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_cookie_file_is_an_auth_error() {
        let ws = workspace();
        let settings = Settings {
            cookie_file: ws.settings.output_dir.join("missing.json"),
            ..ws.settings.clone()
        };
        let mut pipeline = pipeline(&settings, OutputMode::Json, vec![]);

        let err = pipeline.run(JOB_URL).await.unwrap_err();

        assert_eq!(err.error_type(), "auth_error");
        assert!(err.to_string().contains("missing.json"));
        assert_eq!(pipeline.fetcher().transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_text_outcome_lists_paths_and_fields() {
        let ws = workspace();
        let mut pipeline = pipeline(
            &ws.settings,
            OutputMode::Text,
            vec![page(200, &fixture("job_view_public.html"))],
        );

        let outcome = pipeline.run(JOB_URL).await.unwrap();
        let text = outcome.to_string();

        assert!(text.contains("Success! Status code: 200"));
        assert!(text.contains("Title: Backend Developer"));
        assert!(text.contains("Company Name: Acme Corp"));
        assert!(text.contains(&outcome.json_path.display().to_string()));
    }
}
