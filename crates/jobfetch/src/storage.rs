use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use url::Url;

use crate::types::JobRecord;

static RE_CURRENT_JOB_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"currentJobId=([A-Za-z0-9_-]+)").expect("invalid regex: current job id")
});

static RE_VIEW_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/view/([A-Za-z0-9_-]+)").expect("invalid regex: view segment"));

/// Pulls the job identifier out of a job URL: the `currentJobId` query
/// parameter when present, otherwise the path segment after `/view/`.
///
/// Only filename-safe characters are kept, so the id never adds a path
/// component to the saved file name.
pub fn extract_job_id(url: &str) -> Option<String> {
    let caps = RE_CURRENT_JOB_ID
        .captures(url)
        .or_else(|| RE_VIEW_SEGMENT.captures(url))?;
    Some(caps[1].to_string())
}

/// File name (without extension) for a page fetched from `url` at `timestamp`.
pub fn file_stem(url: &str, timestamp: NaiveDateTime) -> String {
    let ts = timestamp.format("%Y%m%d_%H%M%S");
    if let Some(job_id) = extract_job_id(url) {
        return format!("linkedin_job_{job_id}_{ts}");
    }

    let parsed = Url::parse(url).ok();
    let host = parsed
        .as_ref()
        .and_then(|u| u.host_str())
        .unwrap_or_default()
        .replace('.', "_");
    let path = parsed
        .as_ref()
        .map(|u| u.path().trim_matches('/').replace('/', "_"))
        .unwrap_or_default();

    if path.is_empty() {
        format!("{host}_{ts}")
    } else {
        format!("{host}_{path}_{ts}")
    }
}

fn unique_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let mut path = dir.join(format!("{stem}.{extension}"));
    let mut suffix = 1;
    while path.exists() {
        path = dir.join(format!("{stem}_{suffix}.{extension}"));
        suffix += 1;
    }
    path
}

/// Writes the raw page body under `output_dir`, creating the directory if needed.
pub fn save_page(body: &str, url: &str, output_dir: &Path) -> io::Result<PathBuf> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
        log::info!("Created output directory: {}", output_dir.display());
    }

    let stem = file_stem(url, Local::now().naive_local());
    let path = unique_path(output_dir, &stem, "html");
    fs::write(&path, body)?;

    log::info!("Saved response to {}", path.display());
    Ok(path)
}

/// Writes `record` as JSON next to the saved HTML page.
pub fn save_job_record(record: &JobRecord, html_path: &Path) -> io::Result<PathBuf> {
    let json_path = html_path.with_extension("json");
    let json = serde_json::to_string_pretty(record)?;
    fs::write(&json_path, json)?;

    log::info!("Saved extracted job data to: {}", json_path.display());
    Ok(json_path)
}
