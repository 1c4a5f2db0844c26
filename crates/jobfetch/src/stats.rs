use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters for one process run.
#[derive(Debug, Clone)]
pub struct FetchStats {
    jobs_found: usize,
    jobs_filtered_out: usize,
    jobs_stored: usize,
    jobs_duplicate: usize,
    jobs_failed: usize,
    urls_processed: usize,
    urls_total: usize,
    urls_failed: usize,
    errors: usize,
    started: Instant,
}

impl Default for FetchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStats {
    pub fn new() -> Self {
        Self {
            jobs_found: 0,
            jobs_filtered_out: 0,
            jobs_stored: 0,
            jobs_duplicate: 0,
            jobs_failed: 0,
            urls_processed: 0,
            urls_total: 0,
            urls_failed: 0,
            errors: 0,
            started: Instant::now(),
        }
    }

    pub fn record_jobs_found(&mut self, count: usize) {
        self.jobs_found += count;
        log::debug!("Jobs found: {}", self.jobs_found);
    }

    pub fn record_jobs_filtered_out(&mut self, count: usize) {
        self.jobs_filtered_out += count;
        log::debug!("Jobs filtered out: {}", self.jobs_filtered_out);
    }

    pub fn record_job_stored(&mut self) {
        self.jobs_stored += 1;
    }

    pub fn record_job_duplicate(&mut self) {
        self.jobs_duplicate += 1;
    }

    pub fn record_job_failed(&mut self) {
        self.jobs_failed += 1;
    }

    pub fn set_urls_total(&mut self, total: usize) {
        self.urls_total = total;
    }

    pub fn record_url_processed(&mut self) {
        self.urls_processed += 1;
    }

    pub fn record_url_failed(&mut self) {
        self.urls_failed += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn jobs_found(&self) -> usize {
        self.jobs_found
    }

    pub fn jobs_stored(&self) -> usize {
        self.jobs_stored
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn jobs_remaining(&self) -> usize {
        self.jobs_found.saturating_sub(self.jobs_filtered_out)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            urls: UrlCounts {
                processed: self.urls_processed,
                total: self.urls_total,
                failed: self.urls_failed,
            },
            jobs: JobCounts {
                found: self.jobs_found,
                filtered: self.jobs_filtered_out,
                stored: self.jobs_stored,
                duplicate: self.jobs_duplicate,
                failed: self.jobs_failed,
                remaining: self.jobs_remaining(),
            },
            errors: self.errors,
            elapsed_secs: self.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlCounts {
    pub processed: usize,
    pub total: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCounts {
    pub found: usize,
    pub filtered: usize,
    pub stored: usize,
    pub duplicate: usize,
    pub failed: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub urls: UrlCounts,
    pub jobs: JobCounts,
    pub errors: usize,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        writeln!(
            f,
            "  URLs processed: {}/{} ({} failed)",
            self.urls.processed, self.urls.total, self.urls.failed
        )?;
        writeln!(
            f,
            "  Jobs found:     {} (stored {}, failed {})",
            self.jobs.found, self.jobs.stored, self.jobs.failed
        )?;
        writeln!(f, "  Errors:         {}", self.errors)?;
        writeln!(f, "  Elapsed:        {:.2}s", self.elapsed_secs)
    }
}
