pub mod config;
pub mod cookies;
pub mod fetcher;
pub mod loading;
mod parser;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod storage;
#[cfg(test)]
mod testing;
pub mod types;
pub mod validate;

pub use config::Settings;
pub use fetcher::{FetchError, PageFetcher, ReqwestTransport, RetryPolicy, Transport};
pub use parser::extract_job_record;
pub use pipeline::{FetchOutcome, JobPipeline, PipelineError};
pub use report::OutputMode;

pub(crate) const JOB_SITE_HOSTS: [&str; 2] = ["www.linkedin.com", "linkedin.com"];
