use url::Url;

// The bare "/jobs/" fragment accepts almost any job-site path.
const JOB_PATH_FRAGMENTS: [&str; 4] = ["/jobs/view/", "/jobs/collections/", "/jobs/", "/job/"];

/// Returns true when `url` points at a job page on the job site.
///
/// Malformed URLs are logged and rejected.
pub fn is_job_url(url: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::error!("Error validating URL {:?}: {}", url, e);
            return false;
        }
    };

    let on_job_site = parsed
        .host_str()
        .is_some_and(|host| crate::JOB_SITE_HOSTS.contains(&host));
    let path = parsed.path();

    on_job_site && JOB_PATH_FRAGMENTS.iter().any(|fragment| path.contains(fragment))
}
