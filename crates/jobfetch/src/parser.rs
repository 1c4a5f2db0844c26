use std::sync::LazyLock;

use chrono::{DateTime, Local, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::types::JobRecord;

const JOB_POSTING_TYPE: &str = "com.linkedin.voyager.jobs.JobPosting";
const SOURCE: &str = "LinkedIn";
const COMPANY_NOT_FOUND: &str = "Company Name Not Found";

const CONTENT_SELECTORS: [&str; 5] = [
    "div.jobs-description__content",
    "#job-details",
    ".job-description",
    "article",
    "main",
];

static RE_JOB_POSTING_URN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"jobPosting:(\d+)").expect("invalid regex: job posting urn"));

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One trimmed text node per line, blank nodes dropped.
fn joined_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn markup_text(markup: &str) -> String {
    joined_text(Html::parse_fragment(markup).root_element())
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "N/A".to_string(),
        other => other.to_string(),
    }
}

fn is_job_posting(value: &Value) -> bool {
    value.get("$type").and_then(Value::as_str) == Some(JOB_POSTING_TYPE)
}

/// Finds the job posting inside a data island, either as `data`, as
/// `elements[i].data` or as an element itself.
fn find_job_posting(island: &Value) -> Option<&Value> {
    if let Some(data) = island.get("data").filter(|d| is_job_posting(d)) {
        return Some(data);
    }
    island.get("elements")?.as_array()?.iter().find_map(|element| {
        element
            .get("data")
            .filter(|d| is_job_posting(d))
            .or_else(|| is_job_posting(element).then_some(element))
    })
}

/// Extracts a job record from a fetched job page.
///
/// Prefers the JSON data islands embedded in `<code>` tags and falls back to
/// scraping the rendered markup. Returns `None` when neither yields anything.
pub fn extract_job_record(html: &str) -> Option<JobRecord> {
    let document = Html::parse_document(html);
    let island_sel =
        Selector::parse(r#"code[id^="bpr-guid-"], code[id^="datalet-bpr-guid-"]"#).unwrap();

    let islands: Vec<ElementRef> = document.select(&island_sel).collect();
    log::info!("Found {} potential data containers in HTML", islands.len());

    for tag in islands {
        let id = tag.value().id().unwrap_or_default();
        let text = elem_text(tag);
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let island: Value = match serde_json::from_str(text) {
            Ok(island) => island,
            Err(_) => {
                log::debug!("Tag {} is not valid JSON", id);
                continue;
            }
        };

        if let Some(posting) = find_job_posting(&island) {
            log::info!("Found job data in tag {}", id);
            return Some(record_from_posting(posting, &island));
        }
    }

    log::warn!("Could not find structured job JSON in <code> tags");
    extract_from_markup(&document)
}

fn record_from_posting(posting: &Value, island: &Value) -> JobRecord {
    let mut record = JobRecord {
        title: Some(str_field(posting, "title").unwrap_or_else(|| "N/A".to_string())),
        location: Some(
            str_field(posting, "formattedLocation").unwrap_or_else(|| "N/A".to_string()),
        ),
        ..Default::default()
    };

    match posting.get("description") {
        Some(Value::Object(description)) => {
            let raw = description
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if !raw.is_empty() {
                record.description_cleaned = Some(markup_text(&raw));
            }
            record.description_raw = Some(raw);
        }
        Some(Value::Null) | None => {
            record.description_raw = Some(String::new());
            record.description_cleaned = Some(String::new());
        }
        Some(other) => {
            let raw = scalar_text(other);
            record.description_cleaned = Some(raw.clone());
            record.description_raw = Some(raw);
        }
    }

    apply_company(&mut record, posting, island);

    if let Some(listed_at) = posting.get("listedAt") {
        let date = match listed_at.as_i64() {
            Some(millis) => DateTime::<Utc>::from_timestamp_millis(millis)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| {
                    log::error!("Job post date out of range: {}", millis);
                    "Unknown".to_string()
                }),
            None => scalar_text(listed_at),
        };
        record.posted_date = Some(date.clone());
        record.posting_date = Some(date);
    }

    record.employment_type = match posting.get("employmentStatus") {
        None => Some("Not specified".to_string()),
        Some(status) if status.is_object() => {
            Some(str_field(status, "text").unwrap_or_else(|| "Not specified".to_string()))
        }
        Some(_) => None,
    };

    record.salary = salary(posting);
    record.source = Some(SOURCE.to_string());
    record.company = record.company_name.clone();
    record.applies = Some(posting.get("applies").and_then(Value::as_u64).unwrap_or(0));
    record.views = Some(posting.get("views").and_then(Value::as_u64).unwrap_or(0));
    record.job_id = str_field(posting, "entityUrn").map(|urn| {
        RE_JOB_POSTING_URN
            .captures(&urn)
            .map(|caps| caps[1].to_string())
            .unwrap_or(urn)
    });

    record
}

/// Resolves the company through its URN in the island's `included` list.
fn apply_company(record: &mut JobRecord, posting: &Value, island: &Value) {
    record.company_name = Some(COMPANY_NOT_FOUND.to_string());
    record.company_urn = posting.get("companyDetails").and_then(|details| {
        str_field(details, "company").or_else(|| str_field(details, "*companyResolutionResult"))
    });

    let company = record.company_urn.as_deref().and_then(|urn| {
        island.get("included")?.as_array()?.iter().find(|item| {
            item.get("entityUrn").and_then(Value::as_str) == Some(urn)
        })
    });

    let Some(company) = company else {
        log::warn!("Could not resolve the company for this job posting");
        return;
    };

    record.company_name = Some(
        str_field(company, "name")
            .unwrap_or_else(|| "Company Name Not Found in Included".to_string()),
    );
    record.company_universal_name = Some(str_field(company, "universalName").unwrap_or_default());
    if let Some(image) = company
        .get("logo")
        .and_then(|logo| logo.get("image"))
        .filter(|image| image.is_object())
    {
        record.company_logo_url = Some(str_field(image, "rootUrl").unwrap_or_default());
    }
    log::info!(
        "Found company name: {}",
        record.company_name.as_deref().unwrap_or_default()
    );
}

fn salary(posting: &Value) -> Option<String> {
    let compensation = posting.get("compensation")?.as_object()?;

    if let Some(range) = compensation.get("compensationRange") {
        let (min, max) = (range.get("min")?, range.get("max")?);
        let currency = min
            .get("currencyCode")
            .and_then(Value::as_str)
            .unwrap_or("USD");
        let low = min.get("value").map(scalar_text).unwrap_or_default();
        let high = max.get("value").map(scalar_text).unwrap_or_default();
        return Some(format!("{currency} {low}-{high}"));
    }

    let value = compensation.get("baseSalary")?.get("value")?;
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(scalar_text(other)),
    }
}

fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = Selector::parse(css).unwrap();
        document
            .select(&selector)
            .next()
            .map(|e| normalize_whitespace(&elem_text(e)))
    })
}

fn extract_from_markup(document: &Html) -> Option<JobRecord> {
    log::info!("Falling back to HTML content extraction");

    let Some(content) = CONTENT_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).unwrap();
        document
            .select(&selector)
            .next()
            .inspect(|_| log::info!("Found content using selector: {}", css))
    }) else {
        log::warn!("Could not find main content area in HTML");
        return None;
    };

    let description = joined_text(content);
    let company_name = first_text(document, &["a.topcard__org-name-link", "span.topcard__flavor"]);

    Some(JobRecord {
        title: first_text(document, &["h1.job-title", "h1.top-card-layout__title"]),
        location: first_text(document, &["span.topcard__flavor--bullet"]),
        description_raw: Some(description.clone()),
        description_cleaned: Some(description.clone()),
        description: Some(description),
        company: company_name.clone(),
        company_name,
        source: Some(SOURCE.to_string()),
        posting_date: Some(Local::now().format("%Y-%m-%d").to_string()),
        ..Default::default()
    })
}
