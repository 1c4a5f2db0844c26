use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

const DESCRIPTION_PREVIEW_CHARS: usize = 150;

/// Cookies replayed on every request, keyed by cookie name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieSet(BTreeMap<String, String>);

impl CookieSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value for a `Cookie` request header, `None` when there is nothing to send.
    pub fn header_value(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(
            self.0
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

impl FromIterator<(String, String)> for CookieSet {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub status: u16,
    pub body: String,
    pub final_url: String,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Structured fields pulled out of a job posting page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_cleaned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_urn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_universal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posting_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JobRecord {
    /// Copies `company_name` into `company` and `description_cleaned` into
    /// `description`, the names the job tracker import expects.
    pub fn apply_integration_aliases(&mut self) {
        if let Some(name) = &self.company_name {
            self.company = Some(name.clone());
        }
        if let Some(description) = &self.description_cleaned {
            self.description = Some(description.clone());
        }
    }

    /// Present fields in output order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let text_fields = [
            ("title", &self.title),
            ("description_raw", &self.description_raw),
            ("description_cleaned", &self.description_cleaned),
            ("location", &self.location),
            ("company_name", &self.company_name),
            ("company_urn", &self.company_urn),
            ("company_universal_name", &self.company_universal_name),
            ("company_logo_url", &self.company_logo_url),
            ("posted_date", &self.posted_date),
            ("posting_date", &self.posting_date),
            ("employment_type", &self.employment_type),
            ("salary", &self.salary),
            ("source", &self.source),
            ("company", &self.company),
        ];

        let mut entries: Vec<(&'static str, String)> = text_fields
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect();

        for (key, count) in [("applies", self.applies), ("views", self.views)] {
            if let Some(count) = count {
                entries.push((key, count.to_string()));
            }
        }
        for (key, value) in [("job_id", &self.job_id), ("description", &self.description)] {
            if let Some(value) = value {
                entries.push((key, value.clone()));
            }
        }
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Display for JobRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (key, value) in self.entries() {
            if key == "description_raw" {
                let preview: String = value
                    .chars()
                    .take(DESCRIPTION_PREVIEW_CHARS)
                    .collect::<String>()
                    .replace('\n', " ");
                let preview = preview.trim();
                let preview = if preview.is_empty() { "N/A" } else { preview };
                writeln!(f, "Description (preview): {}... (truncated)", preview)?;
            } else {
                writeln!(f, "{}: {}", title_case(key), value)?;
            }
        }
        Ok(())
    }
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
