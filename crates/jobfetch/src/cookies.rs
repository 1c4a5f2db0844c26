use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::types::CookieSet;

#[derive(Debug, thiserror::Error)]
enum CookieFileError {
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cookie file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of cookie objects")]
    NotAnArray,
}

/// Loads cookies exported by a browser extension.
///
/// The file holds a JSON array of objects with `name` and `value` fields; any
/// other fields are ignored and incomplete entries are skipped. Read or parse
/// failures are logged and yield an empty set.
pub fn load_cookies(path: impl AsRef<Path>) -> CookieSet {
    let path = path.as_ref();
    match read_cookie_file(path) {
        Ok(cookies) => {
            log::info!("Loaded {} cookies from {}", cookies.len(), path.display());
            cookies
        }
        Err(e) => {
            log::error!("Error loading cookies from {}: {}", path.display(), e);
            CookieSet::default()
        }
    }
}

fn read_cookie_file(path: &Path) -> Result<CookieSet, CookieFileError> {
    let raw = fs::read_to_string(path)?;
    let Value::Array(entries) = serde_json::from_str::<Value>(&raw)? else {
        return Err(CookieFileError::NotAnArray);
    };

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let name = entry.get("name")?.as_str()?;
            let value = entry.get("value")?.as_str()?;
            Some((name.to_string(), value.to_string()))
        })
        .collect())
}
