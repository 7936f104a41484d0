//! Site keys scope stored inferences to one site section.

use url::Url;

use crate::EngineError;

/// Derive a site key: lowercase host without `www.`, an explicit port, and
/// the path without query, fragment or trailing slash.
pub fn site_key_for(url: &str) -> Result<String, EngineError> {
    let parsed = Url::parse(url.trim()).map_err(|e| EngineError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| EngineError::InvalidUrl {
            url: url.to_string(),
            message: "URL has no host".to_string(),
        })?
        .to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let mut key = host.to_string();
    if let Some(port) = parsed.port() {
        key.push_str(&format!(":{}", port));
    }
    key.push_str(parsed.path().trim_end_matches('/'));
    Ok(key)
}

/// Validate a caller-supplied site key.
pub(crate) fn explicit_site_key(key: &str) -> Result<String, EngineError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(EngineError::EmptySiteKey);
    }
    Ok(key.to_lowercase())
}
