//! Mapping of transport failures onto classification errors.

use std::time::Duration;

use webinfer_protocols::ClassificationError;

pub fn map_send_error(error: reqwest::Error) -> ClassificationError {
    if error.is_timeout() {
        ClassificationError::Timeout(Duration::ZERO)
    } else {
        ClassificationError::ProviderUnavailable(error.to_string())
    }
}

/// Read a non-success response into the matching error.
pub async fn error_from_response(response: reqwest::Response) -> ClassificationError {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    ClassificationError::from_status(status, &body, retry_after)
}
