//! Bounded exponential backoff for idempotent remote calls.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Response;
use reqwest::StatusCode;

use crate::{Error, Result};

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` attempts have been made.
pub fn with_retries<T, F>(label: &str, max_attempts: usize, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                attempt += 1;
                let delay = retry_backoff(attempt);
                tracing::warn!(
                    "{label} failed (attempt {attempt}/{max_attempts}): {err}; retrying in {delay:?}"
                );
                thread::sleep(delay);
            }
            Err(err) => return Err(err),
        }
    }
}

/// Whether a response status signals a transient condition.
pub fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Delay before retry number `attempt`, capped at 16 seconds.
pub fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

/// Maps a non-success response to the right provider error variant.
pub(crate) fn error_for_status(service: &str, resp: Response) -> Error {
    let status = resp.status();
    let body = resp
        .text()
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    let message = format!("{service} returned {status}: {body}");
    if should_retry(status) {
        Error::TransientProvider(message)
    } else {
        Error::Provider(message)
    }
}
