//! HTTP response classification shared by the adapters.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::error::{ConfigError, FetchError};

pub(crate) fn build_client(
    user_agent: &str,
    timeout: Duration,
    accept_invalid_certs: bool,
) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// When the server says the quota resets, if it says so at all.
///
/// Values outside chrono's representable range count as unadvertised, so the
/// fetcher falls back to its default wait.
pub(crate) fn advertised_reset(headers: &HeaderMap, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(epoch) = header_i64(headers, "x-ratelimit-reset") {
        return DateTime::from_timestamp(epoch, 0);
    }
    let secs = header_i64(headers, "retry-after")?;
    chrono::Duration::try_seconds(secs).and_then(|delta| now.checked_add_signed(delta))
}

fn is_throttle(status: StatusCode, headers: &HeaderMap, body: &str) -> bool {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status == StatusCode::FORBIDDEN
        && (header_i64(headers, "x-ratelimit-remaining") == Some(0)
            || body.to_ascii_lowercase().contains("rate limit"))
}

/// Map a non-success response to a [`FetchError`].
pub(crate) fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    now: DateTime<Utc>,
) -> FetchError {
    if is_throttle(status, headers, body) {
        return FetchError::Throttled {
            retry_at: advertised_reset(headers, now),
        };
    }
    if status.is_server_error() {
        return FetchError::Transient(format!("server error {status}"));
    }
    FetchError::Fatal(format!("unexpected status {status}"))
}

/// Map a transport-level failure to a [`FetchError`].
pub(crate) fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_builder() {
        FetchError::Fatal(err.to_string())
    } else {
        FetchError::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn forbidden_with_exhausted_quota_is_throttled() {
        let now = Utc::now();
        let h = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1700000000")]);
        let err = classify_failure(StatusCode::FORBIDDEN, &h, "{}", now);
        assert_eq!(
            err,
            FetchError::Throttled {
                retry_at: DateTime::from_timestamp(1_700_000_000, 0)
            }
        );
    }

    #[test]
    fn forbidden_mentioning_rate_limit_is_throttled() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            &HeaderMap::new(),
            r#"{"message":"API rate limit exceeded for 1.2.3.4"}"#,
            Utc::now(),
        );
        assert_eq!(err, FetchError::Throttled { retry_at: None });
    }

    #[test]
    fn too_many_requests_uses_retry_after() {
        let now = Utc::now();
        let err = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(&[("retry-after", "30")]),
            "",
            now,
        );
        assert_eq!(
            err,
            FetchError::Throttled {
                retry_at: Some(now + chrono::Duration::seconds(30))
            }
        );
    }

    #[test]
    fn out_of_range_retry_after_falls_back_to_default_wait() {
        let now = Utc::now();
        for value in ["99999999999999", "-99999999999999", "9223372036854775807"] {
            let mut h = HeaderMap::new();
            h.insert("retry-after", HeaderValue::from_static(value));
            let err = classify_failure(StatusCode::TOO_MANY_REQUESTS, &h, "", now);
            assert_eq!(err, FetchError::Throttled { retry_at: None }, "retry-after {value}");
        }
    }

    #[test]
    fn out_of_range_reset_epoch_is_ignored() {
        let h = headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "99999999999999999")]);
        let err = classify_failure(StatusCode::FORBIDDEN, &h, "", Utc::now());
        assert_eq!(err, FetchError::Throttled { retry_at: None });
    }

    #[test]
    fn plain_forbidden_and_not_found_are_fatal() {
        let now = Utc::now();
        let h = headers(&[("x-ratelimit-remaining", "42")]);
        assert!(matches!(
            classify_failure(StatusCode::FORBIDDEN, &h, "Resource not accessible", now),
            FetchError::Fatal(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::NOT_FOUND, &HeaderMap::new(), "", now),
            FetchError::Fatal(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED, &HeaderMap::new(), "", now),
            FetchError::Fatal(_)
        ));
    }

    #[test]
    fn server_errors_are_transient() {
        let err = classify_failure(StatusCode::BAD_GATEWAY, &HeaderMap::new(), "", Utc::now());
        assert!(matches!(err, FetchError::Transient(_)));
    }
}
