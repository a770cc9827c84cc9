//! Retry policy for routing requests.
//!
//! ```ignore
//! let policy = RetryPolicy::default();
//! let response = retry::get_with_retry(&transport, &url, &policy).await?;
//! ```
//!
//! With the default policy a request is attempted once and retried up to
//! five more times, sleeping 0.1s, 0.2s, 0.4s, 0.8s and 1.6s between
//! attempts (about 3.1s in total before giving up).

use std::time::Duration;

use serde::Deserialize;

use crate::RouteError;
use crate::transport::{RouteTransport, TransportResponse};

/// Upper bound for a single backoff sleep.
const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// When and how often a routing request is retried.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds. Retry `n` sleeps
    /// `backoff_factor * 2^(n-1)`.
    pub backoff_factor: f64,
    /// Response statuses that trigger a retry.
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: 0.1,
            status_forcelist: vec![500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// A policy that retries like `self` but never sleeps.
    #[must_use]
    pub fn without_backoff(mut self) -> Self {
        self.backoff_factor = 0.0;
        self
    }

    /// Sleep before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let secs = self.backoff_factor * 2_f64.powi(exponent);
        Duration::try_from_secs_f64(secs).map_or(BACKOFF_MAX, |d| d.min(BACKOFF_MAX))
    }

    /// Sum of every backoff sleep when all retries are used.
    #[must_use]
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_retries).map(|n| self.backoff(n)).sum()
    }

    /// Whether a response with `status` should be retried.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }
}

/// Sends a GET request through `transport`, retrying per `policy`.
///
/// Transient transport errors (timeouts, refused connections) and
/// responses whose status is in [`RetryPolicy::status_forcelist`] are
/// retried. Every other response, successful or not, is returned as-is.
///
/// # Errors
///
/// Returns [`RouteError::RetriesExhausted`] if the last attempt still had a
/// retryable status, or the transport's error if it was not transient or
/// retries ran out.
pub async fn get_with_retry(
    transport: &dyn RouteTransport,
    url: &str,
    policy: &RetryPolicy,
) -> Result<TransportResponse, RouteError> {
    let max_retries = policy.max_retries;
    let mut last_error: Option<RouteError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = policy.backoff(attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match transport.get(url).await {
            Err(e) => {
                if e.is_transient() && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(e);
                    continue;
                }
                return Err(e);
            }
            Ok(response) => {
                if policy.is_retryable_status(response.status) {
                    if attempt < max_retries {
                        log::warn!("  HTTP {} (server error)", response.status);
                        last_error = Some(RouteError::RetriesExhausted {
                            status: response.status,
                            retries: attempt,
                        });
                        continue;
                    }
                    return Err(RouteError::RetriesExhausted {
                        status: response.status,
                        retries: max_retries,
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| RouteError::Connection {
        message: "request failed after all retries".to_owned(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{ScriptedTransport, ok, refused, status};

    fn fast() -> RetryPolicy {
        RetryPolicy::default().without_backoff()
    }

    #[test]
    fn default_backoff_doubles_from_a_tenth_of_a_second() {
        let policy = RetryPolicy::default();
        let delays: Vec<u128> = (1..=5).map(|n| policy.backoff(n).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600]);
        assert_eq!(policy.total_backoff().as_millis(), 3100);
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy {
            backoff_factor: 10.0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.backoff(40), BACKOFF_MAX);
    }

    #[test]
    fn only_listed_statuses_are_retryable() {
        let policy = RetryPolicy::default();
        for code in [500, 502, 503, 504] {
            assert!(policy.is_retryable_status(code));
        }
        for code in [200, 400, 404, 429, 501] {
            assert!(!policy.is_retryable_status(code));
        }
    }

    #[tokio::test]
    async fn succeeds_on_last_allowed_attempt() {
        let transport = ScriptedTransport::new(vec![
            status(503),
            status(503),
            status(503),
            status(503),
            status(503),
            ok("{}"),
        ]);
        let response = get_with_retry(&transport, "http://x", &fast()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let transport = ScriptedTransport::new((0..6).map(|_| status(502)).collect());
        let err = get_with_retry(&transport, "http://x", &fast())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RouteError::RetriesExhausted {
                status: 502,
                retries: 5
            }
        ));
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let transport = ScriptedTransport::new(vec![status(404)]);
        let response = get_with_retry(&transport, "http://x", &fast()).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn retries_transient_connection_errors() {
        let transport = ScriptedTransport::new(vec![refused(), refused(), ok("{}")]);
        let response = get_with_retry(&transport, "http://x", &fast()).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let transport = ScriptedTransport::new(vec![Err(RouteError::Parse {
            message: "bad".to_owned(),
        })]);
        let err = get_with_retry(&transport, "http://x", &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::Parse { .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy {
            max_retries: 0,
            ..fast()
        };
        let transport = ScriptedTransport::new(vec![status(503)]);
        let err = get_with_retry(&transport, "http://x", &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, RouteError::RetriesExhausted { status: 503, .. }));
        assert_eq!(transport.calls(), 1);
    }
}
