//! JSON-over-HTTP calls with retry and exponential backoff.
//!
//! Shared by the embedding and generation providers.
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{anyhow, bail, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before retry number `attempt` (1-based).
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(5))
}

/// Build a client with the given request timeout.
pub fn client_with_timeout(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// A JSON POST target.
pub struct JsonEndpoint<'a> {
    /// Service label used in error messages (e.g. `"OpenAI"`).
    pub service: &'a str,
    pub url: &'a str,
    pub bearer: Option<&'a str>,
    pub max_retries: u32,
}

impl JsonEndpoint<'_> {
    /// POST `body` and return the parsed JSON response.
    pub async fn post(
        &self,
        client: &reqwest::Client,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                debug!(service = self.service, attempt, ?delay, "retrying request");
                tokio::time::sleep(delay).await;
            }

            let mut request = client
                .post(self.url)
                .header("Content-Type", "application/json")
                .json(body);
            if let Some(token) = self.bearer {
                request = request.header("Authorization", format!("Bearer {}", token));
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response.json().await.map_err(|e| {
                            anyhow!("Invalid {} response: {}", self.service, e)
                        });
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(service = self.service, %status, "transient API error");
                        last_err = Some(anyhow!(
                            "{} API error {}: {}",
                            self.service,
                            status,
                            body_text
                        ));
                        continue;
                    }

                    bail!("{} API error {}: {}", self.service, status, body_text);
                }
                Err(e) => {
                    warn!(service = self.service, error = %e, "request failed");
                    last_err = Some(anyhow!(
                        "{} connection error ({}): {}",
                        self.service,
                        self.url,
                        e
                    ));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("{} request failed after retries", self.service)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(4), Duration::from_secs(8));
        assert_eq!(backoff_delay(6), Duration::from_secs(32));
        assert_eq!(backoff_delay(20), Duration::from_secs(32));
    }

    #[tokio::test]
    async fn test_success_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/echo"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/echo", server.uri());
        let endpoint = JsonEndpoint {
            service: "Test",
            url: &url,
            bearer: Some("sk-test"),
            max_retries: 0,
        };
        let client = client_with_timeout(5).unwrap();
        let json = endpoint.post(&client, &serde_json::json!({})).await.unwrap();
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let url = server.uri();
        let endpoint = JsonEndpoint {
            service: "Test",
            url: &url,
            bearer: None,
            max_retries: 3,
        };
        let client = client_with_timeout(5).unwrap();
        let err = endpoint
            .post(&client, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_server_error_retried_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"n": 2})))
            .mount(&server)
            .await;

        let url = server.uri();
        let endpoint = JsonEndpoint {
            service: "Test",
            url: &url,
            bearer: None,
            max_retries: 1,
        };
        let client = client_with_timeout(5).unwrap();
        let json = endpoint.post(&client, &serde_json::json!({})).await.unwrap();
        assert_eq!(json["n"], 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted_reports_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let url = server.uri();
        let endpoint = JsonEndpoint {
            service: "Test",
            url: &url,
            bearer: None,
            max_retries: 0,
        };
        let client = client_with_timeout(5).unwrap();
        let err = endpoint
            .post(&client, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
