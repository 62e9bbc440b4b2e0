//! DOI resolution checker.
//!
//! Probes `<resolver>/<doi>` with a redirect-following GET and turns whatever
//! happens into a [`ResolutionResult`]. Transport failures are retried a fixed
//! number of times with a fixed pause; a received response of any status is
//! final.

use crate::protocols::http::HttpTransport;
use crate::types::{CheckConfig, Doi, ResolutionResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Checks whether individual DOIs resolve.
#[derive(Clone)]
pub struct ResolverClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ResolverClient {
    /// Create a resolver client from the run configuration.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &CheckConfig) -> Self {
        Self {
            transport,
            base_url: config.resolver_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        }
    }

    /// Canonical resolution URL for a DOI.
    ///
    /// The DOI goes into the path with URL-reserved characters escaped, so a
    /// suffix containing `#` or `?` is sent whole. `/` is kept as is.
    pub fn resolution_url(&self, doi: &Doi) -> String {
        format!("{}/{}", self.base_url, encode_doi_path(doi.as_str()))
    }

    /// Check one DOI. Never fails: errors end up inside the result.
    ///
    /// Makes at most `max_retries + 1` attempts. Only transport errors are
    /// retried; a 404 or 500 is recorded after a single attempt.
    pub async fn check(&self, doi: &Doi) -> ResolutionResult {
        let url = self.resolution_url(doi);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.transport.probe(&url, self.timeout).await {
                Ok(probe) => {
                    debug!(%doi, status = probe.status, final_url = %probe.final_url, attempt, "resolved");
                    return ResolutionResult::from_response(
                        doi.clone(),
                        probe.final_url,
                        probe.status,
                        attempt,
                    );
                }
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    warn!(%doi, attempt, error = %e, "resolution attempt failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    warn!(%doi, attempt, error = %e, "giving up on DOI");
                    return ResolutionResult::unreachable(doi.clone(), attempt);
                }
            }
        }
    }
}

/// Percent-encode the characters that cannot appear raw in a URL path.
fn encode_doi_path(doi: &str) -> String {
    let mut out = String::with_capacity(doi.len());
    for byte in doi.bytes() {
        match byte {
            b'%' | b'#' | b'?' | b'"' | b' ' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{'
            | b'|' | b'}' => out.push_str(&format!("%{:02X}", byte)),
            0x00..=0x1F | 0x7F..=0xFF => out.push_str(&format!("%{:02X}", byte)),
            _ => out.push(byte as char),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DoiCheckError;
    use crate::protocols::http::{Probe, TextResponse};
    use crate::types::HttpStatus;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed sequence of probe outcomes and counts calls.
    struct Scripted {
        outcomes: Mutex<VecDeque<Result<Probe, DoiCheckError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<Probe, DoiCheckError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for Scripted {
        async fn get_text(&self, _: &str, _: Duration) -> Result<TextResponse, DoiCheckError> {
            unreachable!("resolver never reads bodies")
        }

        async fn probe(&self, url: &str, _: Duration) -> Result<Probe, DoiCheckError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(DoiCheckError::network("script exhausted")))
        }
    }

    fn landed(status: u16, url: &str) -> Result<Probe, DoiCheckError> {
        Ok(Probe {
            status,
            final_url: url.to_string(),
        })
    }

    fn fast_config() -> CheckConfig {
        CheckConfig::default()
            .with_retry_delay(Duration::ZERO)
            .with_max_retries(3)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let transport = Scripted::new(vec![landed(200, "https://journal.example/a")]);
        let resolver = ResolverClient::new(transport.clone(), &fast_config());

        let result = resolver.check(&Doi::new("10.1234/a")).await;

        assert!(result.resolved);
        assert_eq!(result.status, HttpStatus::Code(200));
        assert_eq!(result.resolved_url, "https://journal.example/a");
        assert_eq!(transport.calls(), vec!["https://doi.org/10.1234/a"]);
    }

    #[tokio::test]
    async fn test_http_404_is_final_without_retry() {
        let transport = Scripted::new(vec![landed(404, "https://doi.org/10.1234/missing")]);
        let resolver = ResolverClient::new(transport.clone(), &fast_config());

        let result = resolver.check(&Doi::new("10.1234/missing")).await;

        assert!(!result.resolved);
        assert_eq!(result.status, HttpStatus::Code(404));
        assert_eq!(result.attempts, 1);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let transport = Scripted::new(vec![landed(503, "https://publisher.example/x")]);
        let resolver = ResolverClient::new(transport.clone(), &fast_config());

        let result = resolver.check(&Doi::new("10.1234/x")).await;

        assert!(!result.resolved);
        assert_eq!(result.status, HttpStatus::Code(503));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failures_exhaust_into_sentinel() {
        let transport = Scripted::new(vec![
            Err(DoiCheckError::network("connection refused")),
            Err(DoiCheckError::timeout("GET", Duration::from_secs(10))),
            Err(DoiCheckError::network("connection reset")),
            Err(DoiCheckError::timeout("GET", Duration::from_secs(10))),
            landed(200, "https://never.example"),
        ]);
        let resolver = ResolverClient::new(transport.clone(), &fast_config());

        let result = resolver.check(&Doi::new("10.1234/flaky")).await;

        assert_eq!(result.resolved_url, "Timeout/Error");
        assert!(!result.resolved);
        assert_eq!(result.status, HttpStatus::TimeoutOrError);
        assert_eq!(result.attempts, 4);
        assert_eq!(transport.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let transport = Scripted::new(vec![
            Err(DoiCheckError::network("connection reset")),
            landed(302, "https://publisher.example/landing"),
        ]);
        let resolver = ResolverClient::new(transport.clone(), &fast_config());

        let result = resolver.check(&Doi::new("10.1234/b")).await;

        assert!(result.resolved);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_zero_retries_means_single_attempt() {
        let transport = Scripted::new(vec![Err(DoiCheckError::network("down"))]);
        let config = fast_config().with_max_retries(0);
        let resolver = ResolverClient::new(transport.clone(), &config);

        let result = resolver.check(&Doi::new("10.1234/c")).await;

        assert_eq!(result.status, HttpStatus::TimeoutOrError);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delay_between_attempts() {
        let transport = Scripted::new(vec![
            Err(DoiCheckError::network("down")),
            Err(DoiCheckError::network("down")),
            landed(200, "https://ok.example"),
        ]);
        let config = CheckConfig::default().with_retry_delay(Duration::from_secs(2));
        let resolver = ResolverClient::new(transport, &config);

        let start = tokio::time::Instant::now();
        let result = resolver.check(&Doi::new("10.1234/d")).await;

        assert!(result.resolved);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs(5), "{:?}", elapsed);
    }

    #[test]
    fn test_resolution_url_trims_trailing_slash() {
        let transport = Scripted::new(vec![]);
        let config = CheckConfig::default().with_resolver_url("https://doi.org/");
        let resolver = ResolverClient::new(transport, &config);
        assert_eq!(
            resolver.resolution_url(&Doi::new("10.1234/x")),
            "https://doi.org/10.1234/x"
        );
    }

    #[test]
    fn test_resolution_url_keeps_sici_suffix_out_of_fragment() {
        let transport = Scripted::new(vec![]);
        let resolver = ResolverClient::new(transport, &CheckConfig::default());
        let doi = Doi::new("10.1002/(SICI)1097-4636(199707)36:1<56::AID-JBM7>3.0.CO;2-#");

        let url = resolver.resolution_url(&doi);
        assert_eq!(
            url,
            "https://doi.org/10.1002/(SICI)1097-4636(199707)36:1%3C56::AID-JBM7%3E3.0.CO;2-%23"
        );

        let parsed = reqwest::Url::parse(&url).unwrap();
        assert_eq!(parsed.fragment(), None);
        assert!(parsed.path().ends_with("CO;2-%23"));
    }

    #[test]
    fn test_encode_doi_path_escapes_reserved_characters() {
        assert_eq!(encode_doi_path("10.1234/a?b%c d\"e"), "10.1234/a%3Fb%25c%20d%22e");
        assert_eq!(encode_doi_path("10.1234/é"), "10.1234/%C3%A9");
        assert_eq!(encode_doi_path("10.1234/plain.1-2_3;(x)"), "10.1234/plain.1-2_3;(x)");
    }
}
