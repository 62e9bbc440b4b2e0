//! Core data types for DOI resolution checking.
//!
//! This module defines the data model shared by the registry client, the
//! resolution checker and the report builder, plus the run configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Marker written in place of a URL and a status code when no HTTP response
/// was ever received for a DOI.
pub const TIMEOUT_OR_ERROR: &str = "Timeout/Error";

/// Final status codes counted as "resolves".
///
/// 301 and 302 are kept for parity with the established report format even
/// though redirects are followed, so a final 3xx usually means the redirect
/// chain was cut short rather than that the DOI resolved.
pub const SUCCESS_STATUS_CODES: [u16; 3] = [200, 301, 302];

/// A Digital Object Identifier, e.g. `10.12345/abc.2020.1`.
///
/// Opaque: the only structure relied on is the `prefix/suffix` split.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Doi(String);

impl Doi {
    pub fn new<S: Into<String>>(doi: S) -> Self {
        Self(doi.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Registrant prefix (everything before the first '/').
    pub fn prefix(&self) -> &str {
        self.0.split_once('/').map(|(p, _)| p).unwrap_or(&self.0)
    }
}

impl fmt::Display for Doi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Doi {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Doi {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Doi {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Final HTTP status of a resolution, or the sentinel when none was received.
///
/// Serialized as a bare number for real codes and as `"Timeout/Error"` for
/// the sentinel, matching the CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StatusRepr", into = "StatusRepr")]
pub enum HttpStatus {
    /// A response was received with this status code
    Code(u16),
    /// Every attempt failed at the transport level (connect error, timeout)
    TimeoutOrError,
}

impl HttpStatus {
    /// Whether this status counts as a successful resolution.
    pub fn is_success(&self) -> bool {
        match self {
            HttpStatus::Code(code) => SUCCESS_STATUS_CODES.contains(code),
            HttpStatus::TimeoutOrError => false,
        }
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            HttpStatus::Code(code) => Some(*code),
            HttpStatus::TimeoutOrError => None,
        }
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpStatus::Code(code) => write!(f, "{}", code),
            HttpStatus::TimeoutOrError => f.write_str(TIMEOUT_OR_ERROR),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum StatusRepr {
    Code(u16),
    Text(String),
}

impl From<HttpStatus> for StatusRepr {
    fn from(status: HttpStatus) -> Self {
        match status {
            HttpStatus::Code(code) => StatusRepr::Code(code),
            HttpStatus::TimeoutOrError => StatusRepr::Text(TIMEOUT_OR_ERROR.to_string()),
        }
    }
}

impl TryFrom<StatusRepr> for HttpStatus {
    type Error = String;

    fn try_from(repr: StatusRepr) -> Result<Self, Self::Error> {
        match repr {
            StatusRepr::Code(code) => Ok(HttpStatus::Code(code)),
            StatusRepr::Text(text) if text == TIMEOUT_OR_ERROR => Ok(HttpStatus::TimeoutOrError),
            StatusRepr::Text(text) => Err(format!("unknown status marker '{}'", text)),
        }
    }
}

/// Outcome of checking one DOI against the resolver.
///
/// Produced exactly once per DOI by the resolution checker and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// The DOI that was checked
    pub doi: Doi,

    /// Final URL after following redirects, or `"Timeout/Error"`
    pub resolved_url: String,

    /// Whether the DOI resolves (final status in 200/301/302)
    pub resolved: bool,

    /// Final HTTP status, or the sentinel
    pub status: HttpStatus,

    /// Number of HTTP attempts made (1 unless transport errors were retried)
    pub attempts: u32,
}

impl ResolutionResult {
    /// Build a result from a received HTTP response.
    pub fn from_response<U: Into<String>>(doi: Doi, final_url: U, code: u16, attempts: u32) -> Self {
        let status = HttpStatus::Code(code);
        Self {
            doi,
            resolved_url: final_url.into(),
            resolved: status.is_success(),
            status,
            attempts,
        }
    }

    /// Build the terminal result for a DOI whose every attempt failed in transport.
    pub fn unreachable(doi: Doi, attempts: u32) -> Self {
        Self {
            doi,
            resolved_url: TIMEOUT_OR_ERROR.to_string(),
            resolved: false,
            status: HttpStatus::TimeoutOrError,
            attempts,
        }
    }
}

/// Configuration options for a DOI check run.
///
/// Defaults mirror the registry's informal expectations (1000 rows per page,
/// one second between pages) and the resolver probe policy (10 s per
/// attempt, 3 retries two seconds apart, 10 workers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Maximum number of concurrent resolution checks
    /// Default: 10, Range: 1-100
    pub concurrency: usize,

    /// Timeout for each resolution attempt
    #[serde(skip)]
    pub timeout: Duration,

    /// Retries after a transport failure (total attempts = max_retries + 1)
    pub max_retries: u32,

    /// Fixed delay between resolution attempts
    #[serde(skip)]
    pub retry_delay: Duration,

    /// Rows requested per registry page
    pub page_size: usize,

    /// Fixed delay between registry pages
    #[serde(skip)]
    pub page_delay: Duration,

    /// Timeout for each registry page request
    #[serde(skip)]
    pub registry_timeout: Duration,

    /// Base URL of the Crossref REST API
    pub registry_url: String,

    /// Base URL of the DOI resolver
    pub resolver_url: String,

    /// Contact address sent to Crossref (polite pool)
    pub mailto: Option<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            page_size: 1000,
            page_delay: Duration::from_secs(1),
            registry_timeout: Duration::from_secs(30),
            registry_url: "https://api.crossref.org".to_string(),
            resolver_url: "https://doi.org".to_string(),
            mailto: None,
        }
    }
}

impl CheckConfig {
    /// Set concurrency, capped at 100 to prevent resource exhaustion.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 100);
        self
    }

    /// Set the per-attempt resolution timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_registry_url<S: Into<String>>(mut self, url: S) -> Self {
        self.registry_url = url.into();
        self
    }

    pub fn with_resolver_url<S: Into<String>>(mut self, url: S) -> Self {
        self.resolver_url = url.into();
        self
    }

    pub fn with_mailto<S: Into<String>>(mut self, mailto: S) -> Self {
        self.mailto = Some(mailto.into());
        self
    }

    /// User-Agent sent with every request.
    pub fn user_agent(&self) -> String {
        match &self.mailto {
            Some(mailto) => format!(
                "doi-check/{} (mailto:{})",
                env!("CARGO_PKG_VERSION"),
                mailto
            ),
            None => format!("doi-check/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_classification() {
        for code in [200, 301, 302] {
            assert!(HttpStatus::Code(code).is_success(), "{} should resolve", code);
        }
        for code in [201, 204, 303, 307, 308, 403, 404, 410, 500, 503] {
            assert!(!HttpStatus::Code(code).is_success(), "{} should not resolve", code);
        }
        assert!(!HttpStatus::TimeoutOrError.is_success());
    }

    #[test]
    fn test_unreachable_result_uses_sentinel() {
        let result = ResolutionResult::unreachable(Doi::new("10.1/x"), 4);
        assert_eq!(result.resolved_url, "Timeout/Error");
        assert_eq!(result.status.to_string(), "Timeout/Error");
        assert!(!result.resolved);
        assert_eq!(result.attempts, 4);
    }

    #[test]
    fn test_from_response_classifies() {
        let ok = ResolutionResult::from_response(Doi::new("10.1/a"), "https://a.example", 200, 1);
        assert!(ok.resolved);
        let missing = ResolutionResult::from_response(Doi::new("10.1/b"), "https://b.example", 404, 1);
        assert!(!missing.resolved);
        assert_eq!(missing.status, HttpStatus::Code(404));
    }

    #[test]
    fn test_status_serializes_as_number_or_marker() {
        let json = serde_json::to_string(&HttpStatus::Code(404)).unwrap();
        assert_eq!(json, "404");
        let json = serde_json::to_string(&HttpStatus::TimeoutOrError).unwrap();
        assert_eq!(json, "\"Timeout/Error\"");
        let back: HttpStatus = serde_json::from_str("\"Timeout/Error\"").unwrap();
        assert_eq!(back, HttpStatus::TimeoutOrError);
        assert!(serde_json::from_str::<HttpStatus>("\"nope\"").is_err());
    }

    #[test]
    fn test_doi_prefix() {
        assert_eq!(Doi::new("10.12345/abc/def").prefix(), "10.12345");
        assert_eq!(Doi::new("10.12345").prefix(), "10.12345");
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(CheckConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(CheckConfig::default().with_concurrency(500).concurrency, 100);
    }

    #[test]
    fn test_user_agent_includes_mailto() {
        let config = CheckConfig::default().with_mailto("ops@example.org");
        assert!(config.user_agent().contains("mailto:ops@example.org"));
        assert!(!CheckConfig::default().user_agent().contains("mailto"));
    }
}
