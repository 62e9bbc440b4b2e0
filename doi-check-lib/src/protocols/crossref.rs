//! Crossref registry client.
//!
//! Enumerates every DOI registered under a prefix through the paginated
//! `/works?filter=prefix:...` listing. Pages are fetched strictly one after
//! another with a fixed pause in between. No other rate negotiation is done.

use crate::error::DoiCheckError;
use crate::protocols::http::HttpTransport;
use crate::types::{CheckConfig, Doi};
use crate::utils::validate_prefix;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct WorksResponse {
    message: WorksMessage,
}

#[derive(Debug, Deserialize)]
struct WorksMessage {
    #[serde(default)]
    items: Vec<WorkItem>,
}

#[derive(Debug, Deserialize)]
struct WorkItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
}

/// Client for the Crossref works listing.
#[derive(Clone)]
pub struct RegistryClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    page_size: usize,
    page_delay: Duration,
    timeout: Duration,
    mailto: Option<String>,
}

impl RegistryClient {
    /// Create a registry client from the run configuration.
    pub fn new(transport: Arc<dyn HttpTransport>, config: &CheckConfig) -> Self {
        Self {
            transport,
            base_url: config.registry_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
            page_delay: config.page_delay,
            timeout: config.registry_timeout,
            mailto: config.mailto.clone(),
        }
    }

    /// URL of the listing page starting at `offset`.
    pub fn page_url(&self, prefix: &str, offset: usize) -> String {
        let mut url = format!(
            "{}/works?filter=prefix:{}&rows={}&offset={}",
            self.base_url, prefix, self.page_size, offset
        );
        if let Some(mailto) = &self.mailto {
            url.push_str("&mailto=");
            url.push_str(&encode_query_value(mailto));
        }
        url
    }

    /// Fetch every DOI registered under `prefix`, in registry order.
    ///
    /// Starts at offset 0 and advances by the page size until a page comes
    /// back empty. Any non-200 page aborts the whole fetch: the DOIs read so
    /// far are dropped and `DoiCheckError::Registry` is returned, so callers
    /// never see a silently truncated list.
    pub async fn fetch_all(&self, prefix: &str) -> Result<Vec<Doi>, DoiCheckError> {
        let prefix = validate_prefix(prefix)?;
        let mut dois = Vec::new();
        let mut offset = 0usize;
        let mut page = 0usize;

        loop {
            let url = self.page_url(prefix, offset);
            debug!(%url, page, "requesting registry page");

            let response = self.transport.get_text(&url, self.timeout).await?;
            if response.status != 200 {
                warn!(prefix, status = response.status, page, "registry listing failed");
                return Err(DoiCheckError::registry(prefix, response.status));
            }

            let works: WorksResponse = serde_json::from_str(&response.body).map_err(|e| {
                DoiCheckError::ParseError {
                    message: format!("Invalid registry page at offset {}: {}", offset, e),
                    content: Some(truncate(&response.body, 200)),
                }
            })?;

            let items = works.message.items;
            if items.is_empty() {
                break;
            }

            let count = items.len();
            for item in items {
                match item.doi {
                    Some(doi) if !doi.trim().is_empty() => dois.push(Doi::new(doi)),
                    _ => warn!(prefix, offset, "registry item without a DOI skipped"),
                }
            }

            info!(prefix, page, count, total = dois.len(), "fetched registry page");

            offset += self.page_size;
            page += 1;
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(dois)
    }
}

/// Percent-encode a query value (RFC 3986 unreserved characters pass through).
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn truncate(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::http::{Probe, TextResponse};
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl HttpTransport for NeverCalled {
        async fn get_text(&self, url: &str, _: Duration) -> Result<TextResponse, DoiCheckError> {
            panic!("unexpected request to {}", url)
        }
        async fn probe(&self, url: &str, _: Duration) -> Result<Probe, DoiCheckError> {
            panic!("unexpected probe of {}", url)
        }
    }

    fn client(config: &CheckConfig) -> RegistryClient {
        RegistryClient::new(Arc::new(NeverCalled), config)
    }

    #[test]
    fn test_page_url_layout() {
        let config = CheckConfig::default().with_registry_url("https://api.crossref.org/");
        let url = client(&config).page_url("10.12345", 2000);
        assert_eq!(
            url,
            "https://api.crossref.org/works?filter=prefix:10.12345&rows=1000&offset=2000"
        );
    }

    #[test]
    fn test_page_url_appends_encoded_mailto() {
        let config = CheckConfig::default().with_mailto("sv+doi@example.org");
        let url = client(&config).page_url("10.12345", 0);
        assert!(url.ends_with("&mailto=sv%2Bdoi%40example.org"), "{}", url);
    }

    #[tokio::test]
    async fn test_invalid_prefix_fails_before_any_request() {
        let err = client(&CheckConfig::default())
            .fetch_all("not-a-prefix")
            .await
            .unwrap_err();
        assert!(matches!(err, DoiCheckError::InvalidPrefix { .. }));
    }

    #[test]
    fn test_works_response_tolerates_missing_items() {
        let works: WorksResponse = serde_json::from_str(r#"{"message": {}}"#).unwrap();
        assert!(works.message.items.is_empty());

        let works: WorksResponse =
            serde_json::from_str(r#"{"message": {"items": [{"DOI": "10.1/a"}, {"title": ["x"]}]}}"#)
                .unwrap();
        assert_eq!(works.message.items.len(), 2);
        assert_eq!(works.message.items[0].doi.as_deref(), Some("10.1/a"));
        assert!(works.message.items[1].doi.is_none());
    }
}
