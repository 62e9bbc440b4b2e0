//! Main DOI checker implementation.
//!
//! `DoiChecker` wires the registry client, the resolution checker and the
//! concurrent engine together behind one configuration.

use crate::concurrent::{ResolutionEngine, RunObserver};
use crate::error::DoiCheckError;
use crate::protocols::{HttpTransport, RegistryClient, ReqwestTransport, ResolverClient};
use crate::report::ReportTable;
use crate::types::{CheckConfig, Doi, ResolutionResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Enumerates DOIs under a prefix and checks that each one resolves.
///
/// # Example
///
/// ```rust,no_run
/// use doi_check_lib::{DoiChecker, NoopObserver};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DoiChecker::new()?;
///     let table = checker.check_prefix("10.12345", &mut NoopObserver).await?;
///     let summary = table.summarize();
///     println!("{} resolve, {} do not", summary.resolved, summary.unresolved);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DoiChecker {
    /// Configuration settings for this checker instance
    config: CheckConfig,
    /// Crossref listing client
    registry: RegistryClient,
    /// Bounded-concurrency engine around the resolver client
    engine: ResolutionEngine,
}

impl DoiChecker {
    /// Create a checker with default configuration.
    ///
    /// Default settings:
    /// - Concurrency: 10
    /// - Timeout: 10 seconds per attempt
    /// - Retries: 3, two seconds apart
    /// - Registry pages: 1000 rows, one second apart
    pub fn new() -> Result<Self, DoiCheckError> {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom configuration over a real HTTP client.
    ///
    /// # Example
    ///
    /// ```rust
    /// use doi_check_lib::{CheckConfig, DoiChecker};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_concurrency(20)
    ///     .with_timeout(Duration::from_secs(5))
    ///     .with_mailto("ops@example.org");
    ///
    /// let checker = DoiChecker::with_config(config).unwrap();
    /// assert_eq!(checker.config().concurrency, 20);
    /// ```
    pub fn with_config(config: CheckConfig) -> Result<Self, DoiCheckError> {
        let transport = ReqwestTransport::new(&config.user_agent())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a checker over any [`HttpTransport`].
    pub fn with_transport(config: CheckConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let registry = RegistryClient::new(transport.clone(), &config);
        let engine = ResolutionEngine::new(ResolverClient::new(transport, &config));
        Self {
            config,
            registry,
            engine,
        }
    }

    /// Fetch every DOI registered under `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `DoiCheckError` if the prefix is malformed, the registry
    /// answers with a non-200 status, the network fails, or a page cannot be
    /// parsed. No partial list is returned.
    pub async fn fetch_dois(&self, prefix: &str) -> Result<Vec<Doi>, DoiCheckError> {
        self.registry.fetch_all(prefix).await
    }

    /// Check a single DOI.
    pub async fn check_doi(&self, doi: &Doi) -> ResolutionResult {
        self.engine.resolver().check(doi).await
    }

    /// Check a list of DOIs with the configured concurrency.
    pub async fn check_dois<O>(&self, dois: &[Doi], observer: &mut O) -> ReportTable
    where
        O: RunObserver + ?Sized,
    {
        self.engine
            .run_all(dois, self.config.concurrency, observer)
            .await
    }

    /// Check a list of DOIs, stopping early when `cancel` fires.
    pub async fn check_dois_with_cancel<O>(
        &self,
        dois: &[Doi],
        cancel: &CancellationToken,
        observer: &mut O,
    ) -> ReportTable
    where
        O: RunObserver + ?Sized,
    {
        self.engine
            .run_all_with_cancel(dois, self.config.concurrency, cancel, observer)
            .await
    }

    /// Fetch all DOIs under `prefix` and check them.
    ///
    /// A registry failure ends the run before any DOI is checked.
    pub async fn check_prefix<O>(&self, prefix: &str, observer: &mut O) -> Result<ReportTable, DoiCheckError>
    where
        O: RunObserver + ?Sized,
    {
        let dois = self.fetch_dois(prefix).await?;
        Ok(self.check_dois(&dois, observer).await)
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }
}
