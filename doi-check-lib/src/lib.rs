//! # DOI Check Library
//!
//! Enumerates every DOI registered under a Crossref prefix and checks that
//! each one resolves through doi.org.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doi_check_lib::{DoiChecker, ResolutionResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DoiChecker::new()?;
//!     let dois = checker.fetch_dois("10.12345").await?;
//!
//!     let mut progress = |done: usize, total: usize, r: &ResolutionResult| {
//!         println!("[{}/{}] {} -> {}", done, total, r.doi, r.status);
//!     };
//!     let table = checker.check_dois(&dois, &mut progress).await;
//!
//!     std::fs::write("report.csv", table.to_csv())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pieces
//!
//! - **Registry client**: paginated Crossref listing with a fixed inter-page delay
//! - **Resolution checker**: redirect-following probe with fixed retries on transport errors
//! - **Resolution engine**: bounded concurrency, completion-order results, cancellation
//! - **Report**: summary counts, failure list and CSV export

// Re-export main public API types and functions
// This makes them available as doi_check_lib::TypeName
pub use checker::DoiChecker;
pub use concurrent::{NoopObserver, ResolutionEngine, RunObserver};
pub use config::{
    load_env_config, parse_duration_string, ConfigManager, DefaultsConfig, EndpointsConfig,
    EnvConfig, FileConfig, OutputConfig,
};
pub use error::DoiCheckError;
pub use protocols::{
    HttpTransport, Probe, RegistryClient, ReqwestTransport, ResolverClient, TextResponse,
};
pub use report::{summarize, to_csv, ReportTable, SummaryCounts, CSV_HEADER};
pub use types::{
    CheckConfig, Doi, HttpStatus, ResolutionResult, SUCCESS_STATUS_CODES, TIMEOUT_OR_ERROR,
};
pub use utils::{normalize_doi, parse_doi_list, validate_prefix};

// Re-exported so callers can cancel runs without naming tokio-util themselves
pub use tokio_util::sync::CancellationToken;

// Internal modules - these are not part of the public API
mod checker;
mod concurrent;
mod config;
mod error;
mod protocols;
mod report;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DoiCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default file name for a saved CSV report.
pub const DEFAULT_REPORT_FILE: &str = "resolved_urls_crossref.csv";
