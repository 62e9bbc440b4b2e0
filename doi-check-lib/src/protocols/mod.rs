//! Network protocol implementations for DOI checking.
//!
//! This module contains the HTTP transport seam, the Crossref registry
//! client and the doi.org resolution checker.

/// HTTP transport abstraction and its reqwest implementation
pub mod http;

/// Crossref works listing (DOI enumeration)
pub mod crossref;

/// doi.org resolution probing
pub mod resolver;

// Re-export commonly used types
pub use crossref::RegistryClient;
pub use http::{HttpTransport, Probe, ReqwestTransport, TextResponse};
pub use resolver::ResolverClient;
