//! Utility functions for DOI and prefix handling.
//!
//! Validation here is syntactic only. Whether a DOI is actually registered is
//! what the resolver check finds out.

use crate::error::DoiCheckError;
use crate::types::Doi;
use regex::Regex;

lazy_static::lazy_static! {
    /// Registrant prefix: "10." followed by a dotted numeric registrant code.
    static ref PREFIX_RE: Regex = Regex::new(r"^10\.\d{4,9}(\.\d+)*$").expect("valid prefix regex");

    /// Resolver / scheme noise people paste in front of a DOI.
    static ref DOI_NOISE_RE: Regex =
        Regex::new(r"(?i)^(https?://(dx\.)?doi\.org/|doi:\s*)").expect("valid doi noise regex");
}

/// Validate a DOI prefix such as `10.12345`.
///
/// Surrounding whitespace is ignored; the trimmed prefix is returned.
pub fn validate_prefix(prefix: &str) -> Result<&str, DoiCheckError> {
    let prefix = prefix.trim();

    if prefix.is_empty() {
        return Err(DoiCheckError::invalid_prefix(
            prefix,
            "Prefix cannot be empty",
        ));
    }

    if prefix.contains('/') {
        return Err(DoiCheckError::invalid_prefix(
            prefix,
            "Looks like a full DOI; pass only the part before '/'",
        ));
    }

    if !PREFIX_RE.is_match(prefix) {
        return Err(DoiCheckError::invalid_prefix(
            prefix,
            "Expected '10.' followed by a numeric registrant code (e.g. 10.12345)",
        ));
    }

    Ok(prefix)
}

/// Normalize a DOI typed or pasted by a user.
///
/// Strips `https://doi.org/`, `http://dx.doi.org/` and `doi:` forms and
/// requires a `10.xxxx/suffix` shape.
pub fn normalize_doi(input: &str) -> Result<Doi, DoiCheckError> {
    let trimmed = input.trim();
    let stripped = DOI_NOISE_RE.replace(trimmed, "");

    let (prefix, suffix) = stripped
        .split_once('/')
        .ok_or_else(|| DoiCheckError::invalid_doi(trimmed, "Missing '/' between prefix and suffix"))?;

    if suffix.trim().is_empty() {
        return Err(DoiCheckError::invalid_doi(trimmed, "Suffix cannot be empty"));
    }

    validate_prefix(prefix).map_err(|_| DoiCheckError::invalid_doi(trimmed, "Invalid prefix"))?;

    Ok(Doi::new(stripped.into_owned()))
}

/// Parse a newline separated DOI list.
///
/// Blank lines, `#` comment lines and whitespace-led trailing `#` comments
/// are skipped. Invalid lines are returned separately so callers can report
/// them without aborting.
pub fn parse_doi_list(content: &str) -> (Vec<Doi>, Vec<DoiCheckError>) {
    let mut dois = Vec::new();
    let mut invalid = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // Trailing comments need leading whitespace; '#' is legal inside a DOI suffix.
        let line = match line.find(" #").or_else(|| line.find("\t#")) {
            Some(idx) => line[..idx].trim_end(),
            None => line,
        };
        match normalize_doi(line) {
            Ok(doi) => dois.push(doi),
            Err(e) => invalid.push(e),
        }
    }

    (dois, invalid)
}
