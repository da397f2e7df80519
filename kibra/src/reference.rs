//! Transaction reference extraction.
//!
//! Completion URLs usually carry the provider's transaction reference in a
//! `reference` query parameter. The query string is parsed as
//! `application/x-www-form-urlencoded`, so parameter order and percent
//! encoding do not matter. References that only appear in the fragment are
//! not picked up.

use url::Url;

/// Query parameter carrying the transaction reference.
pub const REFERENCE_PARAM: &str = "reference";

/// Returns the first non-empty `reference` query parameter of `url`.
///
/// Returns `None` if `url` does not parse or carries no such parameter.
#[must_use]
pub fn extract_reference(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, value)| key == REFERENCE_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Returns the reference from `url`, or `fallback` when the URL has none.
#[must_use]
pub fn resolve_reference(url: &str, fallback: Option<&str>) -> Option<String> {
    extract_reference(url).or_else(|| {
        fallback
            .filter(|f| !f.is_empty())
            .map(ToOwned::to_owned)
    })
}
