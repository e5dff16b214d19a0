//! Anti-forgery token extraction.
//!
//! Every HTML page rendered by the platform embeds the current CSRF nonce in
//! an inline script block (`'csrfNonce': "…",`). Rendering a new page rotates
//! the value, so callers must extract it from the most recent fetch.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static NONCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'csrfNonce': "([a-z0-9]+)","#).unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonceError {
    #[error("anti-forgery token not found in page")]
    TokenNotFound,
}

/// Locate the anti-forgery token embedded in `body`.
///
/// When the pattern appears more than once the first occurrence wins. The
/// platform only renders one nonce per page, so duplicates come from cached
/// fragments and the leading one is the live value.
pub fn extract_nonce(body: &str) -> Result<String, NonceError> {
    NONCE_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(NonceError::TokenNotFound)
}
