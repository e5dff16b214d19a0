//! Error text extraction for HTML form endpoints.
//!
//! Form endpoints (setup, import, reset, login) answer failures by
//! re-rendering the page with an alert box instead of returning the JSON
//! envelope. The message lives in the first `span` of that alert.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use thiserror::Error;

static ALERT_SPAN: Lazy<Selector> = Lazy::new(|| Selector::parse(".alert span").unwrap());

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HtmlError {
    #[error("no alert message found in response body")]
    AlertNotFound,
}

/// Return the trimmed text of the first `span` inside an `.alert` element.
/// A blank span counts as no message.
pub fn extract_alert_message(body: &str) -> Result<String, HtmlError> {
    let document = Html::parse_document(body);
    document
        .select(&ALERT_SPAN)
        .next()
        .map(|span| span.text().collect::<String>().trim().to_string())
        .filter(|message| !message.is_empty())
        .ok_or(HtmlError::AlertNotFound)
}
