//! Helpers for pulling JSON out of upstream payloads
//!
//! Some services embed the initial page state in a `<script>` tag of the HTML
//! page, others answer with plain JSON. Both end up as a `serde_json::Value`.

use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while extracting JSON from a payload
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No script tag with the requested id exists in the document
    #[error("No <script id=\"{0}\"> found in page")]
    ScriptNotFound(String),

    /// The script id cannot be turned into a CSS selector
    #[error("Invalid script id '{0}'")]
    InvalidScriptId(String),

    /// The payload is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Extracts and parses the JSON held by `<script id="{id}">`.
///
/// # Examples
///
/// ```ignore
/// let state = extract_script_json(&html, "__NEXT_DATA__")?;
/// let name = state.pointer("/props/pageProps/data/programmeHeader/name");
/// ```
pub fn extract_script_json(html: &str, id: &str) -> Result<Value, ExtractError> {
    let selector = Selector::parse(&format!("script#{}", id))
        .map_err(|_| ExtractError::InvalidScriptId(id.to_string()))?;

    let document = Html::parse_document(html);
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ExtractError::ScriptNotFound(id.to_string()))?;

    let body: String = script.text().collect();
    Ok(serde_json::from_str(body.trim())?)
}

/// Parses a raw JSON body.
pub fn parse_json(body: &str) -> Result<Value, ExtractError> {
    Ok(serde_json::from_str(body)?)
}

/// Flattens an HTML fragment to a single line of plain text.
pub fn html_to_text(fragment: &str) -> String {
    nanohtml2text::html2text(fragment)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
