//! HTTP fetching for the service loaders
//!
//! Loaders talk to the network only through the [`FetchClient`] trait, which
//! keeps the discovery pipeline testable with canned responses.

use crate::extract::{ExtractError, parse_json};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Response headers keyed by lowercase header name
pub type ResponseHeaders = HashMap<String, String>;

/// Errors that can occur while talking to a service
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request could not be sent or timed out
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The response body could not be read
    #[error("Failed to read response from {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Body and headers of a POST response.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub headers: ResponseHeaders,
    pub body: String,
}

impl FetchResponse {
    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, ExtractError> {
        parse_json(&self.body)
    }
}

/// Minimal HTTP surface the loaders need.
pub trait FetchClient {
    /// Performs a GET and returns the raw body.
    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<String, FetchError>;

    /// POSTs a JSON body and returns headers and body.
    fn post_json(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<FetchResponse, FetchError>;

    /// Performs an OPTIONS request and returns the response headers.
    fn get_options(&self, url: &Url, headers: &[(&str, &str)])
    -> Result<ResponseHeaders, FetchError>;
}

impl<T: FetchClient + ?Sized> FetchClient for &T {
    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<String, FetchError> {
        (**self).get(url, headers)
    }

    fn post_json(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<FetchResponse, FetchError> {
        (**self).post_json(url, headers, body)
    }

    fn get_options(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> Result<ResponseHeaders, FetchError> {
        (**self).get_options(url, headers)
    }
}

/// [`FetchClient`] backed by a blocking reqwest client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with the given user agent and request timeout.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Sends a prepared request and rejects non-success statuses.
    fn send(
        &self,
        url: &Url,
        request: reqwest::blocking::RequestBuilder,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::blocking::Response, FetchError> {
        let request = headers
            .iter()
            .fold(request, |request, (name, value)| request.header(*name, *value));

        let response = request.send().map_err(|e| FetchError::Request {
            url: url.to_string(),
            source: e,
        })?;

        debug!(url = %url, status = response.status().as_u16(), "response received");

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }
}

impl FetchClient for HttpFetcher {
    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<String, FetchError> {
        let response = self.send(url, self.client.get(url.as_str()), headers)?;
        response.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            source: e,
        })
    }

    fn post_json(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<FetchResponse, FetchError> {
        let response = self.send(url, self.client.post(url.as_str()).json(body), headers)?;
        let headers = collect_headers(response.headers());
        let body = response.text().map_err(|e| FetchError::Body {
            url: url.to_string(),
            source: e,
        })?;
        Ok(FetchResponse { headers, body })
    }

    fn get_options(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> Result<ResponseHeaders, FetchError> {
        let request = self.client.request(reqwest::Method::OPTIONS, url.as_str());
        let response = self.send(url, request, headers)?;
        Ok(collect_headers(response.headers()))
    }
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> ResponseHeaders {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}
