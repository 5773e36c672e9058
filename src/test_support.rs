//! Test doubles for the network, terminal and downloader seams.

use crate::downloader::{DownloadError, Downloader, PassthroughOptions};
use crate::fetch::{FetchClient, FetchError, FetchResponse, ResponseHeaders};
use crate::selection::{SelectionError, Selector};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use url::Url;

/// Serves canned bodies keyed by full URL; anything else is a 404.
#[derive(Debug, Default)]
pub(crate) struct FakeFetcher {
    gets: HashMap<String, String>,
    posts: HashMap<String, FetchResponse>,
    options: HashMap<String, ResponseHeaders>,
    requests: RefCell<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_get(mut self, url: &str, body: impl Into<String>) -> Self {
        self.gets.insert(url.to_string(), body.into());
        self
    }

    pub fn with_post(mut self, url: &str, body: impl Into<String>) -> Self {
        self.posts.insert(
            url.to_string(),
            FetchResponse {
                headers: ResponseHeaders::new(),
                body: body.into(),
            },
        );
        self
    }

    pub fn with_options(mut self, url: &str, headers: &[(&str, &str)]) -> Self {
        self.options.insert(
            url.to_string(),
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
        self
    }

    /// Every request made so far, as `"METHOD url"`.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    fn record(&self, method: &str, url: &Url) {
        self.requests.borrow_mut().push(format!("{} {}", method, url));
    }
}

fn not_found(url: &Url) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: 404,
    }
}

impl FetchClient for FakeFetcher {
    fn get(&self, url: &Url, _headers: &[(&str, &str)]) -> Result<String, FetchError> {
        self.record("GET", url);
        self.gets.get(url.as_str()).cloned().ok_or_else(|| not_found(url))
    }

    fn post_json(
        &self,
        url: &Url,
        headers: &[(&str, &str)],
        _body: &Value,
    ) -> Result<FetchResponse, FetchError> {
        self.record("POST", url);
        // Echo the request id so tests can see the warm-up was honoured
        let mut response = self.posts.get(url.as_str()).cloned().ok_or_else(|| not_found(url))?;
        if let Some((_, id)) = headers.iter().find(|(name, _)| *name == "x-request-id") {
            response.headers.insert("x-request-id".to_string(), id.to_string());
        }
        Ok(response)
    }

    fn get_options(
        &self,
        url: &Url,
        _headers: &[(&str, &str)],
    ) -> Result<ResponseHeaders, FetchError> {
        self.record("OPTIONS", url);
        self.options.get(url.as_str()).cloned().ok_or_else(|| not_found(url))
    }
}

/// Answers selections from queued scripts and remembers what was shown.
#[derive(Debug, Default)]
pub(crate) struct ScriptedSelector {
    single: VecDeque<Option<usize>>,
    multiple: VecDeque<Vec<usize>>,
    pub shown: Vec<Vec<String>>,
}

impl ScriptedSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_select(mut self, choice: Option<usize>) -> Self {
        self.single.push_back(choice);
        self
    }

    pub fn then_select_multiple(mut self, choices: Vec<usize>) -> Self {
        self.multiple.push_back(choices);
        self
    }
}

impl Selector for ScriptedSelector {
    fn select(&mut self, _prompt: &str, labels: &[String]) -> Result<Option<usize>, SelectionError> {
        self.shown.push(labels.to_vec());
        Ok(self.single.pop_front().flatten())
    }

    fn select_multiple(
        &mut self,
        _prompt: &str,
        labels: &[String],
        _min_count: usize,
    ) -> Result<Vec<usize>, SelectionError> {
        self.shown.push(labels.to_vec());
        Ok(self.multiple.pop_front().unwrap_or_default())
    }
}

/// One recorded downloader call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DownloadCall {
    pub service: String,
    pub flags: Vec<String>,
    pub url: String,
}

/// Records download requests instead of running anything.
#[derive(Debug, Default)]
pub(crate) struct RecordingDownloader {
    pub calls: Vec<DownloadCall>,
    fail: bool,
}

impl RecordingDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// A downloader whose binary can never be started.
    pub fn failing() -> Self {
        Self {
            calls: Vec::new(),
            fail: true,
        }
    }

    pub fn urls(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.url.as_str()).collect()
    }
}

impl Downloader for RecordingDownloader {
    fn download(
        &mut self,
        service: &str,
        options: &PassthroughOptions,
        url: &Url,
    ) -> Result<(), DownloadError> {
        if self.fail {
            return Err(DownloadError::Spawn {
                binary: "devine".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        self.calls.push(DownloadCall {
            service: service.to_string(),
            flags: options.flags().to_vec(),
            url: url.to_string(),
        });
        Ok(())
    }
}
