//! Resolution driver
//!
//! The [`Resolver`] turns a mode and a term into downloader invocations. It
//! walks the stages search → expansion → final selection (or category →
//! re-entry) against one [`SeriesDiscoverable`] service, asking the user
//! through a [`Selector`] and handing the chosen URLs to a [`Downloader`].
//!
//! Stage failures never escape [`Resolver::resolve`]. They are reported as
//! [`ProgressEvent::NoValidData`] and end the run with [`Outcome::Aborted`].

mod category;
mod expansion;
mod final_selection;
mod search;

use crate::catalog::Catalog;
use crate::downloader::{Downloader, PassthroughOptions};
use crate::field_map::RecordError;
use crate::selection::{SelectionError, Selector};
use crate::services::{SeriesDiscoverable, StageError, series_slug};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

/// How the term of a request is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The term is a programme page URL; its series slug becomes the search query
    Greedy,
    /// The term is a playable URL and is downloaded as it is
    Direct,
    /// The term is a category listing URL to browse
    Category,
    /// The term is a search query
    Keyword,
}

impl TryFrom<u8> for Mode {
    type Error = ResolveError;

    /// Maps the numeric mode codes used by the front end.
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Mode::Greedy),
            1 => Ok(Mode::Direct),
            2 => Ok(Mode::Category),
            3 => Ok(Mode::Keyword),
            other => Err(ResolveError::UnknownMode(other)),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    /// Accepts a mode name (`keyword`, `direct`, ...) or its numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u8>() {
            return Mode::try_from(code).map_err(|e| e.to_string());
        }
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(Mode::Greedy),
            "direct" => Ok(Mode::Direct),
            "category" => Ok(Mode::Category),
            "keyword" => Ok(Mode::Keyword),
            other => Err(format!("Unknown mode: {}", other)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Greedy => "greedy",
            Mode::Direct => "direct",
            Mode::Category => "category",
            Mode::Keyword => "keyword",
        };
        f.write_str(name)
    }
}

/// One top-level request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub mode: Mode,
    pub term: String,
    /// Category name shown when browsing a listing
    pub category: Option<String>,
}

impl ResolveRequest {
    pub fn new(mode: Mode, term: impl Into<String>) -> Self {
        Self {
            mode,
            term: term.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Values fixed for one top-level invocation and shared by every stage,
/// including re-entrant resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub options: PassthroughOptions,
}

impl RunContext {
    pub fn new(options: PassthroughOptions) -> Self {
        Self { options }
    }
}

/// Pipeline stage, used to report where a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Search,
    Category,
    Expansion,
    FinalSelection,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Search => "search",
            Stage::Category => "category",
            Stage::Expansion => "episode listing",
            Stage::FinalSelection => "episode selection",
        };
        f.write_str(name)
    }
}

/// How a resolve ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Downloads were started for these URLs, in order
    Dispatched(Vec<Url>),
    /// The user made no selection
    Cancelled,
    /// The service found nothing for the query
    NoMatches,
    /// A stage ended early on bad or missing upstream data
    Aborted { stage: Stage, reason: String },
}

/// Errors that end a top-level resolve call
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The term does not fit the requested mode
    #[error("'{term}' is not valid input for {mode} mode")]
    MalformedInput { mode: Mode, term: String },

    /// The numeric mode code is not supported
    #[error("Unknown mode code: {0}")]
    UnknownMode(u8),

    /// The selection prompt failed
    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),
}

/// User-visible progress of a resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A search query is being sent
    Searching { service: String, query: String },

    /// Search results were grouped into this many series
    SeriesFound { count: usize },

    /// The service reported no results
    NoMatches { query: String },

    /// A stage ended because upstream data was missing or unreadable
    NoValidData { stage: Stage, reason: String },

    /// One upstream record could not be used
    RecordSkipped { reason: String },

    /// Episodes are ready for selection
    EpisodesCollected { series: String, count: usize },

    /// The user cancelled a selection
    NothingSelected,

    /// A chosen entry had no URL and was skipped
    MissingUrl { label: String },

    /// A download is being handed to the downloader
    Dispatching { url: Url },

    /// The downloader could not be started for a URL
    DispatchFailed { url: Url, reason: String },

    /// The resolve is complete
    Finished { dispatched: usize },
}

/// Drives one service through the stages of a resolve.
pub struct Resolver<'a> {
    service: &'a dyn SeriesDiscoverable,
    selector: &'a mut dyn Selector,
    downloader: &'a mut dyn Downloader,
    progress: &'a mut dyn FnMut(ProgressEvent),
    catalog: Catalog,
}

impl<'a> Resolver<'a> {
    pub fn new(
        service: &'a dyn SeriesDiscoverable,
        selector: &'a mut dyn Selector,
        downloader: &'a mut dyn Downloader,
        progress: &'a mut dyn FnMut(ProgressEvent),
    ) -> Self {
        Self {
            service,
            selector,
            downloader,
            progress,
            catalog: Catalog::new(),
        }
    }

    /// Runs one top-level request to completion.
    ///
    /// Returns `Err` only for input that does not fit the mode and for
    /// failing selection prompts; everything else is an [`Outcome`].
    pub fn resolve(
        &mut self,
        request: &ResolveRequest,
        context: &RunContext,
    ) -> Result<Outcome, ResolveError> {
        info!(
            service = self.service.name(),
            mode = %request.mode,
            term = %request.term,
            "resolving"
        );

        let outcome = self.resolve_inner(request, context)?;

        let dispatched = match &outcome {
            Outcome::Dispatched(urls) => urls.len(),
            _ => 0,
        };
        self.emit(ProgressEvent::Finished { dispatched });
        Ok(outcome)
    }

    /// Mode dispatch, also used for re-entry from the category stage.
    fn resolve_inner(
        &mut self,
        request: &ResolveRequest,
        context: &RunContext,
    ) -> Result<Outcome, ResolveError> {
        match request.mode {
            Mode::Direct => {
                let url = url_term(request)?;
                Ok(self.dispatch(&[url], context))
            }
            Mode::Keyword => {
                self.catalog.clear();
                self.search_stage(&request.term, context)
            }
            Mode::Greedy => {
                let url = url_term(request)?;
                let query = greedy_search_term(&url).ok_or_else(|| malformed(request))?;
                self.catalog.clear();
                self.search_stage(&query, context)
            }
            Mode::Category => {
                let url = url_term(request)?;
                self.category_stage(&url, request.category.as_deref(), context)
            }
        }
    }

    fn emit(&mut self, event: ProgressEvent) {
        (self.progress)(event);
    }

    /// Converts a stage failure into the outcome of the run.
    fn abort(&mut self, stage: Stage, error: StageError) -> Outcome {
        match error {
            StageError::NoMatch(query) => {
                info!(query = %query, "no matches");
                self.emit(ProgressEvent::NoMatches { query });
                Outcome::NoMatches
            }
            other => {
                let reason = other.to_string();
                warn!(stage = %stage, error = %reason, "stage aborted");
                self.emit(ProgressEvent::NoValidData {
                    stage,
                    reason: reason.clone(),
                });
                Outcome::Aborted { stage, reason }
            }
        }
    }

    /// Hands every URL to the downloader, in order.
    ///
    /// A URL whose download cannot be started is reported and skipped.
    fn dispatch(&mut self, urls: &[Url], context: &RunContext) -> Outcome {
        let service = self.service.name();
        let mut dispatched = Vec::with_capacity(urls.len());

        for url in urls {
            self.emit(ProgressEvent::Dispatching { url: url.clone() });
            match self.downloader.download(service, &context.options, url) {
                Ok(()) => dispatched.push(url.clone()),
                Err(e) => {
                    warn!(url = %url, error = %e, "download could not be started");
                    self.emit(ProgressEvent::DispatchFailed {
                        url: url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Outcome::Dispatched(dispatched)
    }
}

/// Reports skipped records as progress events.
fn report_skip(progress: &mut dyn FnMut(ProgressEvent)) -> impl FnMut(RecordError) + '_ {
    move |e| {
        progress(ProgressEvent::RecordSkipped {
            reason: e.to_string(),
        })
    }
}

fn malformed(request: &ResolveRequest) -> ResolveError {
    ResolveError::MalformedInput {
        mode: request.mode,
        term: request.term.clone(),
    }
}

/// The request term as an absolute URL.
fn url_term(request: &ResolveRequest) -> Result<Url, ResolveError> {
    match Url::parse(request.term.trim()) {
        Ok(url) if url.has_host() => Ok(url),
        _ => Err(malformed(request)),
    }
}

/// Search query derived from a programme page URL: its series slug with
/// hyphens turned into spaces.
pub fn greedy_search_term(url: &Url) -> Option<String> {
    series_slug(url).map(|slug| slug.replace('-', " "))
}
