//! Vinefeeder - Find series and episodes on streaming services and download them
//!
//! This library searches a streaming service's catalogue, lets the user pick a
//! series and its episodes, and hands every chosen URL to the external
//! `devine` downloader.

pub mod catalog;
pub mod config;
pub mod downloader;
pub mod extract;
pub mod fetch;
pub mod field_map;
pub mod resolver;
pub mod selection;
pub mod services;

#[cfg(test)]
mod test_support;

use downloader::DevineInvoker;
use fetch::HttpFetcher;
use selection::DialoguerSelector;

// Re-export error types
pub use config::ConfigError;
pub use downloader::DownloadError;
pub use extract::ExtractError;
pub use fetch::FetchError;
pub use field_map::{FieldMapError, RecordError};
pub use resolver::ResolveError;
pub use selection::SelectionError;
pub use services::StageError;

// Re-export the types needed to drive a run
pub use config::Settings;
pub use resolver::{Mode, Outcome, ProgressEvent, ResolveRequest, Resolver, RunContext, Stage};
pub use services::{SeriesDiscoverable, ServiceKind};

use thiserror::Error;

/// Top-level error type for Vinefeeder operations
#[derive(Debug, Error)]
pub enum VinefeederError {
    /// Error while loading settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while setting up or using the HTTP client
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error while reading an embedded page payload
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// A service's field map is invalid
    #[error("Field map error: {0}")]
    FieldMap(#[from] FieldMapError),

    /// An upstream record could not be mapped
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// A pipeline stage failed
    #[error("Stage error: {0}")]
    Stage(#[from] StageError),

    /// Error during interactive selection
    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Error while starting the downloader
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// The request could not be resolved
    #[error("{0}")]
    Resolve(#[from] ResolveError),
}

/// Resolves one request against a service with the production collaborators
///
/// Requests go out over HTTP with the configured user agent and timeout, the
/// user picks series and episodes in the terminal, and every chosen URL is
/// handed to the configured downloader binary with the service's passthrough
/// options.
///
/// Progress events are emitted through the provided callback, allowing library
/// users to print status messages or remain silent.
///
/// # Examples
///
/// ```no_run
/// use vinefeeder::{Mode, ProgressEvent, ResolveRequest, ServiceKind, Settings, run};
///
/// let settings = Settings::default();
/// let request = ResolveRequest::new(Mode::Keyword, "joan");
///
/// let outcome = run(ServiceKind::Stv, &request, &settings, |event| {
///     if let ProgressEvent::Dispatching { url } = event {
///         println!("Downloading {}", url);
///     }
/// })
/// .unwrap();
/// ```
pub fn run<F>(
    service: ServiceKind,
    request: &ResolveRequest,
    settings: &Settings,
    mut progress_callback: F,
) -> Result<Outcome, VinefeederError>
where
    F: FnMut(ProgressEvent),
{
    let fetcher = HttpFetcher::new(&settings.user_agent, settings.timeout())?;
    let loader = service.build(fetcher)?;

    let mut selector = DialoguerSelector::new(settings.page_size);
    let mut downloader = DevineInvoker::new(settings.downloader.as_str());
    let context = RunContext::new(settings.options_for(service.name()));

    let mut resolver = Resolver::new(
        loader.as_ref(),
        &mut selector,
        &mut downloader,
        &mut progress_callback,
    );
    Ok(resolver.resolve(request, &context)?)
}
