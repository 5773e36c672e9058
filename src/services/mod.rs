//! Streaming service loaders
//!
//! Each supported service implements [`SeriesDiscoverable`]: searching its
//! catalogue, expanding a chosen series into episodes, and browsing category
//! listings. The resolver drives the flow and never sees service-specific
//! response shapes.
mod stv;
mod stv_types;
mod tvnz;
mod tvnz_types;

pub use stv::StvService;
pub use tvnz::TvnzService;

use crate::catalog::{Catalog, ContentKind, Episode};
use crate::extract::ExtractError;
use crate::fetch::{FetchClient, FetchError};
use crate::field_map::{FieldMap, FieldMapError, RecordError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors that end a pipeline stage early.
#[derive(Debug, Error)]
pub enum StageError {
    /// A request failed or timed out
    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    /// The response did not have the expected shape
    #[error("Unexpected response: {0}")]
    Parse(String),

    /// The service explicitly reported zero results
    #[error("No matches for '{0}'")]
    NoMatch(String),
}

impl From<ExtractError> for StageError {
    fn from(e: ExtractError) -> Self {
        StageError::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for StageError {
    fn from(e: serde_json::Error) -> Self {
        StageError::Parse(e.to_string())
    }
}

impl From<url::ParseError> for StageError {
    fn from(e: url::ParseError) -> Self {
        StageError::Parse(format!("invalid URL: {}", e))
    }
}

/// What the user picked from the series list.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionTarget {
    /// A catalog key from the search stage
    Series(String),
    /// A programme page URL
    Url(Url),
}

impl ExpansionTarget {
    /// Interprets a series-list choice; absolute URLs become [`ExpansionTarget::Url`].
    pub fn from_choice(choice: &str) -> Self {
        match Url::parse(choice) {
            Ok(url) if url.has_host() => Self::Url(url),
            _ => Self::Series(choice.to_string()),
        }
    }
}

/// Result of expanding a series.
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// Episodes were added to the catalog under this key
    Catalogued(String),
    /// No episode concept; these items are the final list as they are
    Listed {
        series: String,
        episodes: Vec<Episode>,
    },
    /// A single playable URL, to be downloaded without asking
    Direct(Url),
}

/// One entry of a category listing.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseItem {
    pub title: String,
    pub synopsis: String,
    pub url: Url,
    pub kind: ContentKind,
}

/// Capability interface every service loader implements.
pub trait SeriesDiscoverable {
    /// Service name as the downloader knows it (`STV`, `TVNZ`, ...)
    fn name(&self) -> &'static str;

    /// Runs a search and adds every hit to the catalog under its series key.
    ///
    /// Records that cannot be mapped are passed to `on_skip` and ignored.
    fn search(
        &self,
        query: &str,
        catalog: &mut Catalog,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<(), StageError>;

    /// Resolves every network hop needed to list the episodes of a series.
    fn expand(
        &self,
        target: &ExpansionTarget,
        catalog: &mut Catalog,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<Expansion, StageError>;

    /// Lists the playable entries of a category page, category entries excluded.
    fn browse(
        &self,
        listing: &Url,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<Vec<BrowseItem>, StageError>;
}

/// Supported services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServiceKind {
    Stv,
    Tvnz,
}

impl ServiceKind {
    /// Builds the loader for this service on top of `fetcher`.
    pub fn build<F>(self, fetcher: F) -> Result<Box<dyn SeriesDiscoverable>, FieldMapError>
    where
        F: FetchClient + 'static,
    {
        Ok(match self {
            ServiceKind::Stv => Box::new(StvService::new(fetcher)?),
            ServiceKind::Tvnz => Box::new(TvnzService::new(fetcher)?),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            ServiceKind::Stv => "STV",
            ServiceKind::Tvnz => "TVNZ",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STV" => Ok(ServiceKind::Stv),
            "TVNZ" => Ok(ServiceKind::Tvnz),
            other => Err(format!("Unsupported service: {}", other)),
        }
    }
}

/// Maps `records` with `map` and adds them to the catalog.
///
/// The catalog key is `series` when given, otherwise the record's own series
/// key, otherwise its title. Returns how many new episodes were added.
pub(crate) fn catalogue_records(
    map: &FieldMap,
    records: &[Value],
    catalog: &mut Catalog,
    series: Option<&str>,
    on_skip: &mut dyn FnMut(RecordError),
) -> usize {
    let mut added = 0;
    for record in records {
        match map.apply(record) {
            Ok(mapped) => {
                let key = match (series, mapped.series_key.as_deref()) {
                    (Some(series), _) => series.to_string(),
                    (None, Some(key)) => key.to_string(),
                    (None, None) => mapped.episode.title.clone(),
                };
                if catalog.add_episode(&key, mapped.episode) {
                    added += 1;
                }
            }
            Err(e) => {
                warn!(map = map.name(), error = %e, "skipping record");
                on_skip(e);
            }
        }
    }
    added
}

/// Series slug of a programme URL: its second path segment, e.g. `joan` in
/// `https://player.stv.tv/summary/joan?autoplay=1`.
pub fn series_slug(url: &Url) -> Option<&str> {
    url.path_segments()?.nth(1).filter(|s| !s.is_empty())
}

/// Parses one of the service's fixed endpoint URLs.
pub(crate) fn endpoint(url: &str) -> Result<Url, StageError> {
    Ok(Url::parse(url)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_map::Field;
    use serde_json::json;

    #[test]
    fn test_expansion_target_from_choice() {
        assert_eq!(
            ExpansionTarget::from_choice("Joan"),
            ExpansionTarget::Series("Joan".to_string())
        );
        assert!(matches!(
            ExpansionTarget::from_choice("https://player.stv.tv/summary/joan"),
            ExpansionTarget::Url(_)
        ));
        // Parses as a host-less URL with scheme "taggart"
        assert_eq!(
            ExpansionTarget::from_choice("Taggart: Movie"),
            ExpansionTarget::Series("Taggart: Movie".to_string())
        );
    }

    #[test]
    fn test_series_slug() {
        let url = Url::parse("https://host/summary/joan-show?x=1").unwrap();
        assert_eq!(series_slug(&url), Some("joan-show"));

        let url = Url::parse("https://www.tvnz.co.nz/shows/boiling-point/episodes/s1-e1").unwrap();
        assert_eq!(series_slug(&url), Some("boiling-point"));

        let url = Url::parse("https://player.stv.tv/summary").unwrap();
        assert_eq!(series_slug(&url), None);
    }

    #[test]
    fn test_service_kind_from_str() {
        assert_eq!("stv".parse::<ServiceKind>(), Ok(ServiceKind::Stv));
        assert_eq!("TVNZ".parse::<ServiceKind>(), Ok(ServiceKind::Tvnz));
        assert!("ALL4".parse::<ServiceKind>().is_err());
        assert_eq!(ServiceKind::Tvnz.to_string(), "TVNZ");
    }

    #[test]
    fn test_catalogue_records_skips_bad_records() {
        let map = FieldMap::builder("test")
            .series_key(Field::required("/show"))
            .title(Field::required("/title"))
            .url(Field::required("/url"))
            .build()
            .unwrap();
        let records = vec![
            json!({ "show": "Joan", "title": "a", "url": "https://a.tv/1" }),
            json!({ "show": "Joan", "title": "b" }),
            json!({ "show": "Joan", "title": "a", "url": "https://a.tv/1" }),
            json!({ "show": "Taggart", "title": "c", "url": "https://a.tv/2" }),
        ];

        let mut catalog = Catalog::new();
        let mut skipped = Vec::new();
        let added = catalogue_records(&map, &records, &mut catalog, None, &mut |e| skipped.push(e));

        assert_eq!(added, 2);
        assert_eq!(skipped.len(), 1);
        assert_eq!(catalog.series_names(), vec!["Joan", "Taggart"]);
    }

    #[test]
    fn test_catalogue_records_with_fixed_series() {
        let map = FieldMap::builder("test")
            .title(Field::required("/title"))
            .url(Field::required("/url"))
            .build()
            .unwrap();
        let records = vec![json!({ "title": "a", "url": "https://a.tv/1" })];

        let mut catalog = Catalog::new();
        catalogue_records(&map, &records, &mut catalog, Some("Joan"), &mut |_| {});
        assert_eq!(catalog.episode_count("Joan"), 1);
    }
}
