/// TVNZ+ loader.
///
/// TVNZ mixes three kinds of content in one catalogue: shows with seasons,
/// movies that are modelled as single-episode shows, and sport clips that
/// have no episode structure at all. Expansion branches on the kind of the
/// search hit.
use super::tvnz_types::{Embedded, EpisodesPage, SearchResponse};
use super::{
    BrowseItem, Expansion, ExpansionTarget, SeriesDiscoverable, StageError, catalogue_records,
    endpoint, series_slug,
};
use crate::catalog::{Catalog, ContentKind, Episode, NO_SYNOPSIS};
use crate::extract::parse_json;
use crate::fetch::FetchClient;
use crate::field_map::{Field, FieldMap, FieldMapError, RecordError};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

const SEARCH_URL: &str = "https://apis-public-prod.tech.tvnz.co.nz/api/v1/web/play/search";
const SHOW_PAGES_URL: &str = "https://apis-public-prod.tech.tvnz.co.nz/api/v1/web/play/page/shows/";
const EDGE_BASE: &str = "https://apis-edge-prod.tech.tvnz.co.nz";
const WATCH_BASE: &str = "https://www.tvnz.co.nz";

/// Literal the search API returns instead of JSON when nothing matched.
const NO_MATCHES: &str = "No Matches";

const HEADERS: &[(&str, &str)] = &[("Accept", "*/*")];

pub struct TvnzService<F: FetchClient> {
    fetcher: F,
    search_map: FieldMap,
    episode_map: FieldMap,
    browse_show_map: FieldMap,
    browse_video_map: FieldMap,
}

impl<F: FetchClient> TvnzService<F> {
    pub fn new(fetcher: F) -> Result<Self, FieldMapError> {
        let search_map = FieldMap::builder("tvnz-search")
            .series_key(Field::fallback("/title", "Unknown Series"))
            .title(Field::fallback("/title", "Unknown Title"))
            .url(Field::optional("/page/href"))
            .url_base(EDGE_BASE)
            .synopsis(Field::fallback("/synopsis", NO_SYNOPSIS))
            .kind(Field::optional("/type"))
            .build()?;

        // Season listings carry no title; the episode number stands in
        let episode_map = FieldMap::builder("tvnz-episodes")
            .title(Field::fallback("/episodeNumber", "Episode"))
            .url(Field::optional("/page/url"))
            .url_base(WATCH_BASE)
            .synopsis(Field::fallback("/synopsis", NO_SYNOPSIS))
            .series_no(Field::optional("/seasonNumber"))
            .episode_no(Field::optional("/episodeNumber"))
            .kind(Field::optional("/type"))
            .build()?;

        let browse_show_map = FieldMap::builder("tvnz-browse-show")
            .title(Field::fallback("/title", "unknown"))
            .url(Field::required("/watchAction/link"))
            .url_base(WATCH_BASE)
            .synopsis(Field::fallback("/synopsis", NO_SYNOPSIS))
            .build()?;

        let browse_video_map = FieldMap::builder("tvnz-browse-video")
            .title(Field::fallback("/title", "unknown"))
            .url(Field::required("/page/url"))
            .url_base(WATCH_BASE)
            .synopsis(Field::fallback("/synopsis", NO_SYNOPSIS))
            .build()?;

        Ok(Self {
            fetcher,
            search_map,
            episode_map,
            browse_show_map,
            browse_video_map,
        })
    }

    /// Watch URL used when a show has no episode listing.
    fn movie_url(slug: &str) -> Result<Url, StageError> {
        Ok(endpoint(WATCH_BASE)?.join(&format!("/shows/{}/movie/s1-e1", slug))?)
    }

    /// Rewrites an API page URL (`.../page/sport/...`) to its public watch URL.
    fn sport_watch_url(api_url: &Url) -> Option<Url> {
        let (_, path) = api_url.path().split_once("/page/")?;
        Url::parse(WATCH_BASE).ok()?.join(path).ok()
    }

    /// Season listing hrefs from the show's episodes page, or `None` if the
    /// page cannot be fetched or read.
    fn season_hrefs(&self, slug: &str) -> Result<Option<Vec<String>>, StageError> {
        let url = endpoint(SHOW_PAGES_URL)?.join(&format!("{}/episodes", slug))?;

        let page = match self.fetcher.get(&url, HEADERS) {
            Ok(body) => body,
            Err(e) => {
                debug!(url = %url, error = %e, "no episodes page");
                return Ok(None);
            }
        };
        let Ok(page) = parse_json(&page) else {
            debug!(url = %url, "episodes page is not JSON");
            return Ok(None);
        };

        let page: EpisodesPage = serde_json::from_value(page)?;
        let module = page
            .layout
            .slots
            .main
            .modules
            .into_iter()
            .next()
            .ok_or_else(|| StageError::Parse(format!("no season list at {}", url)))?;

        Ok(Some(module.lists.into_iter().map(|l| l.href).collect()))
    }
}

/// URL slug of a TVNZ series: lowercase, hyphenated, without `:` or `,`.
pub(super) fn slugify(name: &str) -> String {
    name.to_lowercase()
        .replace(' ', "-")
        .replace([':', ','], "")
}

impl<F: FetchClient> SeriesDiscoverable for TvnzService<F> {
    fn name(&self) -> &'static str {
        "TVNZ"
    }

    fn search(
        &self,
        query: &str,
        catalog: &mut Catalog,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<(), StageError> {
        let mut url = endpoint(SEARCH_URL)?;
        url.query_pairs_mut().append_pair("q", query);

        let body = self.fetcher.get(&url, HEADERS)?;
        let value = match parse_json(&body) {
            Ok(value) => value,
            Err(_) if body.contains(NO_MATCHES) => {
                return Err(StageError::NoMatch(query.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let parsed: SearchResponse = serde_json::from_value(value)?;
        let results = parsed
            .results
            .ok_or_else(|| StageError::Parse(format!("no results in response from {}", url)))?;

        let added = catalogue_records(&self.search_map, &results, catalog, None, on_skip);
        debug!(query, added, "TVNZ search complete");
        Ok(())
    }

    fn expand(
        &self,
        target: &ExpansionTarget,
        catalog: &mut Catalog,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<Expansion, StageError> {
        let (key, slug) = match target {
            ExpansionTarget::Series(name) => (name.clone(), slugify(name)),
            ExpansionTarget::Url(url) => {
                let slug = series_slug(url)
                    .ok_or_else(|| StageError::Parse(format!("no series in URL {}", url)))?;
                (slug.to_string(), slug.to_string())
            }
        };

        let kind = catalog
            .episodes(&key)
            .first()
            .map(|e| e.kind)
            .unwrap_or(ContentKind::Show);

        match kind {
            ContentKind::SportVideo => {
                let episodes: Vec<Episode> = catalog
                    .episodes(&key)
                    .iter()
                    .map(|e| Episode {
                        url: e.url.as_ref().and_then(Self::sport_watch_url),
                        ..e.clone()
                    })
                    .collect();
                return Ok(Expansion::Listed {
                    series: key,
                    episodes,
                });
            }
            ContentKind::Movie => return Ok(Expansion::Direct(Self::movie_url(&slug)?)),
            _ => {}
        }

        let Some(hrefs) = self.season_hrefs(&slug)? else {
            info!(slug = %slug, "no episode listing, treating as single title");
            return Ok(Expansion::Direct(Self::movie_url(&slug)?));
        };

        // Search hits point at API pages, not episodes
        catalog.clear();

        let edge = endpoint(EDGE_BASE)?;
        for href in hrefs {
            let season_url = edge.join(&href)?;
            let body = self.fetcher.get(&season_url, HEADERS)?;
            let season: Embedded = serde_json::from_value(parse_json(&body)?)?;
            let Some(items) = season.embedded else {
                return Err(StageError::Parse(format!("no episodes at {}", season_url)));
            };

            let records: Vec<Value> = items.into_iter().map(|(_, item)| item).collect();
            let added = catalogue_records(&self.episode_map, &records, catalog, Some(&key), on_skip);
            debug!(season = %season_url, added, "TVNZ season listed");
        }

        info!(series = %key, slug = %slug, episodes = catalog.episode_count(&key), "TVNZ expansion complete");
        Ok(Expansion::Catalogued(key))
    }

    fn browse(
        &self,
        listing: &Url,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<Vec<BrowseItem>, StageError> {
        let body = self.fetcher.get(listing, HEADERS)?;
        let parsed: Embedded = serde_json::from_value(parse_json(&body)?)?;
        let entries = parsed
            .embedded
            .ok_or_else(|| StageError::Parse(format!("no items listed at {}", listing)))?;

        let mut items = Vec::new();
        for (id, item) in &entries {
            let item_type = item.get("type").and_then(Value::as_str).unwrap_or_default();
            let (map, kind) = match item_type {
                "category" => continue,
                "show" => (&self.browse_show_map, ContentKind::Show),
                "showVideo" => (&self.browse_video_map, ContentKind::Show),
                "sportVideo" => (&self.browse_video_map, ContentKind::SportVideo),
                other => {
                    debug!(id = %id, item_type = other, "unsupported listing item");
                    continue;
                }
            };

            let mapped = match map.apply(item) {
                Ok(mapped) => mapped,
                Err(e) => {
                    on_skip(e);
                    continue;
                }
            };

            // Movies are shows with showType "Movie"
            let kind = match item.get("showType").and_then(Value::as_str) {
                Some("Movie") => ContentKind::Movie,
                _ => kind,
            };

            if let Some(url) = mapped.episode.url {
                items.push(BrowseItem {
                    title: mapped.episode.title,
                    synopsis: mapped.episode.synopsis,
                    url,
                    kind,
                });
            }
        }
        Ok(items)
    }
}
