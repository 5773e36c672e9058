/// STV Player loader.
use super::stv_types::{EpisodeListing, ProgrammePage, SearchResponse};
use super::{
    BrowseItem, Expansion, ExpansionTarget, SeriesDiscoverable, StageError, catalogue_records,
    endpoint,
};
use crate::catalog::{Catalog, ContentKind};
use crate::extract::extract_script_json;
use crate::fetch::FetchClient;
use crate::field_map::{Field, FieldMap, FieldMapError, RecordError};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

const SEARCH_URL: &str = "https://search-api.swiftype.com/api/v1/public/engines/search.json";
const EPISODES_URL: &str = "https://player.api.stv.tv/v1/episodes";
const PLAYER_BASE: &str = "https://player.stv.tv";
const SEARCH_ENGINE_KEY: &str = "S1jgssBHdk8ZtMWngK_y";

/// Tabs from this one onward are not seasons.
const NON_SEASON_TABS: &[&str] = &["Autoplay", "Trailer"];

const PAGE_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Origin", "https://player.stv.tv"),
    ("Referer", "https://player.stv.tv/"),
];

const SEARCH_HEADERS: &[(&str, &str)] = &[
    ("Accept", "*/*"),
    ("Accept-Language", "en-GB,en-US;q=0.9,en;q=0.8"),
    ("Origin", "https://player.stv.tv"),
    ("Referer", "https://player.stv.tv/"),
    ("Access-Control-Request-Method", "POST"),
];

const API_HEADERS: &[(&str, &str)] = &[("Accept", "*/*"), ("Origin", "https://player.stv.tv")];

/// Loader for STV Player (Scotland).
///
/// Search goes through STV's Swiftype engine. Programme pages carry their
/// season tabs in `__NEXT_DATA__`, and each season is listed by the episodes
/// API.
pub struct StvService<F: FetchClient> {
    fetcher: F,
    search_map: FieldMap,
    episode_map: FieldMap,
    category_map: FieldMap,
}

impl<F: FetchClient> StvService<F> {
    pub fn new(fetcher: F) -> Result<Self, FieldMapError> {
        let search_map = FieldMap::builder("stv-search")
            .series_key(Field::required("/title"))
            .title(Field::required("/title"))
            .url(Field::required("/url"))
            .url_base(PLAYER_BASE)
            .synopsis(Field::optional("/resultDescriptionTx"))
            .build()?;

        let episode_map = FieldMap::builder("stv-episodes")
            .title(Field::required("/title"))
            .url(Field::required("/_permalink"))
            .url_base(PLAYER_BASE)
            .synopsis(Field::optional("/summary"))
            .series_no(Field::optional("/playerSeries/name"))
            .build()?;

        let category_map = FieldMap::builder("stv-category")
            .title(Field::required("/title"))
            .url(Field::required("/link"))
            .url_base(PLAYER_BASE)
            .synopsis(Field::optional("/description"))
            .kind(Field::optional("/type"))
            .build()?;

        Ok(Self {
            fetcher,
            search_map,
            episode_map,
            category_map,
        })
    }

    /// Warm-up round trip; the search POST must echo its `x-request-id`.
    fn request_id(&self, url: &Url) -> Result<String, StageError> {
        let headers = self.fetcher.get_options(url, SEARCH_HEADERS)?;
        headers
            .get("x-request-id")
            .cloned()
            .ok_or_else(|| StageError::Parse("search warm-up returned no x-request-id".to_string()))
    }

    fn search_body(query: &str) -> Value {
        json!({
            "engine_key": SEARCH_ENGINE_KEY,
            "per_page": 100,
            "page": 1,
            "fetch_fields": {
                "page": ["title", "body", "resultDescriptionTx", "url"]
            },
            "highlight_fields": {
                "page": { "title": { "size": 100, "fallback": true } }
            },
            "search_fields": {
                "page": ["title^3", "body", "category", "sections"]
            },
            "q": query,
            "spelling": "strict"
        })
    }

    fn programme_url(target: &ExpansionTarget, catalog: &Catalog) -> Result<Url, StageError> {
        match target {
            ExpansionTarget::Url(url) => Ok(url.clone()),
            ExpansionTarget::Series(name) => catalog
                .episodes(name)
                .iter()
                .find_map(|e| e.url.clone())
                .ok_or_else(|| StageError::Parse(format!("no programme page known for '{}'", name))),
        }
    }

    fn season_listing_url(series_guid: &str) -> Result<Url, StageError> {
        let mut url = endpoint(EPISODES_URL)?;
        url.query_pairs_mut()
            .append_pair("series.guid", series_guid)
            .append_pair("limit", "100")
            .append_pair("groupToken", "0071");
        Ok(url)
    }
}

impl<F: FetchClient> SeriesDiscoverable for StvService<F> {
    fn name(&self) -> &'static str {
        "STV"
    }

    fn search(
        &self,
        query: &str,
        catalog: &mut Catalog,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<(), StageError> {
        let url = endpoint(SEARCH_URL)?;
        let request_id = self.request_id(&url)?;

        let mut headers = SEARCH_HEADERS.to_vec();
        headers.push(("x-request-id", request_id.as_str()));

        let response = self
            .fetcher
            .post_json(&url, &headers, &Self::search_body(query))?;
        let parsed: SearchResponse = serde_json::from_value(response.json()?)?;

        if parsed.records.page.is_empty() {
            return Err(StageError::NoMatch(query.to_string()));
        }

        let added = catalogue_records(&self.search_map, &parsed.records.page, catalog, None, on_skip);
        debug!(query, added, "STV search complete");
        Ok(())
    }

    fn expand(
        &self,
        target: &ExpansionTarget,
        catalog: &mut Catalog,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<Expansion, StageError> {
        let page_url = Self::programme_url(target, catalog)?;
        let html = self.fetcher.get(&page_url, PAGE_HEADERS)?;
        let state = extract_script_json(&html, "__NEXT_DATA__")?;
        let page: ProgrammePage = serde_json::from_value(state)?;
        let data = page.props.page_props.data;
        let series = data.programme_header.name;

        // Search hits are programme pages, not episodes
        catalog.clear();

        for tab in &data.tabs {
            if NON_SEASON_TABS.iter().any(|t| tab.title.contains(t)) {
                break;
            }
            let Some(guid) = tab.series_guid() else {
                debug!(tab = %tab.title, "tab has no series.guid, skipping");
                continue;
            };

            let listing_url = Self::season_listing_url(guid)?;
            let body = self.fetcher.get(&listing_url, API_HEADERS)?;
            let listing: EpisodeListing = serde_json::from_str(&body)?;
            let added = catalogue_records(&self.episode_map, &listing.results, catalog, Some(&series), on_skip);
            debug!(tab = %tab.title, added, "STV season listed");
        }

        info!(series = %series, episodes = catalog.episode_count(&series), "STV expansion complete");
        Ok(Expansion::Catalogued(series))
    }

    fn browse(
        &self,
        listing: &Url,
        on_skip: &mut dyn FnMut(RecordError),
    ) -> Result<Vec<BrowseItem>, StageError> {
        let html = self.fetcher.get(listing, PAGE_HEADERS)?;
        let state = extract_script_json(&html, "__NEXT_DATA__")?;
        let assets = state
            .pointer("/props/pageProps/data/assets")
            .and_then(Value::as_array)
            .ok_or_else(|| StageError::Parse(format!("no assets listed at {}", listing)))?;

        let mut items = Vec::new();
        for asset in assets {
            let mapped = match self.category_map.apply(asset) {
                Ok(mapped) => mapped,
                Err(e) => {
                    on_skip(e);
                    continue;
                }
            };
            let episode = mapped.episode;
            let kind = match episode.kind {
                ContentKind::Category => continue,
                ContentKind::Unknown => ContentKind::Show,
                kind => kind,
            };
            if let Some(url) = episode.url {
                items.push(BrowseItem {
                    title: episode.title,
                    synopsis: episode.synopsis,
                    url,
                    kind,
                });
            }
        }
        Ok(items)
    }
}
