/// TVNZ+ API response envelopes for deserialization.
use serde::Deserialize;
use serde_json::{Map, Value};

/// Response of the play search endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    /// Missing entirely when the API answers with something other than results
    pub results: Option<Vec<Value>>,
}

/// The `/episodes` page of a show, listing one entry per season.
#[derive(Debug, Deserialize)]
pub(super) struct EpisodesPage {
    pub layout: Layout,
}

#[derive(Debug, Deserialize)]
pub(super) struct Layout {
    pub slots: Slots,
}

#[derive(Debug, Deserialize)]
pub(super) struct Slots {
    pub main: MainSlot,
}

#[derive(Debug, Deserialize)]
pub(super) struct MainSlot {
    #[serde(default)]
    pub modules: Vec<Module>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Module {
    #[serde(default)]
    pub lists: Vec<SeasonList>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SeasonList {
    /// API path of the season listing, relative to the edge host
    pub href: String,
}

/// Any HAL-style response whose items live in an `_embedded` map.
#[derive(Debug, Deserialize)]
pub(super) struct Embedded {
    #[serde(rename = "_embedded")]
    pub embedded: Option<Map<String, Value>>,
}
