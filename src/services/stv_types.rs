/// STV response envelopes for deserialization.
///
/// Only the wrappers are typed here. Individual records stay as raw JSON and
/// go through the service's field maps.
use serde::Deserialize;
use serde_json::Value;

/// Response of the Swiftype search endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    pub records: SearchRecords,
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchRecords {
    /// One record per matching page on player.stv.tv
    #[serde(default)]
    pub page: Vec<Value>,
}

/// The `__NEXT_DATA__` state of a programme summary page.
#[derive(Debug, Deserialize)]
pub(super) struct ProgrammePage {
    pub props: ProgrammeProps,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProgrammeProps {
    #[serde(rename = "pageProps")]
    pub page_props: ProgrammePageProps,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProgrammePageProps {
    pub data: ProgrammeData,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProgrammeData {
    #[serde(rename = "programmeHeader")]
    pub programme_header: ProgrammeHeader,
    /// Season tabs, followed by non-season tabs such as "Autoplay"
    #[serde(default)]
    pub tabs: Vec<Tab>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProgrammeHeader {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct Tab {
    #[serde(default)]
    pub title: String,
    pub params: Option<TabParams>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TabParams {
    #[serde(default)]
    pub query: TabQuery,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct TabQuery {
    /// Identifies one season in the episodes API
    #[serde(rename = "series.guid")]
    pub series_guid: Option<String>,
}

impl Tab {
    pub fn series_guid(&self) -> Option<&str> {
        self.params.as_ref()?.query.series_guid.as_deref()
    }
}

/// Response of the episodes API for one season.
#[derive(Debug, Deserialize)]
pub(super) struct EpisodeListing {
    #[serde(default)]
    pub results: Vec<Value>,
}
