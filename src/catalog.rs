//! Catalog of discovered series and episodes
//!
//! The catalog maps a series name to the episodes found for it so far, in the
//! order they were discovered. Several fetch passes may add to the same series;
//! identical records are only stored once.

use url::Url;

/// Synopsis used when the upstream record has none.
pub const NO_SYNOPSIS: &str = "No synopsis available.";

/// Kind of content an upstream record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    /// A series with episodes (upstream `show` or `showVideo`)
    Show,
    /// A sport clip without any episode structure
    SportVideo,
    /// A single feature-length title
    Movie,
    /// A nested category listing, never playable
    Category,
    /// Anything the loaders do not recognise
    #[default]
    Unknown,
}

impl ContentKind {
    /// Maps an upstream `type` discriminator to a content kind.
    pub fn from_upstream(value: &str) -> Self {
        match value.trim() {
            "show" | "showVideo" => Self::Show,
            "sportVideo" => Self::SportVideo,
            "movie" | "Movie" => Self::Movie,
            "category" => Self::Category,
            _ => Self::Unknown,
        }
    }
}

/// Represents one playable or selectable item.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// Display title
    pub title: String,
    /// Absolute watch URL, `None` when upstream did not provide one
    pub url: Option<Url>,
    /// Short description
    pub synopsis: String,
    /// Season ("series" in UK terms) number, if known
    pub series_no: Option<u32>,
    /// Episode number within the season, if known
    pub episode_no: Option<u32>,
    /// Kind of content
    pub kind: ContentKind,
}

impl Episode {
    /// Creates an episode with only a title and URL set.
    pub fn new(title: impl Into<String>, url: Option<Url>) -> Self {
        Self {
            title: title.into(),
            url,
            synopsis: NO_SYNOPSIS.to_string(),
            series_no: None,
            episode_no: None,
            kind: ContentKind::Unknown,
        }
    }

    fn is_same_record(&self, other: &Episode) -> bool {
        self.title == other.title && self.url == other.url
    }
}

/// A named series and its episodes in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub episodes: Vec<Episode>,
}

/// One row of the final multi-select: what the user sees, and the URL it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalEntry {
    pub label: String,
    pub url: Option<Url>,
}

/// In-memory catalog for a single run.
#[derive(Debug, Default)]
pub struct Catalog {
    series: Vec<Series>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an episode under `series`.
    ///
    /// Returns `false` without changing anything when an episode with the
    /// same title and URL is already stored for that series.
    pub fn add_episode(&mut self, series: &str, episode: Episode) -> bool {
        let entry = match self.series.iter().position(|s| s.name == series) {
            Some(index) => &mut self.series[index],
            None => {
                self.series.push(Series {
                    name: series.to_string(),
                    episodes: Vec::new(),
                });
                let last = self.series.len() - 1;
                &mut self.series[last]
            }
        };

        if entry.episodes.iter().any(|e| e.is_same_record(&episode)) {
            return false;
        }
        entry.episodes.push(episode);
        true
    }

    /// Drops every series and episode.
    pub fn clear(&mut self) {
        self.series.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series names in the order they were first seen.
    pub fn series_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    /// Episodes stored for `series`, empty when the series is unknown.
    pub fn episodes(&self, series: &str) -> &[Episode] {
        self.series
            .iter()
            .find(|s| s.name == series)
            .map(|s| s.episodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn episode_count(&self, series: &str) -> usize {
        self.episodes(series).len()
    }

    /// Builds the sorted, labelled list that feeds the final multi-select.
    pub fn final_episode_list(&self, series: &str) -> Vec<FinalEntry> {
        final_episode_list(series, self.episodes(series))
    }
}

/// Sorts episodes by series number, then episode number.
///
/// Episodes missing a number sort after those that have one. The sort is
/// stable, so ties keep their discovery order.
pub fn sort_episodes(episodes: &mut [Episode]) {
    fn rank(number: Option<u32>) -> (bool, u32) {
        (number.is_none(), number.unwrap_or(0))
    }
    episodes.sort_by_key(|e| (rank(e.series_no), rank(e.episode_no)));
}

/// Sorts a copy of `episodes` and renders one [`FinalEntry`] per episode.
pub fn final_episode_list(series: &str, episodes: &[Episode]) -> Vec<FinalEntry> {
    let mut sorted = episodes.to_vec();
    sort_episodes(&mut sorted);
    sorted
        .into_iter()
        .map(|episode| FinalEntry {
            label: episode_label(series, &episode),
            url: episode.url,
        })
        .collect()
}

/// Renders the display label for an episode, e.g. `Joan S01E03 Old Friends - synopsis`.
pub fn episode_label(series: &str, episode: &Episode) -> String {
    let mut label = series.to_string();

    match (episode.series_no, episode.episode_no) {
        (Some(s), Some(e)) => label.push_str(&format!(" S{:02}E{:02}", s, e)),
        (Some(s), None) => label.push_str(&format!(" S{:02}", s)),
        (None, Some(e)) => label.push_str(&format!(" E{:02}", e)),
        (None, None) => {}
    }

    // TVNZ listings use the episode number as the title
    let title_is_number = episode
        .episode_no
        .is_some_and(|n| episode.title.trim() == n.to_string());
    if episode.title != series && !title_is_number && !episode.title.is_empty() {
        label.push(' ');
        label.push_str(&episode.title);
    }

    label.push_str(" - ");
    label.push_str(&episode.synopsis);
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(title: &str, url: &str, series_no: Option<u32>) -> Episode {
        Episode {
            series_no,
            ..Episode::new(title, Url::parse(url).ok())
        }
    }

    #[test]
    fn test_identical_record_is_not_added_twice() {
        let mut catalog = Catalog::new();
        assert!(catalog.add_episode("Joan", episode("Pilot", "https://a.tv/1", None)));
        assert!(!catalog.add_episode("Joan", episode("Pilot", "https://a.tv/1", None)));
        assert_eq!(catalog.episode_count("Joan"), 1);

        // Same title under a different URL is a different record
        assert!(catalog.add_episode("Joan", episode("Pilot", "https://a.tv/2", None)));
        assert_eq!(catalog.episode_count("Joan"), 2);
    }

    #[test]
    fn test_series_keep_insertion_order_and_exact_keys() {
        let mut catalog = Catalog::new();
        catalog.add_episode("Taggart", episode("a", "https://a.tv/1", None));
        catalog.add_episode("Joan", episode("b", "https://a.tv/2", None));
        catalog.add_episode("joan", episode("c", "https://a.tv/3", None));
        catalog.add_episode("Taggart", episode("d", "https://a.tv/4", None));

        assert_eq!(catalog.series_names(), vec!["Taggart", "Joan", "joan"]);
        assert_eq!(catalog.episode_count("Taggart"), 2);
        assert!(catalog.episodes("Missing").is_empty());
    }

    #[test]
    fn test_clear_resets_catalog() {
        let mut catalog = Catalog::new();
        catalog.add_episode("Joan", episode("a", "https://a.tv/1", None));
        catalog.clear();
        assert!(catalog.is_empty());
        assert_eq!(catalog.episode_count("Joan"), 0);
    }

    #[test]
    fn test_sort_is_stable_with_missing_numbers_last() {
        let mut episodes = vec![
            episode("first", "https://a.tv/1", Some(2)),
            episode("second", "https://a.tv/2", Some(1)),
            episode("third", "https://a.tv/3", None),
            episode("fourth", "https://a.tv/4", Some(1)),
        ];
        sort_episodes(&mut episodes);

        let order: Vec<_> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(order, vec!["second", "fourth", "first", "third"]);
    }

    #[test]
    fn test_sort_uses_episode_number_within_series() {
        let mut episodes = vec![
            Episode {
                episode_no: Some(3),
                ..episode("c", "https://a.tv/3", Some(1))
            },
            Episode {
                episode_no: None,
                ..episode("x", "https://a.tv/x", Some(1))
            },
            Episode {
                episode_no: Some(1),
                ..episode("a", "https://a.tv/1", Some(1))
            },
        ];
        sort_episodes(&mut episodes);

        let order: Vec<_> = episodes.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "x"]);
    }

    #[test]
    fn test_episode_label() {
        let ep = Episode {
            episode_no: Some(3),
            synopsis: "Joan is back.".to_string(),
            ..episode("Old Friends", "https://a.tv/3", Some(1))
        };
        assert_eq!(episode_label("Joan", &ep), "Joan S01E03 Old Friends - Joan is back.");

        let numbered = Episode {
            episode_no: Some(4),
            ..episode("4", "https://a.tv/4", Some(2))
        };
        assert_eq!(
            episode_label("joan", &numbered),
            format!("joan S02E04 - {}", NO_SYNOPSIS)
        );
    }

    #[test]
    fn test_final_list_keeps_url_alongside_label() {
        let mut catalog = Catalog::new();
        catalog.add_episode("Joan", episode("b", "https://a.tv/2", Some(2)));
        catalog.add_episode("Joan", Episode::new("no url", None));
        catalog.add_episode("Joan", episode("a", "https://a.tv/1", Some(1)));

        let list = catalog.final_episode_list("Joan");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].url.as_ref().map(Url::as_str), Some("https://a.tv/1"));
        assert_eq!(list[1].url.as_ref().map(Url::as_str), Some("https://a.tv/2"));
        assert!(list[2].url.is_none());
    }

    #[test]
    fn test_content_kind_from_upstream() {
        assert_eq!(ContentKind::from_upstream("showVideo"), ContentKind::Show);
        assert_eq!(ContentKind::from_upstream("show"), ContentKind::Show);
        assert_eq!(ContentKind::from_upstream("sportVideo"), ContentKind::SportVideo);
        assert_eq!(ContentKind::from_upstream("Movie"), ContentKind::Movie);
        assert_eq!(ContentKind::from_upstream("category"), ContentKind::Category);
        assert_eq!(ContentKind::from_upstream("podcast"), ContentKind::Unknown);
    }
}
