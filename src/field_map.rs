//! Declarative mapping from upstream JSON records to [`Episode`] values
//!
//! Every service describes where each episode attribute lives in its records
//! with JSON pointers. Maps are validated when they are built, so a broken
//! declaration fails at load time instead of halfway through a listing.

use crate::catalog::{ContentKind, Episode, NO_SYNOPSIS};
use crate::extract::html_to_text;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Errors in a field map declaration.
#[derive(Debug, Error)]
pub enum FieldMapError {
    /// A target every episode needs was not declared
    #[error("Field map '{map}' does not declare the required target '{target}'")]
    MissingTarget {
        map: &'static str,
        target: &'static str,
    },

    /// A source path is not a JSON pointer
    #[error("Field map '{map}' has an invalid source path '{path}' for '{target}'")]
    InvalidPath {
        map: &'static str,
        target: &'static str,
        path: &'static str,
    },

    /// The URL base is not an absolute URL
    #[error("Field map '{map}' has an invalid URL base '{base}': {source}")]
    InvalidBase {
        map: &'static str,
        base: &'static str,
        source: url::ParseError,
    },
}

/// Errors while mapping a single record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field is absent or null
    #[error("Record is missing required field '{target}' at {path}")]
    MissingField {
        target: &'static str,
        path: &'static str,
    },

    /// The field is present but has an unusable shape
    #[error("Field '{target}' at {path} has an unexpected value: {value}")]
    InvalidValue {
        target: &'static str,
        path: &'static str,
        value: String,
    },

    /// The URL field could not be turned into an absolute URL
    #[error("Could not resolve URL '{0}'")]
    InvalidUrl(String),
}

/// What to do when a field is absent from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absence is a [`RecordError::MissingField`]
    Required,
    /// Absence is replaced with the given value
    Fallback(&'static str),
    /// Absence is fine and yields `None`
    Optional,
}

/// A source location plus its presence policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub path: &'static str,
    pub presence: Presence,
}

impl Field {
    pub const fn required(path: &'static str) -> Self {
        Self {
            path,
            presence: Presence::Required,
        }
    }

    pub const fn fallback(path: &'static str, default: &'static str) -> Self {
        Self {
            path,
            presence: Presence::Fallback(default),
        }
    }

    pub const fn optional(path: &'static str) -> Self {
        Self {
            path,
            presence: Presence::Optional,
        }
    }
}

/// The result of mapping one record.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    /// Catalog key for the record, when the map declares one
    pub series_key: Option<String>,
    pub episode: Episode,
}

/// A validated per-service field map.
#[derive(Debug, Clone)]
pub struct FieldMap {
    name: &'static str,
    series_key: Option<Field>,
    title: Field,
    url: Field,
    url_base: Option<Url>,
    synopsis: Option<Field>,
    series_no: Option<Field>,
    episode_no: Option<Field>,
    kind: Option<Field>,
}

/// Builder for [`FieldMap`]; call [`FieldMapBuilder::build`] to validate.
#[derive(Debug, Clone, Default)]
pub struct FieldMapBuilder {
    name: &'static str,
    series_key: Option<Field>,
    title: Option<Field>,
    url: Option<Field>,
    url_base: Option<&'static str>,
    synopsis: Option<Field>,
    series_no: Option<Field>,
    episode_no: Option<Field>,
    kind: Option<Field>,
}

impl FieldMapBuilder {
    pub fn series_key(mut self, field: Field) -> Self {
        self.series_key = Some(field);
        self
    }

    pub fn title(mut self, field: Field) -> Self {
        self.title = Some(field);
        self
    }

    pub fn url(mut self, field: Field) -> Self {
        self.url = Some(field);
        self
    }

    /// Base that relative URLs are joined onto.
    pub fn url_base(mut self, base: &'static str) -> Self {
        self.url_base = Some(base);
        self
    }

    pub fn synopsis(mut self, field: Field) -> Self {
        self.synopsis = Some(field);
        self
    }

    pub fn series_no(mut self, field: Field) -> Self {
        self.series_no = Some(field);
        self
    }

    pub fn episode_no(mut self, field: Field) -> Self {
        self.episode_no = Some(field);
        self
    }

    pub fn kind(mut self, field: Field) -> Self {
        self.kind = Some(field);
        self
    }

    /// Validates the declaration and produces the field map.
    pub fn build(self) -> Result<FieldMap, FieldMapError> {
        let name = self.name;
        let title = self.title.ok_or(FieldMapError::MissingTarget {
            map: name,
            target: "title",
        })?;
        let url = self.url.ok_or(FieldMapError::MissingTarget {
            map: name,
            target: "url",
        })?;

        let declared = [
            ("series_key", self.series_key),
            ("title", Some(title)),
            ("url", Some(url)),
            ("synopsis", self.synopsis),
            ("series_no", self.series_no),
            ("episode_no", self.episode_no),
            ("kind", self.kind),
        ];
        for (target, field) in declared {
            if let Some(field) = field {
                if !is_json_pointer(field.path) {
                    return Err(FieldMapError::InvalidPath {
                        map: name,
                        target,
                        path: field.path,
                    });
                }
            }
        }

        let url_base = self
            .url_base
            .map(|base| {
                Url::parse(base).map_err(|source| FieldMapError::InvalidBase {
                    map: name,
                    base,
                    source,
                })
            })
            .transpose()?;

        Ok(FieldMap {
            name,
            series_key: self.series_key,
            title,
            url,
            url_base,
            synopsis: self.synopsis,
            series_no: self.series_no,
            episode_no: self.episode_no,
            kind: self.kind,
        })
    }
}

impl FieldMap {
    /// Starts a new map declaration; `name` shows up in error messages.
    pub fn builder(name: &'static str) -> FieldMapBuilder {
        FieldMapBuilder {
            name,
            ..FieldMapBuilder::default()
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Maps one upstream record to an episode and its catalog key.
    pub fn apply(&self, record: &Value) -> Result<MappedRecord, RecordError> {
        let series_key = match self.series_key {
            Some(field) => text(record, field, "series_key")?,
            None => None,
        };

        let title = text(record, self.title, "title")?.unwrap_or_default();

        let url = match text(record, self.url, "url")? {
            Some(raw) if !raw.trim().is_empty() => Some(self.resolve_url(raw.trim())?),
            _ => None,
        };

        let synopsis = match self.synopsis {
            Some(field) => text(record, field, "synopsis")?
                .map(|s| html_to_text(&s))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| NO_SYNOPSIS.to_string()),
            None => NO_SYNOPSIS.to_string(),
        };

        let series_no = match self.series_no {
            Some(field) => number(record, field, "series_no")?,
            None => None,
        };
        let episode_no = match self.episode_no {
            Some(field) => number(record, field, "episode_no")?,
            None => None,
        };

        let kind = match self.kind {
            Some(field) => text(record, field, "kind")?
                .map(|k| ContentKind::from_upstream(&k))
                .unwrap_or_default(),
            None => ContentKind::Unknown,
        };

        Ok(MappedRecord {
            series_key,
            episode: Episode {
                title,
                url,
                synopsis,
                series_no,
                episode_no,
                kind,
            },
        })
    }

    fn resolve_url(&self, raw: &str) -> Result<Url, RecordError> {
        if let Ok(url) = Url::parse(raw) {
            return Ok(url);
        }
        match &self.url_base {
            Some(base) => base
                .join(raw)
                .map_err(|_| RecordError::InvalidUrl(raw.to_string())),
            None => Err(RecordError::InvalidUrl(raw.to_string())),
        }
    }
}

fn is_json_pointer(path: &str) -> bool {
    path.starts_with('/') && path.len() > 1
}

/// Reads a text field, accepting strings and scalars.
fn text(record: &Value, field: Field, target: &'static str) -> Result<Option<String>, RecordError> {
    let found = match record.pointer(field.path) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => {
            return Err(RecordError::InvalidValue {
                target,
                path: field.path,
                value: other.to_string(),
            });
        }
    };

    match (found, field.presence) {
        (Some(value), _) => Ok(Some(value)),
        (None, Presence::Required) => Err(RecordError::MissingField {
            target,
            path: field.path,
        }),
        (None, Presence::Fallback(default)) => Ok(Some(default.to_string())),
        (None, Presence::Optional) => Ok(None),
    }
}

/// Reads a number field; strings such as `"Series 3"` yield their first number.
fn number(record: &Value, field: Field, target: &'static str) -> Result<Option<u32>, RecordError> {
    let raw = text(record, field, target)?;
    let parsed = raw.as_deref().and_then(first_number);

    match (parsed, raw, field.presence) {
        (Some(n), _, _) => Ok(Some(n)),
        (None, Some(value), Presence::Required) => Err(RecordError::InvalidValue {
            target,
            path: field.path,
            value,
        }),
        (None, _, _) => Ok(None),
    }
}

fn first_number(value: &str) -> Option<u32> {
    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn episode_map() -> FieldMap {
        FieldMap::builder("test-episodes")
            .title(Field::required("/title"))
            .url(Field::required("/_permalink"))
            .url_base("https://player.stv.tv")
            .synopsis(Field::optional("/summary"))
            .series_no(Field::optional("/playerSeries/name"))
            .episode_no(Field::optional("/number"))
            .kind(Field::optional("/type"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_title_and_url() {
        let err = FieldMap::builder("broken")
            .url(Field::required("/url"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::MissingTarget { target: "title", .. }));

        let err = FieldMap::builder("broken")
            .title(Field::required("/title"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::MissingTarget { target: "url", .. }));
    }

    #[test]
    fn test_build_rejects_bad_paths_and_bases() {
        let err = FieldMap::builder("broken")
            .title(Field::required("title"))
            .url(Field::required("/url"))
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidPath { target: "title", .. }));

        let err = FieldMap::builder("broken")
            .title(Field::required("/title"))
            .url(Field::required("/url"))
            .url_base("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, FieldMapError::InvalidBase { .. }));
    }

    #[test]
    fn test_apply_maps_full_record() {
        let record = json!({
            "title": "Old Friends",
            "_permalink": "/episode/abc/joan",
            "summary": "<p>Joan is <b>back</b>.</p>",
            "playerSeries": { "name": "Series 2" },
            "number": 4,
            "type": "showVideo"
        });

        let mapped = episode_map().apply(&record).unwrap();
        let ep = mapped.episode;
        assert_eq!(ep.title, "Old Friends");
        assert_eq!(
            ep.url.as_ref().map(Url::as_str),
            Some("https://player.stv.tv/episode/abc/joan")
        );
        assert_eq!(ep.synopsis, "Joan is back.");
        assert_eq!(ep.series_no, Some(2));
        assert_eq!(ep.episode_no, Some(4));
        assert_eq!(ep.kind, ContentKind::Show);
        assert_eq!(mapped.series_key, None);
    }

    #[test]
    fn test_apply_reports_missing_required_field() {
        let record = json!({ "title": "No link" });
        let err = episode_map().apply(&record).unwrap_err();
        assert!(matches!(err, RecordError::MissingField { target: "url", .. }));
    }

    #[test]
    fn test_apply_uses_fallbacks_and_optional_absence() {
        let map = FieldMap::builder("test-search")
            .series_key(Field::fallback("/title", "Unknown Series"))
            .title(Field::fallback("/title", "Unknown Title"))
            .url(Field::optional("/page/href"))
            .synopsis(Field::fallback("/synopsis", "No synopsis available."))
            .build()
            .unwrap();

        let mapped = map.apply(&json!({})).unwrap();
        assert_eq!(mapped.series_key.as_deref(), Some("Unknown Series"));
        assert_eq!(mapped.episode.title, "Unknown Title");
        assert!(mapped.episode.url.is_none());
        assert_eq!(mapped.episode.synopsis, NO_SYNOPSIS);
        assert_eq!(mapped.episode.series_no, None);
    }

    #[test]
    fn test_relative_url_without_base_is_an_error() {
        let map = FieldMap::builder("no-base")
            .title(Field::required("/title"))
            .url(Field::required("/url"))
            .build()
            .unwrap();
        let err = map.apply(&json!({ "title": "x", "url": "/relative" })).unwrap_err();
        assert!(matches!(err, RecordError::InvalidUrl(_)));
    }

    #[test]
    fn test_structured_value_in_text_field_is_invalid() {
        let err = episode_map()
            .apply(&json!({ "title": ["a"], "_permalink": "/x" }))
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidValue { target: "title", .. }));
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("Series 3"), Some(3));
        assert_eq!(first_number("12"), Some(12));
        assert_eq!(first_number("Series 10 Part 2"), Some(10));
        assert_eq!(first_number("Specials"), None);
    }
}
