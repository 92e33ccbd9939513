//! Data models for headlines and the categories they are browsed by.
//!
//! This module defines the records exchanged with the headlines API:
//! - [`Category`]: The fixed set of topics a user can filter by
//! - [`Article`]: A single headline as returned by the API
//! - [`HeadlinesResponse`]: The envelope around a page of articles
//!
//! Articles are read-only once decoded; the controller only moves them
//! between pages and the display.

use chrono::DateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Shown in place of a missing source name.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A topic the headlines can be filtered by.
///
/// The first variant is the default selection at startup.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Business,
    Entertainment,
    Health,
    Science,
    Sports,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::Business,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::Sports,
    ];

    /// The name users type and see.
    pub fn name(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
        }
    }

    /// The identifier the API expects in its `topic` parameter.
    ///
    /// The API has no "general" topic; its closest equivalent is "world".
    /// Every other category is passed through unchanged.
    pub fn topic(self) -> &'static str {
        match self {
            Category::General => "world",
            other => other.name(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a category name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category `{0}` (expected one of: general, business, entertainment, health, science, sports)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

/// The publisher of an article.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ArticleSource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A single headline as returned by the API.
///
/// `url` doubles as the article's identity; no deduplication is performed
/// across pages. A missing title decodes as empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub source: Option<ArticleSource>,
    #[serde(default)]
    pub published_at: Option<String>,
}

impl Article {
    /// Source name for display, falling back to [`UNKNOWN_SOURCE`].
    pub fn source_name(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNKNOWN_SOURCE)
    }

    /// Publication date as `YYYY-MM-DD`.
    ///
    /// Returns `None` when the timestamp is absent or not RFC 3339.
    pub fn display_date(&self) -> Option<String> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|ts| ts.date_naive().format("%Y-%m-%d").to_string())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Body of a `top-headlines` response.
///
/// A body without an `articles` field is still well-formed; it decodes to an
/// empty page. Entries are kept raw so one malformed article does not sink
/// the rest of the page.
#[allow(non_snake_case)]
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HeadlinesResponse {
    #[serde(default)]
    pub totalArticles: Option<u64>,
    #[serde(default)]
    pub articles: Option<Vec<serde_json::Value>>,
}

impl HeadlinesResponse {
    /// Consume the envelope, yielding the page of articles (possibly empty).
    ///
    /// Entries that do not decode as an [`Article`] are logged and skipped.
    pub fn into_articles(self) -> Vec<Article> {
        self.articles
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| match serde_json::from_value::<Article>(raw) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!(index, error = %e, "Skipping undecodable article");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn sample_article(n: usize) -> Article {
    Article {
        title: format!("Headline {n}"),
        description: Some(format!("Description {n}")),
        url: format!("https://example.com/articles/{n}"),
        image: None,
        source: Some(ArticleSource {
            name: Some("Example Times".to_string()),
            url: Some("https://example.com".to_string()),
        }),
        published_at: Some("2025-05-06T08:30:00Z".to_string()),
    }
}
