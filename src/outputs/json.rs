//! JSON snapshot of a browsing session.
//!
//! After a run the accumulated article list and the position it was reached
//! at are written to `{json_output_dir}/{date}_{slug}.json`, where the slug is
//! the search text when searching and the category name otherwise. A later run
//! with the same filter on the same day overwrites the file.

use crate::controller::BrowseState;
use crate::models::{Article, Category};
use crate::utils::{ensure_writable_dir, slugify};
use chrono::Local;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub local_date: String,
    pub category: Category,
    pub query: &'a str,
    /// Last page requested; pages that came back empty or failed count too.
    pub page: u32,
    pub articles: &'a [Article],
}

impl<'a> Snapshot<'a> {
    pub fn of(state: &'a BrowseState) -> Self {
        Self {
            local_date: Local::now().date_naive().to_string(),
            category: state.category,
            query: &state.query,
            page: state.page,
            articles: &state.articles,
        }
    }

    pub fn file_name(&self) -> String {
        let slug = if self.query.is_empty() {
            self.category.name().to_string()
        } else {
            format!("search-{}", slugify(self.query))
        };
        format!("{}_{}.json", self.local_date, slug)
    }
}

/// Write the snapshot of `state` into `json_output_dir`, returning the path.
///
/// # Errors
///
/// Returns an error if the directory is not writable or serialization fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_snapshot(
    state: &BrowseState,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    ensure_writable_dir(json_output_dir).await?;

    let snapshot = Snapshot::of(state);
    let json = serde_json::to_string_pretty(&snapshot)?;
    let path = PathBuf::from(json_output_dir).join(snapshot.file_name());

    fs::write(&path, json).await?;
    info!(
        path = %path.display(),
        articles = snapshot.articles.len(),
        "Wrote JSON snapshot"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_article;

    #[test]
    fn test_file_name_for_category_and_search() {
        let state = BrowseState::default().with_category(Category::Health);
        let name = Snapshot::of(&state).file_name();
        assert!(name.ends_with("_health.json"));

        let state = BrowseState::default().with_query("Climate Talks");
        let name = Snapshot::of(&state).file_name();
        assert!(name.ends_with("_search-climate-talks.json"));
    }

    #[tokio::test]
    async fn test_write_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let mut state = BrowseState::default().with_category(Category::Sports);
        state.articles = vec![sample_article(1), sample_article(2)];
        state.page = 2;

        let path = write_snapshot(&state, dir.to_str().unwrap()).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["category"], "sports");
        assert_eq!(written["page"], 2);
        assert_eq!(written["articles"].as_array().unwrap().len(), 2);
        assert_eq!(written["articles"][0]["publishedAt"], "2025-05-06T08:30:00Z");
    }
}
