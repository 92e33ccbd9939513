//! Plain-text card rendering.
//!
//! Each article becomes a small bordered block:
//!
//! ```text
//! ┌ [image] https://news.example/markets.jpg
//! │ Markets rally
//! │ Stocks rose on Tuesday.
//! │ Example Wire · 2025-05-06
//! └ https://news.example/markets
//! ```
//!
//! Functions here only build strings; writing them out is the caller's job.

use crate::controller::{BrowseState, MergeMode, RenderUpdate};
use crate::models::{Article, Category};
use crate::theme::Theme;
use crate::utils::upcase;
use std::fmt::Write;

/// Placeholder shown when an article has no image.
pub const IMAGE_PLACEHOLDER: &str = "NEWS";

/// Shown when the publication date is missing or unreadable.
pub const UNKNOWN_DATE: &str = "unknown date";

/// Printed on its own line whenever a request goes out.
pub const LOADING: &str = "loading…";

pub fn render_card(article: &Article, theme: Theme) -> String {
    let (top, side, bottom) = theme.borders();
    let mut out = String::new();

    match article.image.as_deref().filter(|s| !s.is_empty()) {
        Some(image) => writeln!(out, "{top} [image] {image}").ok(),
        None => writeln!(out, "{top} [{IMAGE_PLACEHOLDER}]").ok(),
    };
    writeln!(out, "{side} {}", article.title.trim()).ok();
    writeln!(
        out,
        "{side} {}",
        article.description.as_deref().unwrap_or("").trim()
    )
    .ok();
    writeln!(
        out,
        "{side} {} · {}",
        article.source_name(),
        article
            .display_date()
            .unwrap_or_else(|| UNKNOWN_DATE.to_string())
    )
    .ok();
    writeln!(out, "{bottom} {}", article.url).ok();
    out
}

/// Category bar with the active category bracketed, plus the active filter.
pub fn render_header(state: &BrowseState, theme: Theme) -> String {
    let bar = Category::ALL
        .iter()
        .map(|c| {
            if *c == state.category {
                format!("[{}]", c.name())
            } else {
                c.name().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let filter = if state.searching() {
        format!("Search: \"{}\"", state.query)
    } else {
        format!("Top headlines: {}", upcase(state.category.name()))
    };

    format!("{} {bar}\n{filter}\n", theme.icon())
}

/// Text for a settled fetch: cards, a notice, or both.
pub fn render_update(update: &RenderUpdate, theme: Theme) -> String {
    let mut out = String::new();

    if let Some(notice) = update.notice {
        writeln!(out, "! {}", notice.message()).ok();
    }

    if update.mode == MergeMode::Replace && !update.articles.is_empty() {
        writeln!(out, "-- {} articles --", update.articles.len()).ok();
    }
    for article in &update.articles {
        out.push_str(&render_card(article, theme));
        out.push('\n');
    }
    out
}

/// Indicator line for a request that has just been issued.
pub fn render_loading() -> String {
    format!("{LOADING}\n")
}

pub const HELP: &str = "\
Type text to search (fires after you stop typing).
  /category <name>   show top headlines for a category
  /search            clear the search and go back to the category
  /more              load the next page (an empty line does the same)
  /theme             toggle light/dark
  /help              show this help
  /quit              exit
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Notice;
    use crate::models::sample_article;

    #[test]
    fn test_card_contains_fields() {
        let card = render_card(&sample_article(1), Theme::Light);
        assert!(card.starts_with("┌ [NEWS]"));
        assert!(card.contains("│ Headline 1\n"));
        assert!(card.contains("│ Description 1\n"));
        assert!(card.contains("Example Times · 2025-05-06"));
        assert!(card.ends_with("└ https://example.com/articles/1\n"));
    }

    #[test]
    fn test_card_fallbacks() {
        let mut article = sample_article(2);
        article.source = None;
        article.description = None;
        article.published_at = None;
        article.image = Some("https://example.com/2.jpg".to_string());

        let card = render_card(&article, Theme::Dark);
        assert!(card.starts_with("┏ [image] https://example.com/2.jpg"));
        assert!(card.contains("Unknown · unknown date"));
    }

    #[test]
    fn test_header_highlights_category_while_searching() {
        let state = BrowseState::default()
            .with_category(Category::Sports)
            .with_query("final");
        let header = render_header(&state, Theme::Light);
        assert!(header.contains("[sports]"));
        assert!(header.contains("Search: \"final\""));
        assert!(header.starts_with("🌙"));
    }

    #[test]
    fn test_header_without_search() {
        let header = render_header(&BrowseState::default(), Theme::Dark);
        assert!(header.contains("[general] business"));
        assert!(header.contains("Top headlines: General"));
    }

    #[test]
    fn test_update_with_notice() {
        let update = RenderUpdate {
            mode: MergeMode::Append,
            articles: Vec::new(),
            loading: false,
            notice: Some(Notice::NoResults),
        };
        assert_eq!(render_update(&update, Theme::Light), "! no results\n");
    }

    #[test]
    fn test_append_update_has_no_banner() {
        let update = RenderUpdate {
            mode: MergeMode::Append,
            articles: vec![sample_article(3)],
            loading: false,
            notice: None,
        };
        let text = render_update(&update, Theme::Light);
        assert!(!text.contains("articles --"));
        assert!(text.contains("Headline 3"));
    }
}
