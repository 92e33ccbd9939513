//! Browse state and the transitions that drive fetching.
//!
//! [`QueryStateController`] owns the single [`BrowseState`] of a session. Each
//! user action is a pure state change that hands back a [`FetchTicket`]; the
//! caller performs the request and reports the outcome through
//! [`QueryStateController::settle`], which merges the results and returns the
//! [`RenderUpdate`] the display should apply.
//!
//! # State machine
//!
//! ```text
//!   Idle ──(start / select_category / set_search_query / load_more)──▶ Loading
//!   Loading ──(settle: articles | empty | failure)──▶ Idle
//!   Loading ──(load_more)──▶ Loading   (rejected, no change)
//! ```
//!
//! # Overlapping requests
//!
//! Requests are never cancelled. Every ticket carries a generation number and
//! only the newest generation is current. What happens when an older ticket
//! settles is governed by [`StalePolicy`].

use crate::api::FetchError;
use crate::models::{Article, Category};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Language tag sent with every request.
pub const LANGUAGE: &str = "en";

/// Results per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Everything the controller knows about the current browse position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseState {
    pub category: Category,
    pub query: String,
    pub page: u32,
    pub page_size: u32,
    pub loading: bool,
    pub articles: Vec<Article>,
}

impl BrowseState {
    /// Default state: first category, no search, page 1, nothing loaded.
    ///
    /// A page size of zero is bumped to one.
    pub fn new(page_size: u32) -> Self {
        Self {
            category: Category::default(),
            query: String::new(),
            page: 1,
            page_size: page_size.max(1),
            loading: false,
            articles: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.trim().to_string();
        self
    }

    /// Whether a free-text search is the active filter.
    pub fn searching(&self) -> bool {
        !self.query.is_empty()
    }
}

impl Default for BrowseState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// The single filter dimension applied to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Free-text search (`q`).
    Query(String),
    /// Topic identifier (`topic`), already mapped from the category.
    Topic(&'static str),
}

/// Parameters for one `top-headlines` request, minus the API token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    pub lang: &'static str,
    pub max: u32,
    pub page: u32,
    pub filter: Filter,
}

impl RequestParams {
    /// Query pairs in the order they are sent.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("lang", self.lang.to_string()),
            ("max", self.max.to_string()),
            ("page", self.page.to_string()),
        ];
        match &self.filter {
            Filter::Query(q) => pairs.push(("q", q.clone())),
            Filter::Topic(topic) => pairs.push(("topic", (*topic).to_string())),
        }
        pairs
    }
}

/// Derive the parameters for the next request from `state`.
///
/// A non-empty query always wins over the category.
pub fn derive_request_params(state: &BrowseState) -> RequestParams {
    let filter = if state.searching() {
        Filter::Query(state.query.clone())
    } else {
        Filter::Topic(state.category.topic())
    };
    RequestParams {
        lang: LANGUAGE,
        max: state.page_size,
        page: state.page,
        filter,
    }
}

/// How a settled page combines with the articles already shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// First page after a reset; the list is rebuilt from the result.
    Replace,
    /// A further page; the result goes after what is already there.
    Append,
}

/// What to do with a response whose ticket has been superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Ignore it entirely; state and `loading` are left alone.
    #[default]
    Discard,
    /// Apply it as if it were current and clear `loading`.
    LastWriteWins,
}

/// A request the caller must perform and then hand back to [`QueryStateController::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub params: RequestParams,
    pub mode: MergeMode,
}

/// User-visible outcome of a fetch that produced nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    NoResults,
    RequestFailed,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::NoResults => "no results",
            Notice::RequestFailed => "failed to load",
        }
    }
}

/// What the display should do after a fetch settles.
///
/// For [`MergeMode::Replace`] `articles` is the whole list; for
/// [`MergeMode::Append`] it is only the new slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderUpdate {
    pub mode: MergeMode,
    pub articles: Vec<Article>,
    pub loading: bool,
    pub notice: Option<Notice>,
}

/// Owns the browse state and mediates every transition.
#[derive(Debug)]
pub struct QueryStateController {
    state: BrowseState,
    policy: StalePolicy,
    generation: u64,
    notice: Option<Notice>,
}

impl QueryStateController {
    pub fn new(state: BrowseState, policy: StalePolicy) -> Self {
        Self {
            state,
            policy,
            generation: 0,
            notice: None,
        }
    }

    pub fn state(&self) -> &BrowseState {
        &self.state
    }

    /// The notice currently displayed, if any.
    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    /// Parameters the next request would carry.
    pub fn request_params(&self) -> RequestParams {
        derive_request_params(&self.state)
    }

    /// Initial fetch for whatever state the controller was built with.
    pub fn start(&mut self) -> FetchTicket {
        info!(
            category = %self.state.category,
            query = %self.state.query,
            "Starting initial fetch"
        );
        self.begin_fetch(MergeMode::Replace)
    }

    /// Switch to `category`, dropping any search. Always resets, even when
    /// `category` is already selected.
    pub fn select_category(&mut self, category: Category) -> FetchTicket {
        info!(%category, "Category selected");
        self.state.category = category;
        self.state.query.clear();
        self.reset_position();
        self.begin_fetch(MergeMode::Replace)
    }

    /// Search for `text`. An empty text falls back to the stored category.
    pub fn set_search_query(&mut self, text: &str) -> FetchTicket {
        let text = text.trim();
        info!(query = %text, "Search query set");
        self.state.query = text.to_string();
        self.reset_position();
        self.begin_fetch(MergeMode::Replace)
    }

    /// Request the next page. Returns `None` while a request is in flight.
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        if self.state.loading {
            debug!(page = self.state.page, "load_more ignored while loading");
            return None;
        }
        self.state.page += 1;
        info!(page = self.state.page, "Loading more");
        Some(self.begin_fetch(MergeMode::Append))
    }

    /// Apply the outcome of `ticket`'s request.
    ///
    /// Returns `None` when the outcome was discarded as stale.
    pub fn settle(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<Article>, FetchError>,
    ) -> Option<RenderUpdate> {
        let current = ticket.generation == self.generation;
        if !current && self.policy == StalePolicy::Discard {
            debug!(
                stale = ticket.generation,
                current = self.generation,
                "Discarding stale response"
            );
            return None;
        }

        self.state.loading = false;

        let articles = match result {
            Ok(articles) if articles.is_empty() => {
                info!(page = ticket.params.page, "No results");
                self.notice = Some(Notice::NoResults);
                Vec::new()
            }
            Ok(articles) => {
                self.notice = None;
                match ticket.mode {
                    MergeMode::Replace => {
                        self.state.articles = articles;
                        self.state.articles.clone()
                    }
                    MergeMode::Append => {
                        self.state.articles.extend(articles.iter().cloned());
                        articles
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, page = ticket.params.page, "Fetch failed");
                self.notice = Some(Notice::RequestFailed);
                Vec::new()
            }
        };

        info!(
            generation = ticket.generation,
            received = articles.len(),
            total = self.state.articles.len(),
            "Fetch settled"
        );

        Some(RenderUpdate {
            mode: ticket.mode,
            articles,
            loading: self.state.loading,
            notice: self.notice,
        })
    }

    fn reset_position(&mut self) {
        self.state.page = 1;
        self.state.articles.clear();
    }

    fn begin_fetch(&mut self, mode: MergeMode) -> FetchTicket {
        self.generation += 1;
        self.state.loading = true;
        FetchTicket {
            generation: self.generation,
            params: derive_request_params(&self.state),
            mode,
        }
    }
}

impl Default for QueryStateController {
    fn default() -> Self {
        Self::new(BrowseState::default(), StalePolicy::default())
    }
}
