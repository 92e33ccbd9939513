//! Event loop tying the controller to the client and the terminal.
//!
//! The loop runs on a single thread. Requests are futures collected in a
//! [`FuturesUnordered`] and polled alongside input, so several may be in
//! flight at once (a search typed while a page is loading); none is ever
//! cancelled. Every settled request goes back through
//! [`QueryStateController::settle`], which decides whether it is shown.
//!
//! Two modes are offered:
//! - [`App::run_batch`]: load up to N pages of the initial selection and return
//! - [`App::run_interactive`]: read commands and search text line by line

use crate::api::{FetchError, HeadlinesSource};
use crate::controller::{FetchTicket, QueryStateController, RenderUpdate};
use crate::input::{Command, Debouncer, parse_command};
use crate::models::Article;
use crate::outputs::cards::{HELP, render_header, render_loading, render_update};
use crate::theme::{Theme, ThemeStore};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::error::Error;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Duration, Instant, sleep_until};
use tracing::{debug, info, instrument, warn};

type Settled = (FetchTicket, Result<Vec<Article>, FetchError>);

/// Owns the controller for the lifetime of a session.
#[derive(Debug)]
pub struct App<C, W> {
    controller: QueryStateController,
    client: C,
    theme: Theme,
    theme_store: ThemeStore,
    debounce: Duration,
    out: W,
}

impl<C, W> App<C, W>
where
    C: HeadlinesSource,
    W: Write,
{
    pub fn new(
        controller: QueryStateController,
        client: C,
        theme: Theme,
        theme_store: ThemeStore,
        debounce: Duration,
        out: W,
    ) -> Self {
        Self {
            controller,
            client,
            theme,
            theme_store,
            debounce,
            out,
        }
    }

    pub fn controller(&self) -> &QueryStateController {
        &self.controller
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Load the initial page and then up to `pages - 1` more, one at a time.
    ///
    /// Stops early once a page comes back empty or fails.
    #[instrument(level = "info", skip(self))]
    pub async fn run_batch(&mut self, pages: u32) -> Result<(), Box<dyn Error>> {
        self.out
            .write_all(render_header(self.controller.state(), self.theme).as_bytes())?;

        let mut next = Some(self.controller.start());
        let mut fetched = 0u32;
        while let Some(ticket) = next.take() {
            self.out.write_all(render_loading().as_bytes())?;
            let result = self.client.fetch(&ticket.params).await;
            let had_articles = matches!(&result, Ok(articles) if !articles.is_empty());
            if let Some(update) = self.controller.settle(&ticket, result) {
                show(&mut self.out, &update, self.theme)?;
            }
            fetched += 1;
            if had_articles && fetched < pages {
                next = self.controller.load_more();
            }
        }

        info!(
            pages = fetched,
            articles = self.controller.state().articles.len(),
            notice = ?self.controller.notice(),
            "Batch complete"
        );
        Ok(())
    }

    /// Read commands from `input` until it closes or `/quit` is entered.
    ///
    /// When input closes, any pending search is issued and every outstanding
    /// request is allowed to settle before returning.
    #[instrument(level = "info", skip_all)]
    pub async fn run_interactive<R>(&mut self, input: R) -> Result<(), Box<dyn Error>>
    where
        R: AsyncBufRead + Unpin,
    {
        let Self {
            controller,
            client,
            theme,
            theme_store,
            debounce,
            out,
        } = self;
        let client = &*client;

        let mut lines = input.lines();
        let mut debouncer = Debouncer::new(*debounce);
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, Settled>> = FuturesUnordered::new();

        out.write_all(render_header(controller.state(), *theme).as_bytes())?;
        writeln!(out, "(/help for commands)")?;
        in_flight.push(dispatch(client, controller.start()));
        out.write_all(render_loading().as_bytes())?;

        loop {
            let deadline = debouncer.deadline();
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        break;
                    };
                    match parse_command(&line) {
                        Command::Search(text) => debouncer.push(text, Instant::now()),
                        Command::Category(category) => {
                            debouncer.cancel();
                            in_flight.push(dispatch(client, controller.select_category(category)));
                            out.write_all(render_header(controller.state(), *theme).as_bytes())?;
                            out.write_all(render_loading().as_bytes())?;
                        }
                        Command::More => match controller.load_more() {
                            Some(ticket) => {
                                in_flight.push(dispatch(client, ticket));
                                out.write_all(render_loading().as_bytes())?;
                            }
                            None => writeln!(out, "still loading…")?,
                        },
                        Command::ToggleTheme => {
                            *theme = theme.toggled();
                            if let Err(e) = theme_store.save(*theme).await {
                                warn!(error = %e, "Could not persist theme");
                            }
                            out.write_all(render_header(controller.state(), *theme).as_bytes())?;
                        }
                        Command::Help => out.write_all(HELP.as_bytes())?,
                        Command::Quit => return Ok(()),
                        Command::Invalid(message) => writeln!(out, "! {message}")?,
                    }
                }
                Some((ticket, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(update) = controller.settle(&ticket, result) {
                        show(out, &update, *theme)?;
                    }
                }
                _ = wait_until(deadline), if deadline.is_some() => {
                    if let Some(text) = debouncer.take_due(Instant::now()) {
                        in_flight.push(dispatch(client, controller.set_search_query(&text)));
                        out.write_all(render_header(controller.state(), *theme).as_bytes())?;
                        out.write_all(render_loading().as_bytes())?;
                    }
                }
            }
            out.flush()?;
        }

        if let Some(text) = debouncer.flush() {
            in_flight.push(dispatch(client, controller.set_search_query(&text)));
            out.write_all(render_header(controller.state(), *theme).as_bytes())?;
            out.write_all(render_loading().as_bytes())?;
        }
        while let Some((ticket, result)) = in_flight.next().await {
            if let Some(update) = controller.settle(&ticket, result) {
                show(out, &update, *theme)?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

fn dispatch<C: HeadlinesSource>(client: &C, ticket: FetchTicket) -> LocalBoxFuture<'_, Settled> {
    async move {
        let result = client.fetch(&ticket.params).await;
        (ticket, result)
    }
    .boxed_local()
}

fn show<W: Write>(out: &mut W, update: &RenderUpdate, theme: Theme) -> std::io::Result<()> {
    out.write_all(render_update(update, theme).as_bytes())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{BrowseState, Filter, RequestParams, StalePolicy};
    use crate::models::{Category, sample_article};
    use crate::outputs::cards::LOADING;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves fixed pages keyed by topic or query; `fail` always errors.
    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, Vec<Vec<Article>>>,
        calls: RefCell<Vec<RequestParams>>,
    }

    impl FakeSource {
        fn with(mut self, key: &str, pages: Vec<Vec<Article>>) -> Self {
            self.pages.insert(key.to_string(), pages);
            self
        }
    }

    impl HeadlinesSource for FakeSource {
        async fn fetch(&self, params: &RequestParams) -> Result<Vec<Article>, FetchError> {
            self.calls.borrow_mut().push(params.clone());
            let key = match &params.filter {
                Filter::Query(q) => q.as_str(),
                Filter::Topic(topic) => *topic,
            };
            if key == "fail" {
                return Err(FetchError::Status(500));
            }
            Ok(self
                .pages
                .get(key)
                .and_then(|pages| pages.get(params.page as usize - 1))
                .cloned()
                .unwrap_or_default())
        }
    }

    fn articles(range: std::ops::Range<usize>) -> Vec<Article> {
        range.map(sample_article).collect()
    }

    fn app(source: FakeSource, state: BrowseState) -> App<FakeSource, Vec<u8>> {
        let tmp = std::env::temp_dir().join("headline_browser_test_theme_unused");
        App::new(
            QueryStateController::new(state, StalePolicy::Discard),
            source,
            Theme::Light,
            ThemeStore::at(tmp),
            Duration::from_millis(500),
            Vec::new(),
        )
    }

    fn output(app: App<FakeSource, Vec<u8>>) -> String {
        String::from_utf8(app.into_output()).unwrap()
    }

    #[tokio::test]
    async fn test_batch_loads_pages_until_empty() {
        let source = FakeSource::default().with("world", vec![articles(0..2), articles(2..4)]);
        let mut app = app(source, BrowseState::new(2));

        app.run_batch(5).await.unwrap();

        assert_eq!(app.controller().state().articles, articles(0..4));
        assert_eq!(app.controller().state().page, 3);
        assert!(!app.controller().state().loading);
        let calls = app.client.calls.borrow().iter().map(|p| p.page).collect::<Vec<_>>();
        assert_eq!(calls, vec![1, 2, 3]);

        let text = output(app);
        assert!(text.contains("-- 2 articles --"));
        assert!(text.contains("Headline 3"));
        assert!(text.ends_with("! no results\n"));
    }

    #[tokio::test]
    async fn test_batch_respects_page_limit() {
        let source = FakeSource::default().with("sports", vec![articles(0..2), articles(2..4)]);
        let mut app = app(source, BrowseState::new(2).with_category(Category::Sports));

        app.run_batch(1).await.unwrap();

        assert_eq!(app.controller().state().articles, articles(0..2));
        assert_eq!(app.client.calls.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_failure_reports_once() {
        let mut app = app(FakeSource::default(), BrowseState::new(9).with_query("fail"));

        app.run_batch(3).await.unwrap();

        assert!(!app.controller().state().loading);
        assert_eq!(app.client.calls.borrow().len(), 1);
        assert!(output(app).contains("! failed to load"));
    }

    #[tokio::test]
    async fn test_interactive_search_is_flushed_on_close() {
        let source = FakeSource::default()
            .with("world", vec![articles(0..2)])
            .with("apple", vec![articles(10..12)]);
        let mut app = app(source, BrowseState::new(2));

        app.run_interactive(&b"appl\napple\n"[..]).await.unwrap();

        let state = app.controller().state();
        assert_eq!(state.query, "apple");
        assert_eq!(state.articles, articles(10..12));
        assert!(!state.loading);

        let searches = app
            .client
            .calls
            .borrow()
            .iter()
            .filter(|p| matches!(p.filter, Filter::Query(_)))
            .count();
        assert_eq!(searches, 1);
    }

    #[tokio::test]
    async fn test_interactive_category_overrides_pending_search() {
        let source = FakeSource::default()
            .with("world", vec![articles(0..2)])
            .with("apple", vec![articles(10..12)])
            .with("sports", vec![articles(20..22)]);
        let mut app = app(source, BrowseState::new(2));

        app.run_interactive(&b"apple\n/category sports\n"[..])
            .await
            .unwrap();

        let state = app.controller().state();
        assert_eq!(state.category, Category::Sports);
        assert_eq!(state.query, "");
        assert_eq!(state.articles, articles(20..22));
        assert!(output(app).contains("[sports]"));
    }

    #[tokio::test]
    async fn test_interactive_shows_loading_before_results() {
        let source = FakeSource::default()
            .with("world", vec![articles(0..2)])
            .with("sports", vec![articles(20..22)])
            .with("health", vec![articles(30..32)]);
        let mut app = app(source, BrowseState::new(2));

        app.run_interactive(&b"/category sports\n/category health\n\n"[..])
            .await
            .unwrap();

        let text = output(app);
        // startup and both categories; the trailing /more may find a request still open
        let loading_lines = text.lines().filter(|l| *l == LOADING).count();
        assert!(loading_lines >= 3, "{text}");

        let header_at = text.find("[health]").unwrap();
        let loading_at = header_at + text[header_at..].find(LOADING).unwrap();
        let cards_at = text.find("Headline 30").unwrap();
        assert!(header_at < loading_at && loading_at < cards_at);
    }

    #[tokio::test]
    async fn test_batch_shows_loading_per_page() {
        let source = FakeSource::default().with("world", vec![articles(0..2)]);
        let mut app = app(source, BrowseState::new(2));

        app.run_batch(3).await.unwrap();

        let text = output(app);
        assert_eq!(text.lines().filter(|l| *l == LOADING).count(), 2);
        assert!(text.find(LOADING).unwrap() < text.find("Headline 0").unwrap());
    }

    #[tokio::test]
    async fn test_interactive_search_fires_after_quiet_period() {
        use tokio::io::{AsyncWriteExt, BufReader, duplex};

        let source = FakeSource::default()
            .with("world", vec![articles(0..2)])
            .with("apple", vec![articles(10..11)]);
        let mut app = app(source, BrowseState::new(2));
        let (mut typing, terminal) = duplex(64);

        let user = async move {
            typing.write_all(b"apple\n").await.unwrap();
            tokio::time::sleep(Duration::from_millis(900)).await;
            // quitting skips the close-time flush, so only the timer can have searched
            typing.write_all(b"/quit\n").await.unwrap();
        };
        let (result, ()) = tokio::join!(app.run_interactive(BufReader::new(terminal)), user);
        result.unwrap();

        let state = app.controller().state();
        assert_eq!(state.query, "apple");
        assert_eq!(state.articles, articles(10..11));
        assert!(!state.loading);
        assert!(output(app).contains("Search: \"apple\""));
    }

    #[tokio::test]
    async fn test_interactive_invalid_and_help() {
        let source = FakeSource::default().with("world", vec![articles(0..1)]);
        let mut app = app(source, BrowseState::new(1));

        app.run_interactive(&b"/dance\n/help\n/quit\nnever read\n"[..])
            .await
            .unwrap();

        let text = output(app);
        assert!(text.contains("! unknown command `/dance`"));
        assert!(text.contains("/category <name>"));
    }
}
