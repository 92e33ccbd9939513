//! Interactive input: line commands and search debouncing.
//!
//! Every line typed in interactive mode is parsed into a [`Command`]. Plain
//! text is search input; it goes through a [`Debouncer`] so that only the
//! latest text is searched once typing has paused.

use crate::models::{Category, UnknownCategory};
use tokio::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search text, not yet debounced. Empty text clears the search.
    Search(String),
    Category(Category),
    /// Next page; the terminal's stand-in for scrolling near the bottom.
    More,
    ToggleTheme,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::More;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Search(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "category" | "c" => match arg.parse::<Category>() {
            Ok(category) => Command::Category(category),
            Err(UnknownCategory(_)) if arg.is_empty() => {
                Command::Invalid("usage: /category <name>".to_string())
            }
            Err(e) => Command::Invalid(e.to_string()),
        },
        "search" | "s" => Command::Search(arg.to_string()),
        "more" | "m" => Command::More,
        "theme" => Command::ToggleTheme,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command `/{other}` (try /help)")),
    }
}

/// Holds back search text until input has been quiet for `delay`.
///
/// Each [`push`](Debouncer::push) replaces the pending text and restarts the
/// quiet period.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, text: String, now: Instant) {
        self.pending = Some((text, now + self.delay));
    }

    /// When the pending text becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Take the pending text if its quiet period has elapsed by `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        if self.deadline().is_some_and(|at| at <= now) {
            self.flush()
        } else {
            None
        }
    }

    /// Take the pending text regardless of the deadline.
    pub fn flush(&mut self) -> Option<String> {
        self.pending.take().map(|(text, _)| text)
    }

    /// Drop pending text, e.g. when a category is picked mid-typing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
