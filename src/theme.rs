//! Light/dark theme flag and its persistence.
//!
//! The flag is the only thing the browser remembers between runs. It is
//! stored as a single word (`light` or `dark`) in
//! `<data_dir>/headline_browser/theme`.

use crate::config::APP_DIR;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Icon for the control that switches away from this theme.
    pub fn icon(self) -> &'static str {
        match self {
            Theme::Dark => "☀️",
            Theme::Light => "🌙",
        }
    }

    /// Card border drawing characters: (top, side, bottom).
    pub fn borders(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Theme::Light => ("┌", "│", "└"),
            Theme::Dark => ("┏", "┃", "┗"),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ThemeError::Unknown(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown theme `{0}`")]
    Unknown(String),
    #[error("theme file unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("no data directory available for the theme file")]
    NoLocation,
}

/// Where the theme flag lives on disk.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: Option<PathBuf>,
}

impl ThemeStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The platform data directory; a store with no location if there is none.
    pub fn default_location() -> Self {
        Self {
            path: dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("theme")),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stored theme, or [`Theme::Light`] when nothing usable is stored.
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&self) -> Theme {
        let Some(path) = &self.path else {
            return Theme::default();
        };
        match fs::read_to_string(path).await {
            Ok(raw) => raw.parse().unwrap_or_else(|e: ThemeError| {
                warn!(error = %e, "Ignoring stored theme");
                Theme::default()
            }),
            Err(e) => {
                debug!(error = %e, path = %path.display(), "No stored theme");
                Theme::default()
            }
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn save(&self, theme: Theme) -> Result<(), ThemeError> {
        let path = self.path.as_ref().ok_or(ThemeError::NoLocation)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, theme.to_string()).await?;
        info!(%theme, path = %path.display(), "Saved theme");
        Ok(())
    }
}
