//! Command-line interface definitions.
//!
//! Every option here can also come from the YAML config file (see
//! [`crate::config`]); values given on the command line win.

use crate::controller::StalePolicy;
use crate::models::Category;
use clap::Parser;

/// Command-line arguments for the headline browser.
///
/// # Examples
///
/// ```sh
/// # First page of world headlines
/// headline_browser --api-key YOUR_KEY
///
/// # Three pages of sports headlines, saved as JSON
/// headline_browser -t sports -p 3 -j ./json
///
/// # Interactive session
/// headline_browser -i
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// GNews API token
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Category to start with
    #[arg(short = 't', long, value_enum)]
    pub category: Option<Category>,

    /// Search text to start with (takes precedence over the category)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Number of pages to load in batch mode
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Results per page
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: Option<u32>,

    /// What to do with responses that arrive after a newer request was issued
    #[arg(long, value_enum)]
    pub stale_results: Option<StalePolicy>,

    /// Read commands and search text from stdin instead of exiting after the batch
    #[arg(short, long)]
    pub interactive: bool,

    /// Output directory for a JSON snapshot of the loaded articles
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["headline_browser"]);
        assert_eq!(cli.pages, 1);
        assert_eq!(cli.category, None);
        assert!(!cli.interactive);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "headline_browser",
            "-t",
            "sports",
            "-p",
            "3",
            "-j",
            "/tmp/json",
            "-i",
        ]);

        assert_eq!(cli.category, Some(Category::Sports));
        assert_eq!(cli.pages, 3);
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert!(cli.interactive);
    }

    #[test]
    fn test_cli_stale_policy() {
        let cli = Cli::parse_from(["headline_browser", "--stale-results", "last-write-wins"]);
        assert_eq!(cli.stale_results, Some(StalePolicy::LastWriteWins));
    }

    #[test]
    fn test_cli_rejects_zero_pages() {
        assert!(Cli::try_parse_from(["headline_browser", "-p", "0"]).is_err());
    }
}
