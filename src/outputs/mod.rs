//! Output generation for the terminal and for JSON snapshots.
//!
//! # Submodules
//!
//! - [`cards`]: Renders articles and render updates as text cards
//! - [`json`]: Writes the accumulated article list to a JSON file
//!
//! # Output Structure
//!
//! ```text
//! stdout                      # cards, headers and notices
//! json_output_dir/
//! └── 2025-05-06_sports.json  # one snapshot per run
//! ```

pub mod cards;
pub mod json;
