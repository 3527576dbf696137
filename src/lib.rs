//! Playlist mirror for a Plex music library.
//!
//! This library keeps a deduplicated local audio library in step with a set
//! of source playlists and mirrors the resulting playlists into Plex. Each
//! sync cycle resolves which tracks already exist on disk, downloads the
//! rest, rebuilds the `.m3u` manifests, evicts files nothing references any
//! more and finally replaces the non-protected Plex playlists with the fresh
//! manifests. Playlists marked as protected on Plex are never touched and
//! their files are never evicted.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints served by the scheduler (health)
//! - `catalog` - Source playlist catalog clients
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `cycle` - Orchestration of one sync cycle
//! - `download` - Download collaborator, tagging and library placement
//! - `management` - Local library state: identity index, manifests, eviction
//! - `plex` - Plex Media Server client and remote sync protocol
//! - `server` - Local HTTP server for the health endpoint
//! - `types` - Data structures and type definitions
//! - `utils` - Naming and path helpers
//!
//! # Example
//!
//! ```
//! use ampsassist::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> ampsassist::Res<()> {
//!     config::load_env().await?;
//!     let settings = config::Settings::from_env()?;
//!     cli::sync(&settings, cli::SyncOptions::default()).await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod download;
pub mod management;
pub mod plex;
pub mod server;
pub mod types;
pub mod utils;

/// Result alias for command-level glue where any error just gets reported.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a progress line prefixed with a blue `o`.
///
/// ```
/// info!("Playlist '{}': {} tracks", title, count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a completion line prefixed with a green check mark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red `!` line and exits with status 1.
///
/// Only the binary uses this, for startup problems such as invalid
/// configuration. Library code reports failures instead of exiting.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a recoverable problem prefixed with a yellow `!`.
///
/// Used for every per-item failure inside a cycle: a playlist that could
/// not be fetched, a track that failed to download, a Plex call that was
/// rejected.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
