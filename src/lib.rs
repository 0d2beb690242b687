//! # lensprobe
#![allow(clippy::uninlined_format_args)]
//!
//! Adaptive reverse-image search automation.
//!
//! Drives a Lens-style reverse-image search through a real browser and
//! recovers automatically when the page structure changes. Element
//! location runs through a three-tier fallback: learned and default
//! selectors first, then a cached generated script for the current page
//! fingerprint, then a freshly generated script as a last resort. A
//! persistent success-rate model keeps improving the first tier.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Search by image URL, harvesting the landing results page
//! lensprobe search "https://example.com/photo.jpg"
//!
//! # Harvest a specific result category
//! lensprobe search "https://example.com/photo.jpg" --category visual-matches
//!
//! # Both tabs, human-readable output
//! lensprobe search "https://example.com/photo.jpg" --category both --format simple
//!
//! # Inspect what the learner has picked up
//! lensprobe stats --element-type search_button
//!
//! # Reset the generated-script cache
//! lensprobe cache clear
//! ```
//!
//! A WebDriver endpoint must be reachable (geckodriver on :4444 by
//! default, or set `LENSPROBE_WEBDRIVER_URL`). Script generation needs
//! `LENSPROBE_API_KEY`; without it the generation tier is skipped and
//! the selector tier carries the load alone.
//!
//! ## Library Usage
//!
//! ```no_run
//! use lensprobe::browser::BrowserType;
//! use lensprobe::config::Config;
//! use lensprobe::session::SearchRunner;
//! use lensprobe::types::{SearchCategory, SearchRequest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let runner = SearchRunner::new(config, BrowserType::Firefox);
//!
//! let outcome = runner
//!     .search(&SearchRequest {
//!         image_url: "https://example.com/photo.jpg".to_string(),
//!         category: SearchCategory::All,
//!     })
//!     .await;
//!
//! println!("{} results ({})", outcome.total_results, outcome.status);
//! # Ok(())
//! # }
//! ```

/// WebDriver session wrapper with realistic identity
pub mod browser;

/// Environment-driven runtime configuration
pub mod config;

/// Residual fault classification into the status taxonomy
pub mod errors;

/// Result extraction and page classification heuristics
pub mod extract;

/// Script generation client
pub mod generation;

/// Three-tier element interaction
pub mod interact;

/// Selector success-rate learning
pub mod learner;

/// Fire-and-forget alert webhook
pub mod notify;

/// Bounded execution of generated in-page scripts
pub mod sandbox;

/// Persistent cache of generated scripts
pub mod script_cache;

/// Top-level search orchestration
pub mod session;

/// Request, outcome, and status types
pub mod types;

pub use browser::{Browser, BrowserType};
pub use config::Config;
pub use session::SearchRunner;
pub use types::{
    ExtractedItem, MatchRecord, OutputFormat, ResultMap, SearchCategory, SearchOutcome,
    SearchRequest, StatusCode,
};
