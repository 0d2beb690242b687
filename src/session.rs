//! Top-level search orchestration.
//!
//! One `SearchRunner` owns the two persisted stores for the life of the
//! process; each `search` call owns its browser session and transient
//! state. The runner sequences navigation (deep link first, manual form
//! fallback), blocking and no-matches detection, per-tab extraction,
//! aggregation, and the conversion of every residual fault into the fixed
//! status taxonomy. Callers always get a complete `SearchOutcome`.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::browser::{Browser, BrowserType};
use crate::config::Config;
use crate::errors::SearchFault;
use crate::extract;
use crate::generation::ScriptGenClient;
use crate::interact::{self, Interactor};
use crate::learner::SelectorLearner;
use crate::notify::Notifier;
use crate::script_cache::ScriptCache;
use crate::types::{ResultMap, SearchCategory, SearchOutcome, SearchRequest, StatusCode};

/// Settle time after a navigation before judging the page
const NAVIGATION_SETTLE: Duration = Duration::from_secs(3);
/// How long to wait for the results-readiness signal in the manual flow
const RESULTS_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SearchRunner {
    config: Config,
    browser_type: BrowserType,
    learner: Arc<Mutex<SelectorLearner>>,
    cache: Arc<Mutex<ScriptCache>>,
    generator: Option<ScriptGenClient>,
    notifier: Notifier,
}

impl SearchRunner {
    /// Load the stores and wire up collaborators. Store files may be
    /// missing or corrupt; both cases start empty.
    pub fn new(config: Config, browser_type: BrowserType) -> Self {
        let learner = SelectorLearner::load(&config.data_dir);
        let cache = ScriptCache::load(&config.data_dir);
        let generator = config
            .api_key
            .as_ref()
            .map(|key| ScriptGenClient::new(key, &config.api_base, &config.model));
        let notifier = Notifier::new(config.webhook_url.clone());

        SearchRunner {
            config,
            browser_type,
            learner: Arc::new(Mutex::new(learner)),
            cache: Arc::new(Mutex::new(cache)),
            generator,
            notifier,
        }
    }

    /// Run one search to a structured outcome. Never returns an error:
    /// residual faults are classified into the status taxonomy here.
    pub async fn search(&self, request: &SearchRequest) -> SearchOutcome {
        let search_id = Uuid::new_v4();
        info!("Search {} starting for {}", search_id, request.image_url);

        let outcome = self.classify(request).await;

        self.persist_stores().await;

        info!(
            "Search {} finished: {} ({} results)",
            search_id, outcome.status, outcome.total_results
        );
        if outcome.status_code.should_alert() {
            self.notifier
                .alert(&format!("lensprobe [{}]: {}", outcome.status, outcome.message))
                .await;
        }

        outcome
    }

    async fn classify(&self, request: &SearchRequest) -> SearchOutcome {
        if let Err(reason) = validate_image_url(&request.image_url) {
            error!("{}", reason);
            return SearchOutcome::empty(StatusCode::InvalidInput, reason);
        }

        match self.run(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let fault = SearchFault::from(err);
                error!("Search failed: {}", fault);
                SearchOutcome::empty(fault.status(), fault.to_string())
            }
        }
    }

    /// Acquire a session, drive the flow under the aggregate deadline,
    /// and release the session on every path.
    async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        let browser = Browser::new(
            &self.config.webdriver_url,
            self.browser_type,
            self.config.headless,
        )
        .await?;

        let driven = tokio::time::timeout(
            self.config.search_deadline,
            self.drive(&browser, request),
        )
        .await;

        if let Err(e) = browser.close().await {
            warn!("Failed to release browser session: {}", e);
        }

        match driven {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "Search timed out after {:?}",
                self.config.search_deadline
            ),
        }
    }

    async fn drive(&self, browser: &Browser, request: &SearchRequest) -> Result<SearchOutcome> {
        let interactor = Interactor::new(
            browser,
            &self.learner,
            &self.cache,
            self.generator.as_ref(),
        );

        // Strategy 1: deep link straight to the results
        let deep_link = build_deep_link(&self.config.lens_base, &request.image_url, request.category);
        let direct_ok = match browser.goto(&deep_link).await {
            Ok(()) => {
                tokio::time::sleep(NAVIGATION_SETTLE).await;
                let content = browser.page_source_or_empty().await;
                if extract::is_blocking_page(&content) {
                    warn!("Direct navigation blocked, trying manual flow");
                    false
                } else {
                    true
                }
            }
            Err(e) => {
                warn!("Direct navigation failed: {}. Falling back to manual flow", e);
                false
            }
        };

        // Strategy 2: landing page plus the form
        if !direct_ok {
            info!("Using manual navigation");
            browser.goto(&format!("{}/upload", self.config.lens_base)).await?;
            tokio::time::sleep(NAVIGATION_SETTLE).await;

            interact::dismiss_cookie_consent(browser).await;

            if !interactor.smart_fill("url_input", &request.image_url).await {
                return Ok(SearchOutcome::empty(
                    StatusCode::InternalError,
                    "Failed to fill image URL input field",
                ));
            }
            if !interactor.smart_click("search_button", "Search").await {
                return Ok(SearchOutcome::empty(
                    StatusCode::InternalError,
                    "Failed to click search button",
                ));
            }
            if !extract::wait_for_results(browser, RESULTS_TIMEOUT).await {
                warn!("Results readiness signal never appeared");
            }
        }

        // Whichever path ran, the engine may have interposed a wall
        let content = browser.page_source_or_empty().await;
        if extract::is_blocking_page(&content) {
            return Ok(SearchOutcome::empty(
                StatusCode::RateLimited,
                "Rate limited or blocked by the search engine",
            ));
        }

        if extract::check_no_matches(browser).await {
            return Ok(SearchOutcome::empty(
                StatusCode::NoMatches,
                "No matches found for your search",
            ));
        }

        let mut results = ResultMap::new();
        let mut generation_failure: Option<anyhow::Error> = None;

        for (tab_type, tab_name) in request.category.tabs() {
            interact::pause(1000, 2000).await;

            if tab_type != "current_page" && interactor.smart_click(tab_type, tab_name).await {
                interact::pause(1000, 2000).await;
            }

            let key = tab_key(tab_name);

            if extract::check_no_matches(browser).await {
                results.insert(key, Vec::new());
                continue;
            }

            match extract::extract_items(browser, tab_name, self.generator.as_ref()).await {
                Ok(items) => {
                    results.insert(key, items);
                }
                Err(e) => {
                    warn!("Extraction failed on '{}': {}", tab_name, e);
                    results.insert(key, Vec::new());
                    generation_failure.get_or_insert(e);
                }
            }
        }

        let total: usize = results.values().map(Vec::len).sum();

        // A generation fault only decides the outcome when it may have
        // cost us every result
        if total == 0 && let Some(e) = generation_failure {
            return Err(e);
        }

        if total > 0 {
            Ok(SearchOutcome::new(
                StatusCode::Success,
                "Search completed successfully",
                results,
            ))
        } else {
            Ok(SearchOutcome::new(StatusCode::NoMatches, "No results found", results))
        }
    }

    async fn persist_stores(&self) {
        {
            let learner = self.learner.lock().await;
            if let Err(e) = learner.flush() {
                warn!("Failed to persist selector statistics: {}", e);
            }
        }
        let cache = self.cache.lock().await;
        cache.flush();
    }
}

/// Reject anything that is not an absolute http(s) URL
pub fn validate_image_url(raw: &str) -> Result<(), String> {
    let parsed =
        Url::parse(raw).map_err(|_| format!("Invalid image URL provided: {}", raw))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!("Unsupported URL scheme '{}': {}", scheme, raw)),
    }
}

/// Deep link encoding the image reference, with the category-specific
/// mode parameters when a single category is requested
pub fn build_deep_link(base: &str, image_url: &str, category: SearchCategory) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(image_url.as_bytes()).collect();
    let stamp = Utc::now().timestamp_millis();

    let mut link = format!(
        "{}/uploadbyurl?url={}&ep=cntpubu&hl=en&st={}&re=df&s=4",
        base, encoded, stamp
    );
    match category {
        SearchCategory::ExactMatches => link.push_str("&lns_mode=un&udm=48"),
        SearchCategory::VisualMatches => link.push_str("&lns_mode=visual&udm=44"),
        SearchCategory::All | SearchCategory::Both => {}
    }

    link
}

/// Result-map key for a tab label: lowercased, spaces to underscores
pub fn tab_key(tab_name: &str) -> String {
    tab_name.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;
