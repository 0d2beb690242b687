//! Three-tier element interaction.
//!
//! Tier 1 tries prioritized selectors (learned, then defaults) and feeds
//! every attempt back into the learner. Tier 2 replays a cached generated
//! script for the current page fingerprint. Tier 3 asks the generation
//! service for a fresh script and caches it on success. Tier ordering
//! pays for determinism first and a model round-trip last; failure is
//! always a value, never an error.

use fantoccini::Locator;
use lazy_static::lazy_static;
use rand::Rng;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::Browser;
use crate::generation::{self, ScriptGenClient};
use crate::learner::SelectorLearner;
use crate::sandbox;
use crate::script_cache::{ScriptCache, fingerprint};

/// Per-selector interactability wait
const SELECTOR_TIMEOUT: Duration = Duration::from_secs(5);
/// Fills settle faster than clicks
const FILL_TIMEOUT: Duration = Duration::from_secs(3);

lazy_static! {
    /// Shipped selector candidates per element type, ordered by expected
    /// reliability. The learner promotes proven ones ahead of these.
    pub static ref DEFAULT_SELECTORS: HashMap<&'static str, Vec<&'static str>> = {
        let mut table = HashMap::new();
        table.insert("url_input", vec![
            r#"role=textbox[name="Paste image link"]"#,
            r#"input[type="url"]"#,
            r#"input[placeholder*="image"]"#,
            r#"input[placeholder*="URL"]"#,
            r#"input[placeholder*="link"]"#,
            r#"input[aria-label*="image"]"#,
            r#"input[aria-label*="URL"]"#,
            r#"textarea[placeholder*="image"]"#,
            r#"div[contenteditable="true"]"#,
            r#"input[type="text"]"#,
        ]);
        table.insert("search_button", vec![
            r#"role=button[name="Search"]"#,
            r#"button[type="submit"]"#,
            "text=Search",
            r#"button[aria-label*="Search"]"#,
            r#"button[aria-label*="search"]"#,
            r#"input[type="submit"]"#,
            r#"div[role="button"]"#,
        ]);
        table.insert("visual_matches_tab", vec![
            r#"role=tab[name="Visual matches"]"#,
            r#"role=button[name="Visual matches"]"#,
            "text=Visual matches",
            r#"div[aria-label*="Visual matches"]"#,
            r#"[data-test*="visual"]"#,
        ]);
        table.insert("exact_matches_tab", vec![
            r#"role=tab[name="Exact matches"]"#,
            r#"role=button[name="Exact matches"]"#,
            "text=Exact matches",
            r#"div[aria-label*="Exact matches"]"#,
            r#"[data-test*="exact"]"#,
        ]);
        table.insert("cookie_consent", vec![
            "text=Accept all",
            "text=I agree",
            "text=Accept",
            r#"button[aria-label*="Accept"]"#,
            r#"button[aria-label*="Agree"]"#,
            "button#L2AGLb",
        ]);
        table
    };
}

/// Default candidates for an element type, empty when unknown
pub fn default_selectors(element_type: &str) -> Vec<&'static str> {
    DEFAULT_SELECTORS.get(element_type).cloned().unwrap_or_default()
}

/// A selector string resolved into a driver locator.
///
/// The resolution language supports `role=ROLE[name="X"]`, `text=X`, and
/// raw CSS; role and text forms translate to XPath.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLocator {
    Css(String),
    XPath(String),
}

impl ResolvedLocator {
    pub fn as_locator(&self) -> Locator<'_> {
        match self {
            ResolvedLocator::Css(css) => Locator::Css(css),
            ResolvedLocator::XPath(xpath) => Locator::XPath(xpath),
        }
    }
}

/// Parse one selector string from the resolution language
pub fn resolve_selector(selector: &str) -> ResolvedLocator {
    if let Some(rest) = selector.strip_prefix("role=") {
        let (role, name) = match rest.split_once(r#"[name=""#) {
            Some((role, tail)) => (role, Some(tail.trim_end_matches(r#""]"#))),
            None => (rest, None),
        };
        ResolvedLocator::XPath(role_xpath(role, name))
    } else if let Some(text) = selector.strip_prefix("text=") {
        ResolvedLocator::XPath(format!("//*[normalize-space(text())='{}']", text))
    } else {
        ResolvedLocator::Css(selector.to_string())
    }
}

/// XPath for an accessible role, matching both explicit `role` attributes
/// and the native elements that imply the role.
fn role_xpath(role: &str, name: Option<&str>) -> String {
    let role_clause = match role {
        "button" => "self::button or @role='button'".to_string(),
        "textbox" => "self::input or self::textarea or @role='textbox'".to_string(),
        "link" => "self::a or @role='link'".to_string(),
        _ => format!("@role='{}'", role),
    };

    match name {
        Some(name) => format!(
            "//*[({}) and (normalize-space(.)='{}' or @aria-label='{}' or @placeholder='{}')]",
            role_clause, name, name, name
        ),
        None => format!("//*[{}]", role_clause),
    }
}

/// The two actions the orchestrator performs
enum Action<'a> {
    Click,
    Fill(&'a str),
}

/// Element interaction orchestrator: one of these per search session,
/// borrowing the session browser and the shared stores.
pub struct Interactor<'a> {
    browser: &'a Browser,
    learner: &'a Mutex<SelectorLearner>,
    cache: &'a Mutex<ScriptCache>,
    generator: Option<&'a ScriptGenClient>,
}

impl<'a> Interactor<'a> {
    pub fn new(
        browser: &'a Browser,
        learner: &'a Mutex<SelectorLearner>,
        cache: &'a Mutex<ScriptCache>,
        generator: Option<&'a ScriptGenClient>,
    ) -> Self {
        Interactor {
            browser,
            learner,
            cache,
            generator,
        }
    }

    /// Click the element known as `element_type`, labelled `element_name`
    /// for humans and prompts. True when any tier succeeded.
    pub async fn smart_click(&self, element_type: &str, element_name: &str) -> bool {
        humanize(self.browser).await;

        if self.try_selectors(element_type, Action::Click).await {
            info!("Clicked the '{}' element", element_name);
            return true;
        }

        let task = generation::click_task(element_type, element_name);
        if self.try_scripted(element_type, &task, vec![]).await {
            return true;
        }

        warn!("All interaction tiers failed clicking '{}'", element_name);
        false
    }

    /// Fill the input known as `element_type` with `value`
    pub async fn smart_fill(&self, element_type: &str, value: &str) -> bool {
        if self.try_selectors(element_type, Action::Fill(value)).await {
            info!("Filled the '{}' field", element_type);
            return true;
        }

        let task = generation::fill_task(element_type);
        if self.try_scripted(element_type, &task, vec![json!(value)]).await {
            return true;
        }

        warn!("All interaction tiers failed filling '{}'", element_type);
        false
    }

    /// Tier 1: prioritized selectors, each attempt recorded
    async fn try_selectors(&self, element_type: &str, action: Action<'_>) -> bool {
        let defaults = default_selectors(element_type);
        let prioritized = {
            let learner = self.learner.lock().await;
            learner.prioritize(element_type, &defaults)
        };

        for selector in prioritized {
            let succeeded = self.attempt(&selector, &action).await;
            {
                let mut learner = self.learner.lock().await;
                learner.record_outcome(element_type, &selector, succeeded);
            }
            if succeeded {
                return true;
            }
            debug!("Selector '{}' failed for '{}'", selector, element_type);
        }

        false
    }

    /// One selector attempt: resolve, wait for visibility, act
    async fn attempt(&self, selector: &str, action: &Action<'_>) -> bool {
        let resolved = resolve_selector(selector);

        match action {
            Action::Click => {
                let element = match self
                    .browser
                    .find_visible(resolved.as_locator(), SELECTOR_TIMEOUT)
                    .await
                {
                    Ok(element) => element,
                    Err(_) => return false,
                };

                pause(500, 1000).await;
                if element.click().await.is_err() {
                    return false;
                }
                pause(500, 1000).await;
                true
            }
            Action::Fill(value) => {
                let element = match self
                    .browser
                    .find_visible(resolved.as_locator(), FILL_TIMEOUT)
                    .await
                {
                    Ok(element) => element,
                    Err(_) => return false,
                };

                if element.clear().await.is_err() {
                    return false;
                }
                if element.send_keys(value).await.is_err() {
                    return false;
                }
                pause(400, 600).await;
                true
            }
        }
    }

    /// Tiers 2 and 3: cached script, then a freshly generated one which is
    /// cached under the same fingerprint when it works.
    async fn try_scripted(&self, element_type: &str, task: &str, args: Vec<Value>) -> bool {
        let markup = self.browser.page_source_or_empty().await;
        let print = fingerprint(&markup);

        let cached = {
            let mut cache = self.cache.lock().await;
            cache.lookup(element_type, &print)
        };
        if let Some(script) = cached {
            info!("Executing cached script for '{}'", element_type);
            if sandbox::run(self.browser, &script, args.clone()).await {
                return true;
            }
            debug!("Cached script for '{}' no longer works", element_type);
        }

        let Some(generator) = self.generator else {
            debug!("No generation client configured, skipping tier 3");
            return false;
        };

        let script = match generator.generate(task, Some(&markup)).await {
            Ok(script) => script,
            Err(e) => {
                warn!("Script generation failed for '{}': {}", element_type, e);
                return false;
            }
        };

        if sandbox::run(self.browser, &script, args).await {
            let mut cache = self.cache.lock().await;
            cache.store(element_type, &print, script);
            return true;
        }

        warn!("Generated script failed for '{}'", element_type);
        false
    }
}

/// Best-effort dismissal of a cookie-consent dialog. Selector tier only
/// with short waits; absence of the dialog is the common case.
pub async fn dismiss_cookie_consent(browser: &Browser) -> bool {
    for selector in default_selectors("cookie_consent") {
        let resolved = resolve_selector(selector);
        if let Ok(element) = browser
            .find_visible(resolved.as_locator(), Duration::from_secs(1))
            .await
            && element.click().await.is_ok()
        {
            info!("Dismissed cookie consent dialog");
            pause(500, 1000).await;
            return true;
        }
    }
    false
}

/// Randomized delay within [min_ms, max_ms)
pub async fn pause(min_ms: u64, max_ms: u64) {
    let delay = rand::thread_rng().gen_range(min_ms..max_ms);
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

/// Small mouse movement and scroll so the session looks less synthetic.
/// Purely behavioral; failures are irrelevant.
async fn humanize(browser: &Browser) {
    let (x, y, wheel) = {
        let mut rng = rand::thread_rng();
        (
            rng.gen_range(100..800),
            rng.gen_range(100..600),
            rng.gen_range(-100..100),
        )
    };

    let script = format!(
        "document.dispatchEvent(new MouseEvent('mousemove', {{clientX: {}, clientY: {}}})); \
         window.scrollBy(0, {});",
        x, y, wheel
    );
    let _ = browser.execute(&script, vec![]).await;

    pause(500, 1500).await;
}

#[cfg(test)]
#[path = "interact_test.rs"]
mod interact_test;
