use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Status taxonomy for a completed search.
///
/// Numeric values follow HTTP conventions where one exists; the remainder
/// use the extension range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Results were found and extracted
    Success,
    /// The search completed but yielded nothing usable
    NoMatches,
    /// The search engine served a rate-limit interstitial
    RateLimited,
    /// The client IP is blocked outright
    Blocked,
    /// The search exceeded its aggregate deadline
    Timeout,
    /// The image reference failed validation
    InvalidInput,
    /// A fault inside the orchestrator itself
    InternalError,
    /// A transport-level failure reaching the search engine
    NetworkError,
    /// An upstream proxy refused or mangled the connection
    ProxyError,
    /// The script generation service failed
    GenerationError,
    /// Anything that escaped classification
    Unknown,
}

impl StatusCode {
    /// Numeric wire value
    pub fn code(&self) -> u16 {
        match self {
            StatusCode::Success => 200,
            StatusCode::NoMatches => 404,
            StatusCode::RateLimited => 429,
            StatusCode::Blocked => 403,
            StatusCode::Timeout => 408,
            StatusCode::InvalidInput => 400,
            StatusCode::InternalError => 500,
            StatusCode::NetworkError => 502,
            StatusCode::ProxyError => 503,
            StatusCode::GenerationError => 507,
            StatusCode::Unknown => 520,
        }
    }

    /// Short human-readable tag mirrored into `SearchOutcome::status`
    pub fn tag(&self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::NoMatches => "no_matches",
            StatusCode::RateLimited => "rate_limited",
            StatusCode::Blocked => "blocked",
            StatusCode::Timeout => "timeout",
            StatusCode::InvalidInput => "invalid_input",
            StatusCode::InternalError => "error",
            StatusCode::NetworkError => "network_error",
            StatusCode::ProxyError => "proxy_error",
            StatusCode::GenerationError => "generation_error",
            StatusCode::Unknown => "unknown_error",
        }
    }

    /// Whether an outcome with this status should fire the alert webhook
    pub fn should_alert(&self) -> bool {
        matches!(
            self,
            StatusCode::RateLimited
                | StatusCode::Blocked
                | StatusCode::Timeout
                | StatusCode::InvalidInput
                | StatusCode::NetworkError
                | StatusCode::GenerationError
                | StatusCode::Unknown
        )
    }

    /// Process exit code for CLI consumption: 0 for terminal classifications
    /// that are not faults, 1 for everything else
    pub fn exit_code(&self) -> i32 {
        match self {
            StatusCode::Success | StatusCode::NoMatches => 0,
            _ => 1,
        }
    }
}

impl Serialize for StatusCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.code())
    }
}

/// Output format for CLI results
#[derive(Clone, Copy, Debug, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON format for programmatic consumption
    Json,
    /// Human-readable simple format
    Simple,
}

/// Which result categories a search should harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchCategory {
    /// Extract from the landing results page without switching tabs
    All,
    /// Only the "Visual matches" tab
    VisualMatches,
    /// Only the "Exact matches" tab
    ExactMatches,
    /// Both the visual and exact tabs
    Both,
}

impl SearchCategory {
    /// Tabs to process for this category as (element_type, tab label) pairs.
    /// The pseudo element type `current_page` means no tab switch.
    pub fn tabs(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            SearchCategory::All => vec![("current_page", "All")],
            SearchCategory::VisualMatches => vec![("visual_matches_tab", "Visual matches")],
            SearchCategory::ExactMatches => vec![("exact_matches_tab", "Exact matches")],
            SearchCategory::Both => vec![
                ("visual_matches_tab", "Visual matches"),
                ("exact_matches_tab", "Exact matches"),
            ],
        }
    }
}

/// A single search request: the image to look up and the categories wanted
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchRequest {
    /// URL of the image to search by
    pub image_url: String,
    /// Result categories to harvest
    #[serde(default = "default_category")]
    pub category: SearchCategory,
}

fn default_category() -> SearchCategory {
    SearchCategory::All
}

/// One extracted result: either a bare link or a structured record,
/// depending on how much the extraction pass could see
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExtractedItem {
    /// A raw external URL
    Url(String),
    /// A structured match with page metadata
    Record(MatchRecord),
}

impl ExtractedItem {
    /// The URL regardless of shape
    pub fn url(&self) -> &str {
        match self {
            ExtractedItem::Url(url) => url,
            ExtractedItem::Record(record) => &record.url,
        }
    }
}

/// Structured match data when the structural pass can read it
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MatchRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Mapping from tab name to the items harvested from it
pub type ResultMap = BTreeMap<String, Vec<ExtractedItem>>;

/// The complete structured outcome of one search invocation.
///
/// Constructed exactly once per search; the caller always receives one of
/// these, never a raw fault.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub status_code: StatusCode,
    pub message: String,
    pub result: ResultMap,
    pub total_results: usize,
    pub status: String,
}

impl SearchOutcome {
    /// Build an outcome; total and status tag are derived, never supplied
    pub fn new(status_code: StatusCode, message: impl Into<String>, result: ResultMap) -> Self {
        let total_results = result.values().map(Vec::len).sum();
        SearchOutcome {
            status_code,
            message: message.into(),
            result,
            total_results,
            status: status_code.tag().to_string(),
        }
    }

    /// Outcome carrying no results at all
    pub fn empty(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status_code, message, ResultMap::new())
    }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
