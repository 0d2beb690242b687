use std::fmt;

use crate::generation::GenerationError;
use crate::types::StatusCode;

/// Residual fault classification at the orchestrator boundary.
///
/// Failures inside the interaction tiers never reach this type; only what
/// escapes the whole search flow is converted here, and from here into the
/// fixed status taxonomy.
#[derive(Debug)]
pub enum SearchFault {
    /// The script generation service failed (status 507)
    Generation(String),
    /// Transport-level failure (status 502)
    Network(String),
    /// Upstream proxy failure (status 503)
    Proxy(String),
    /// WebDriver session could not be acquired or died (status 500)
    WebDriver(String),
    /// The aggregate search deadline expired (status 408)
    Timeout(String),
    /// Anything else (status 520)
    Other(anyhow::Error),
}

impl SearchFault {
    /// Map this fault into the response status taxonomy
    pub fn status(&self) -> StatusCode {
        match self {
            SearchFault::Generation(_) => StatusCode::GenerationError,
            SearchFault::Network(_) => StatusCode::NetworkError,
            SearchFault::Proxy(_) => StatusCode::ProxyError,
            SearchFault::WebDriver(_) => StatusCode::InternalError,
            SearchFault::Timeout(_) => StatusCode::Timeout,
            SearchFault::Other(_) => StatusCode::Unknown,
        }
    }
}

impl fmt::Display for SearchFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchFault::Generation(msg) => write!(f, "Script generation failed: {}", msg),
            SearchFault::Network(msg) => write!(f, "Network error: {}", msg),
            SearchFault::Proxy(msg) => write!(f, "Proxy error: {}", msg),
            SearchFault::WebDriver(msg) => write!(f, "WebDriver failure: {}", msg),
            SearchFault::Timeout(msg) => write!(f, "Operation timed out: {}", msg),
            SearchFault::Other(err) => write!(f, "Unknown error: {}", err),
        }
    }
}

impl std::error::Error for SearchFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SearchFault::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for SearchFault {
    fn from(err: anyhow::Error) -> Self {
        // Typed causes first, then message inspection for everything that
        // arrives as plain text from the driver or the OS
        if err.downcast_ref::<GenerationError>().is_some() {
            return SearchFault::Generation(err.to_string());
        }

        let msg = err.to_string();
        let lower = msg.to_lowercase();

        if lower.contains("proxy") {
            SearchFault::Proxy(msg)
        } else if lower.contains("network")
            || lower.contains("connection refused")
            || lower.contains("connection reset")
            || lower.contains("dns")
        {
            SearchFault::Network(msg)
        } else if lower.contains("webdriver")
            || lower.contains("geckodriver")
            || lower.contains("chromedriver")
            || lower.contains("session not created")
        {
            SearchFault::WebDriver(msg)
        } else if lower.contains("timeout") || lower.contains("timed out") {
            SearchFault::Timeout(msg)
        } else {
            SearchFault::Other(err)
        }
    }
}

#[cfg(test)]
#[path = "errors_test.rs"]
mod errors_test;
