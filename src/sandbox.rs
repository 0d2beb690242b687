//! Bounded execution of generated in-page scripts.
//!
//! Generated code only ever runs as JavaScript inside the page, never in
//! this process. The convention: a script is a single function expression
//! taking the extra arguments the task needs. Anything that goes wrong
//! here (parse failure, thrown exception, timeout, a script that is not
//! callable) collapses to a soft failure so untrusted generated code can
//! never destabilize the orchestrator.

use anyhow::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::browser::Browser;

/// Upper bound on one generated-script execution
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where generated scripts actually execute. The live implementation is
/// the browser session; tests substitute hosts that throw or hang.
#[allow(async_fn_in_trait)]
pub trait ScriptHost {
    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;
}

impl ScriptHost for Browser {
    async fn run_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.execute(script, args).await
    }
}

/// Cheap static check before paying for a driver round-trip. Catches
/// replies that are prose or markup rather than a function.
pub fn looks_like_function(script: &str) -> bool {
    let trimmed = script.trim_start();
    trimmed.starts_with('(')
        || trimmed.starts_with("function")
        || trimmed.starts_with("async")
        || trimmed.contains("=>")
}

/// Wrap a function expression so the driver invokes it with the call's
/// arguments and returns its result.
pub fn wrap_call(script: &str) -> String {
    format!("return ({})(...arguments);", script.trim())
}

/// Run a generated interaction script. True only when the script executed
/// and returned a truthy value; every failure mode is `false`.
pub async fn run<H: ScriptHost>(host: &H, script: &str, args: Vec<Value>) -> bool {
    match run_for_value(host, script, args).await {
        Some(Value::Bool(flag)) => flag,
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// Run a generated extraction script and hand back its raw result, or
/// None on any failure.
pub async fn run_for_value<H: ScriptHost>(
    host: &H,
    script: &str,
    args: Vec<Value>,
) -> Option<Value> {
    run_bounded(host, script, args, SCRIPT_TIMEOUT).await
}

/// Same as [`run_for_value`] with an explicit bound
pub async fn run_bounded<H: ScriptHost>(
    host: &H,
    script: &str,
    args: Vec<Value>,
    timeout: Duration,
) -> Option<Value> {
    if !looks_like_function(script) {
        debug!("Rejecting generated script with no callable entry point");
        return None;
    }

    let wrapped = wrap_call(script);
    match tokio::time::timeout(timeout, host.run_script(&wrapped, args)).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            debug!("Generated script failed in page: {}", e);
            None
        }
        Err(_) => {
            debug!("Generated script exceeded {:?}", timeout);
            None
        }
    }
}

#[cfg(test)]
#[path = "sandbox_test.rs"]
mod sandbox_test;
