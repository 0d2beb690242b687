use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use lensprobe::config::Config;
use lensprobe::learner::SelectorLearner;

/// One selector's statistics as shown to the user, with the derived rate
/// materialized for readability
#[derive(Serialize)]
struct StatRow {
    selector: String,
    success_count: u64,
    failure_count: u64,
    success_rate: f64,
    last_used: Option<DateTime<Utc>>,
}

pub fn handle_stats(element_type: Option<String>) -> Result<()> {
    let config = Config::from_env()?;
    let learner = SelectorLearner::load(&config.data_dir);

    let mut report = serde_json::Map::new();
    for (kind, by_selector) in learner.snapshot() {
        if let Some(filter) = &element_type
            && kind != filter
        {
            continue;
        }

        let mut rows: Vec<StatRow> = by_selector
            .iter()
            .map(|(selector, record)| StatRow {
                selector: selector.clone(),
                success_count: record.success_count,
                failure_count: record.failure_count,
                success_rate: record.success_rate(),
                last_used: record.last_used,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.success_rate
                .partial_cmp(&a.success_rate)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        report.insert(kind.clone(), json!(rows));
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
