use anyhow::Result;
use serde_json::json;

use lensprobe::config::Config;
use lensprobe::script_cache::ScriptCache;

pub fn handle_list() -> Result<()> {
    let config = Config::from_env()?;
    let cache = ScriptCache::load(&config.data_dir);

    let mut entries: Vec<_> = cache.snapshot().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let report: Vec<_> = entries
        .iter()
        .map(|(key, entry)| {
            json!({
                "key": key,
                "created_at": entry.created_at,
                "usage_count": entry.usage_count,
                "script_bytes": entry.script.len(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn handle_clear() -> Result<()> {
    let config = Config::from_env()?;
    let mut cache = ScriptCache::load(&config.data_dir);

    let dropped = cache.len();
    cache.clear();

    println!("Cleared {} cached script(s)", dropped);
    Ok(())
}
