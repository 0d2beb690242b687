// Unit tests for the script cache

use super::*;
use tempfile::TempDir;

fn fresh_cache() -> (ScriptCache, TempDir) {
    let dir = TempDir::new().unwrap();
    let cache = ScriptCache::load(dir.path());
    (cache, dir)
}

#[test]
fn test_store_then_lookup_bumps_usage() {
    let (mut cache, _dir) = fresh_cache();

    cache.store("search_button", "abc123", "() => true");

    let entry = cache.snapshot().get("search_button::abc123").unwrap();
    assert_eq!(entry.usage_count, 0);

    let script = cache.lookup("search_button", "abc123").unwrap();
    assert_eq!(script, "() => true");

    let entry = cache.snapshot().get("search_button::abc123").unwrap();
    assert_eq!(entry.usage_count, 1);
}

#[test]
fn test_lookup_miss_is_none() {
    let (mut cache, _dir) = fresh_cache();
    assert!(cache.lookup("search_button", "nothing").is_none());
}

#[test]
fn test_overwrite_resets_usage_count() {
    let (mut cache, _dir) = fresh_cache();

    cache.store("url_input", "f1", "() => false");
    cache.lookup("url_input", "f1");
    cache.lookup("url_input", "f1");

    cache.store("url_input", "f1", "() => true");
    let entry = cache.snapshot().get("url_input::f1").unwrap();
    assert_eq!(entry.usage_count, 0);
    assert_eq!(entry.script, "() => true");
}

#[test]
fn test_keys_do_not_collide_across_element_types() {
    let (mut cache, _dir) = fresh_cache();

    cache.store("url_input", "same", "fill");
    cache.store("search_button", "same", "click");

    assert_eq!(cache.lookup("url_input", "same").unwrap(), "fill");
    assert_eq!(cache.lookup("search_button", "same").unwrap(), "click");
}

#[test]
fn test_flush_and_reload_round_trip() {
    let dir = TempDir::new().unwrap();

    let mut cache = ScriptCache::load(dir.path());
    cache.store("search_button", "abc123", "() => true");
    cache.lookup("search_button", "abc123");
    cache.flush();

    let mut reloaded = ScriptCache::load(dir.path());
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.lookup("search_button", "abc123").unwrap(), "() => true");
    // Usage history survives the round trip: 1 persisted + 1 just now
    assert_eq!(
        reloaded.snapshot().get("search_button::abc123").unwrap().usage_count,
        2
    );
}

#[test]
fn test_corrupt_store_starts_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("script_cache.json"), "[[[").unwrap();

    let cache = ScriptCache::load(dir.path());
    assert!(cache.is_empty());
}

#[test]
fn test_clear_empties_and_persists() {
    let dir = TempDir::new().unwrap();

    let mut cache = ScriptCache::load(dir.path());
    cache.store("url_input", "f1", "x");
    cache.store("url_input", "f2", "y");
    cache.clear();
    assert!(cache.is_empty());

    let reloaded = ScriptCache::load(dir.path());
    assert!(reloaded.is_empty());
}

#[test]
fn test_fingerprint_is_stable_and_short() {
    let a = fingerprint("<html><body>hello</body></html>");
    let b = fingerprint("<html><body>hello</body></html>");
    let c = fingerprint("<html><body>other</body></html>");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 16);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}
