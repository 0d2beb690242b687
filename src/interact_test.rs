// Unit tests for selector resolution and the default tables

use super::*;

#[test]
fn test_resolve_css_passthrough() {
    let resolved = resolve_selector(r#"input[type="url"]"#);
    assert_eq!(resolved, ResolvedLocator::Css(r#"input[type="url"]"#.to_string()));
}

#[test]
fn test_resolve_role_with_name() {
    let resolved = resolve_selector(r#"role=button[name="Search"]"#);
    let ResolvedLocator::XPath(xpath) = resolved else {
        panic!("role selectors resolve to XPath");
    };
    assert!(xpath.contains("self::button"));
    assert!(xpath.contains("@role='button'"));
    assert!(xpath.contains("normalize-space(.)='Search'"));
    assert!(xpath.contains("@aria-label='Search'"));
}

#[test]
fn test_resolve_role_without_name() {
    let resolved = resolve_selector("role=tab");
    let ResolvedLocator::XPath(xpath) = resolved else {
        panic!("role selectors resolve to XPath");
    };
    assert_eq!(xpath, "//*[@role='tab']");
}

#[test]
fn test_resolve_textbox_matches_native_inputs() {
    let resolved = resolve_selector(r#"role=textbox[name="Paste image link"]"#);
    let ResolvedLocator::XPath(xpath) = resolved else {
        panic!("role selectors resolve to XPath");
    };
    assert!(xpath.contains("self::input"));
    assert!(xpath.contains("self::textarea"));
    assert!(xpath.contains("@placeholder='Paste image link'"));
}

#[test]
fn test_resolve_text() {
    let resolved = resolve_selector("text=Visual matches");
    assert_eq!(
        resolved,
        ResolvedLocator::XPath("//*[normalize-space(text())='Visual matches']".to_string())
    );
}

#[test]
fn test_default_tables_cover_known_types() {
    for element_type in [
        "url_input",
        "search_button",
        "visual_matches_tab",
        "exact_matches_tab",
        "cookie_consent",
    ] {
        assert!(
            !default_selectors(element_type).is_empty(),
            "no defaults for {}",
            element_type
        );
    }
}

#[test]
fn test_unknown_type_has_no_defaults() {
    assert!(default_selectors("made_up").is_empty());
}

#[test]
fn test_every_default_resolves() {
    // Every shipped selector must survive the resolution language
    for selectors in DEFAULT_SELECTORS.values() {
        for selector in selectors {
            match resolve_selector(selector) {
                ResolvedLocator::Css(css) => assert!(!css.is_empty()),
                ResolvedLocator::XPath(xpath) => assert!(xpath.starts_with("//*[")),
            }
        }
    }
}
