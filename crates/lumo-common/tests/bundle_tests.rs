//! Tests for bundle URL detection and the name/extension lookup convention.

use lumo_common::bundle::{BundleResources, is_bundle_url};

#[test]
fn bundle_urls_are_dot_slash_and_slash_prefixed() {
    assert!(is_bundle_url("./data.json"));
    assert!(is_bundle_url("/images/logo.png"));
    assert!(!is_bundle_url("https://example.com/data.json"));
    assert!(!is_bundle_url("data:image/png;base64,AAAA"));
    assert!(!is_bundle_url("startApp.js"));
}

#[test]
fn resolve_keeps_base_name_and_extension() {
    let bundle = BundleResources::new("/bundle");
    assert_eq!(
        bundle.resolve("./data.json").unwrap(),
        std::path::Path::new("/bundle/data.json")
    );
    // Directories flatten away: only the trailing name.ext pair counts.
    assert_eq!(
        bundle.resolve("/assets/icons/globe.png").unwrap(),
        std::path::Path::new("/bundle/globe.png")
    );
    // Extra dots keep the last two components.
    assert_eq!(
        bundle.resolve("./app.min.js").unwrap(),
        std::path::Path::new("/bundle/min.js")
    );
}

#[test]
fn resolve_rejects_extensionless_urls() {
    let bundle = BundleResources::new("/bundle");
    assert!(bundle.resolve("./data").is_none());
    assert!(bundle.resolve("/").is_none());
}

#[test]
fn read_round_trips_a_real_file() {
    let dir = std::env::temp_dir().join("lumo-bundle-test");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("payload.json"), b"{\"ok\":true}").unwrap();

    let bundle = BundleResources::new(&dir);
    let text = bundle.read_to_string("./payload.json").unwrap();
    assert_eq!(text, "{\"ok\":true}");

    let err = bundle.read("./missing.json").unwrap_err();
    assert!(err.to_string().contains("missing.json"));
}
