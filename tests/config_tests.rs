// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use photobooth::Config;
use photobooth::config;
use photobooth::generation::{GenerationContext, PromptTemplate};

#[test]
fn test_config_default() {
    let config = Config::default();

    assert!(
        config.mirror_preview,
        "Mirror preview should be enabled by default"
    );
    assert_eq!(config.countdown_seconds, 3);
    assert_eq!(config.notification_seconds, 3);
    assert_eq!(config.request_timeout_secs, None, "No timeout by default");
}

#[test]
fn test_config_server_url() {
    let config = Config::default();
    assert!(
        config.server_url.starts_with("http"),
        "Server URL should be an HTTP base URL"
    );
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "display_name = \"Lucía\"\ncountdown_seconds = 5\n").unwrap();

    let loaded = config::load_from_path(&path).unwrap();
    assert_eq!(loaded.display_name.as_deref(), Some("Lucía"));
    assert_eq!(loaded.countdown_seconds, 5);
    assert_eq!(loaded.filename_prefix, Config::default().filename_prefix);
}

#[test]
fn test_config_drives_prompt() {
    let config = Config {
        track: Some("Culinary Arts".to_string()),
        prompt_template: "{name} from {track}".to_string(),
        display_name: Some("Ana".to_string()),
        ..Config::default()
    };
    let prompt =
        PromptTemplate::from_config(&config).render(&GenerationContext::from_config(&config));
    assert_eq!(prompt, "Ana from Culinary Arts");
}
