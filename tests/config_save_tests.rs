// SPDX-License-Identifier: MPL-2.0

//! Saving to the default settings location
//!
//! Kept in its own test binary: it points XDG_CONFIG_HOME at a temp dir.

use photobooth::Config;
use photobooth::config;

#[test]
fn test_save_writes_default_location_and_load_reads_it() {
    let dir = tempfile::tempdir().unwrap();
    // SAFETY: the only test in this binary, no other thread reads the environment
    unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };

    let config = Config {
        display_name: Some("Lucía".to_string()),
        track: Some("Gastronomy".to_string()),
        ..Config::default()
    };
    let path = config::save(&config).unwrap();

    assert!(path.starts_with(dir.path()));
    assert!(path.ends_with("settings.toml"));
    assert_eq!(config::load().unwrap(), config);
}
