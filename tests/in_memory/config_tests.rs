//! Controller timing configuration tests.

use std::time::Duration;

use courier_relay::config::{ConfigError, ControllerConfig};
use rstest::rstest;

#[rstest]
fn partial_files_keep_the_remaining_defaults() -> Result<(), eyre::Report> {
    let config = ControllerConfig::from_toml_str(
        r"
        text_field_debounce_ms = 250
        refresh_backoff_ms = 1000
        ",
    )?;

    eyre::ensure!(
        config.text_field_debounce() == Duration::from_millis(250),
        "text debounce not read"
    );
    eyre::ensure!(
        config.refresh_backoff() == Duration::from_secs(1),
        "backoff not read"
    );
    eyre::ensure!(
        config.time_field_debounce() == Duration::from_millis(300),
        "time debounce should default"
    );
    eyre::ensure!(
        config.refresh_interval() == Duration::from_secs(30),
        "refresh interval should default"
    );
    Ok(())
}

#[rstest]
fn rendered_config_parses_back() -> Result<(), eyre::Report> {
    let config = ControllerConfig {
        refresh_interval_ms: 15_000,
        ..ControllerConfig::default()
    };

    let parsed = ControllerConfig::from_toml_str(&config.to_toml_string()?)?;

    eyre::ensure!(parsed == config, "expected {config:?}, parsed {parsed:?}");
    Ok(())
}

#[rstest]
fn wrong_types_are_rejected() {
    let result = ControllerConfig::from_toml_str("refresh_interval_ms = \"soon\"");

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
