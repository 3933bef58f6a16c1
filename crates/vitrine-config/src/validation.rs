//! Sanity checks run after a config parses. Violations are reported as one
//! error; the caller decides whether to warn and continue.

use vitrine_common::ConfigError;

use crate::schema::ShellConfig;

pub fn validate(config: &ShellConfig) -> Result<(), ConfigError> {
    if config.popup.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "popup.timeout_secs must be greater than zero".into(),
        ));
    }

    for pattern in config
        .popup
        .success_patterns
        .iter()
        .chain(&config.popup.failure_patterns)
    {
        if let Err(e) = regex::Regex::new(pattern) {
            return Err(ConfigError::ValidationError(format!(
                "invalid popup pattern {pattern:?}: {e}"
            )));
        }
    }

    Ok(())
}
