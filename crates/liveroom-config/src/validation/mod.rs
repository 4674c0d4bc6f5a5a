//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod sections;

#[cfg(test)]
mod tests;

use crate::schema::LiveroomConfig;
use liveroom_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &LiveroomConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    sections::validate_channel(&mut errors, config);
    sections::validate_whiteboard(&mut errors, config);
    sections::validate_documents(&mut errors, config);
    sections::validate_negotiation(&mut errors, config);
    sections::validate_chat(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
