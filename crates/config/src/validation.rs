//! Configuration validation
//!
//! Checks what can be checked without a component registry:
//! - The pipeline has at least one stage
//! - Processor and handler names are non-empty
//! - Channel references are non-empty
//! - Capacities are non-zero
//! - No stage names the same output channel twice
//!
//! Channel reference syntax and stage resolution are checked by the
//! pipeline builder, before any stage starts.

use std::collections::HashSet;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::stage::StageConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.global.channel_capacity == 0 {
        return Err(ConfigError::invalid_value(
            "global",
            "global",
            "channel_capacity",
            "must be greater than 0",
        ));
    }

    if config.pipeline.is_empty() {
        return Err(ConfigError::EmptyPipeline);
    }

    for (index, stage) in config.pipeline.iter().enumerate() {
        validate_stage(index, stage)?;
    }

    Ok(())
}

/// Validate a single stage
fn validate_stage(index: usize, stage: &StageConfig) -> Result<()> {
    let name = if stage.processor.trim().is_empty() {
        format!("#{index}")
    } else {
        stage.label()
    };

    if stage.processor.trim().is_empty() {
        return Err(ConfigError::missing_field("stage", name, "processor"));
    }

    if let Some(ref handler) = stage.handler
        && handler.trim().is_empty()
    {
        return Err(ConfigError::invalid_value(
            "stage",
            name,
            "handler",
            "must not be empty",
        ));
    }

    if let Some(ref input) = stage.input
        && input.trim().is_empty()
    {
        return Err(ConfigError::invalid_value(
            "stage",
            name,
            "in",
            "channel reference must not be empty",
        ));
    }

    if stage.out.iter().any(|spec| spec.trim().is_empty()) {
        return Err(ConfigError::invalid_value(
            "stage",
            name,
            "out",
            "channel reference must not be empty",
        ));
    }

    let mut seen = HashSet::new();
    for spec in &stage.out {
        let channel = spec.split_whitespace().next().unwrap_or_default();
        if !seen.insert(channel) {
            return Err(ConfigError::duplicate_output(name, channel));
        }
    }

    if stage.capacity == Some(0) {
        return Err(ConfigError::invalid_value(
            "stage",
            name,
            "capacity",
            "must be greater than 0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = Config::from_str("").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPipeline));
    }

    #[test]
    fn test_blank_processor_rejected() {
        let err = Config::from_str("[[pipeline]]\nprocessor = \" \"").unwrap_err();
        assert!(err.to_string().contains("#0"));
        assert!(err.to_string().contains("processor"));
    }

    #[test]
    fn test_blank_handler_rejected() {
        let toml = "[[pipeline]]\nprocessor = \"EventReader\"\nhandler = \"\"";
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("handler"));
    }

    #[test]
    fn test_blank_channel_rejected() {
        let toml = "[[pipeline]]\nprocessor = \"Exporter\"\nin = \"\"";
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("in"));

        let toml = "[[pipeline]]\nprocessor = \"EventReader\"\nout = [\"flat RecordChan\", \"\"]";
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("out"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let toml = "[[pipeline]]\nprocessor = \"Exporter\"\ncapacity = 0";
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("capacity"));

        let toml = "[global]\nchannel_capacity = 0\n[[pipeline]]\nprocessor = \"Exporter\"";
        let err = Config::from_str(toml).unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let toml = "[[pipeline]]\nprocessor = \"EventReader\"\nout = [\"flat RecordChan\", \"flat  RecordChan\"]";
        let err = Config::from_str(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateOutput { ref channel, .. } if channel == "flat"
        ));

        let toml = "[[pipeline]]\nprocessor = \"EventReader\"\nout = [\"flat RecordChan\", \"audit RecordChan\"]";
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_malformed_channel_spec_is_not_a_config_error() {
        // Syntax of channel references is the builder's concern
        let toml = "[[pipeline]]\nprocessor = \"Exporter\"\nin = \"flat RecordChan extra\"";
        assert!(Config::from_str(toml).is_ok());
    }
}
