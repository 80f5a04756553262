use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("rename template is empty")]
    EmptyRenameTemplate,

    #[error("replacement rule with an empty pattern (replacing '' with '{replacement}')")]
    EmptyReplacementPattern { replacement: String },

    #[error("output format '{name}' has an empty template")]
    EmptyOutputFormat { name: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_rename(config)?;
    validate_replacements(config)?;
    validate_output_formats(config)?;
    Ok(())
}

fn validate_rename(config: &Config) -> Result<(), ValidationError> {
    if config.rename.trim_matches('/').trim().is_empty() {
        return Err(ValidationError::EmptyRenameTemplate);
    }
    Ok(())
}

/// An empty pattern would match between every character of every URL.
fn validate_replacements(config: &Config) -> Result<(), ValidationError> {
    if let Some(replacement) = config.replacements.get("") {
        return Err(ValidationError::EmptyReplacementPattern {
            replacement: replacement.clone(),
        });
    }
    Ok(())
}

fn validate_output_formats(config: &Config) -> Result<(), ValidationError> {
    for (name, template) in &config.output_formats {
        if template.trim().is_empty() {
            return Err(ValidationError::EmptyOutputFormat { name: name.clone() });
        }
    }
    Ok(())
}
