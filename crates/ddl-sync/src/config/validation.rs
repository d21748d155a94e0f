//! Configuration validation.

use super::{Config, PathTemplates};
use crate::error::{Result, SyncError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Connection validation
    if config.connection.host.is_empty() {
        return Err(SyncError::Config("connection.host is required".into()));
    }
    if config.connection.port == 0 {
        return Err(SyncError::Config("connection.port must not be 0".into()));
    }
    if config.connection.service.is_empty() {
        return Err(SyncError::Config("connection.service is required".into()));
    }
    if config.connection.login.is_empty() {
        return Err(SyncError::Config("connection.login is required".into()));
    }
    if config.connection.odbc_driver.is_empty() {
        return Err(SyncError::Config(
            "connection.odbc_driver is required".into(),
        ));
    }

    // Template validation
    let templates = PathTemplates::from_config(&config.objects);
    for key in crate::core::TemplateKey::all() {
        if let Some(template) = templates.get(key) {
            if template.trim().is_empty() {
                return Err(SyncError::Config(format!(
                    "objects.{}.dir must not be empty",
                    key.as_str().to_lowercase()
                )));
            }
        }
    }
    templates.check_unique()?;

    if templates.is_empty() {
        return Err(SyncError::Config(
            "no output path configured for any object kind".into(),
        ));
    }

    Ok(())
}
