//! Manager configuration via `dbms.toml`
//!
//! On first start a default `dbms.toml` is created. To change settings,
//! edit the file and restart.

use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_core::{validate_database_name, StrataError, StrataResult, SYSTEM_DATABASE_NAME};
use strata_security::{AccessPolicy, DEFAULT_ADMIN_USER};

/// Config file name placed in the server data directory.
pub const CONFIG_FILE_NAME: &str = "dbms.toml";

/// Name of the default database when none is configured.
pub const DEFAULT_DATABASE_NAME: &str = "default";

/// Manager configuration loaded from `dbms.toml`.
///
/// # Example
///
/// ```toml
/// # Database created automatically at startup and open to every user
/// default_database = "default"
///
/// # Built-in administrative user; bypasses all access checks
/// admin_user = "admin"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbmsConfig {
    /// Name of the default database.
    #[serde(default = "default_database_str")]
    pub default_database: String,
    /// Name of the built-in administrative user.
    #[serde(default = "default_admin_user_str")]
    pub admin_user: String,
}

fn default_database_str() -> String {
    DEFAULT_DATABASE_NAME.to_string()
}

fn default_admin_user_str() -> String {
    DEFAULT_ADMIN_USER.to_string()
}

impl Default for DbmsConfig {
    fn default() -> Self {
        Self {
            default_database: default_database_str(),
            admin_user: default_admin_user_str(),
        }
    }
}

impl DbmsConfig {
    /// Check the configured names.
    ///
    /// # Errors
    ///
    /// Returns an error if the default database name is invalid or names the
    /// system database, or if the admin user is empty.
    pub fn validate(&self) -> StrataResult<()> {
        validate_database_name(&self.default_database)?;
        if self.default_database == SYSTEM_DATABASE_NAME {
            return Err(StrataError::config(format!(
                "default_database cannot be '{}'",
                SYSTEM_DATABASE_NAME
            )));
        }
        if self.admin_user.is_empty() {
            return Err(StrataError::config("admin_user cannot be empty"));
        }
        Ok(())
    }

    /// Access policy derived from this config.
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.default_database.clone()).with_admin_user(self.admin_user.clone())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Strata database manager configuration
#
# Database created automatically at startup. Every authenticated user may
# access it without an explicit grant.
default_database = "default"

# Built-in administrative user. Bypasses all per-database access checks.
admin_user = "admin"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StrataError::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: DbmsConfig = toml::from_str(&content).map_err(|e| {
            StrataError::config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> StrataResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StrataError::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StrataResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StrataError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StrataError::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = DbmsConfig::default();
        assert_eq!(config.default_database, "default");
        assert_eq!(config.admin_user, "admin");
        config.validate().unwrap();
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config: DbmsConfig = toml::from_str(DbmsConfig::default_toml()).unwrap();
        assert_eq!(config, DbmsConfig::default());
    }

    #[test]
    fn system_as_default_is_rejected() {
        let config = DbmsConfig {
            default_database: SYSTEM_DATABASE_NAME.to_string(),
            ..DbmsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_default_name_is_rejected() {
        let config = DbmsConfig {
            default_database: "has space".to_string(),
            ..DbmsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_admin_is_rejected() {
        let config = DbmsConfig {
            admin_user: String::new(),
            ..DbmsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        DbmsConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = DbmsConfig::from_file(&path).unwrap();
        assert_eq!(config.default_database, "default");
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "default_database = \"neo\"\n").unwrap();
        DbmsConfig::write_default_if_missing(&path).unwrap();

        let config = DbmsConfig::from_file(&path).unwrap();
        assert_eq!(config.default_database, "neo");
        assert_eq!(config.admin_user, "admin");
    }

    #[test]
    fn from_file_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "default_database = \"system\"\n").unwrap();
        assert!(DbmsConfig::from_file(&path).is_err());
    }

    #[test]
    fn from_file_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = DbmsConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StrataError::Config(_)));
    }

    #[test]
    fn write_to_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = DbmsConfig {
            default_database: "shared".to_string(),
            admin_user: "root".to_string(),
        };
        config.write_to_file(&path).unwrap();

        let loaded = DbmsConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);

        let policy = loaded.access_policy();
        assert_eq!(policy.default_database, "shared");
        assert_eq!(policy.admin_user, "root");
    }
}
