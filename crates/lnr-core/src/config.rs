use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

/// Locates the persistent configuration and cache directories.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    config_root: PathBuf,
    cache_root: PathBuf,
}

impl ConfigLocator {
    /// Discover the platform directories, creating them if needed.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("app", "linear", "lnr").ok_or(ConfigError::MissingProjectDirs)?;
        let config_root = dirs.config_dir().to_path_buf();
        let cache_root = dirs.cache_dir().to_path_buf();
        fs::create_dir_all(&config_root).map_err(ConfigError::CreateDir)?;
        fs::create_dir_all(&cache_root).map_err(ConfigError::CreateDir)?;
        set_user_only_permissions(&config_root)?;
        Ok(Self {
            config_root,
            cache_root,
        })
    }

    /// Path to the credentials file for the given profile.
    pub fn credentials_file(&self, profile: &str) -> PathBuf {
        self.config_root.join(format!("credentials-{profile}.json"))
    }

    /// Directory holding TTL-bounded cache entries.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_root
    }

    #[cfg(test)]
    pub(crate) fn from_roots_for_tests(config_root: PathBuf, cache_root: PathBuf) -> Self {
        Self {
            config_root,
            cache_root,
        }
    }
}

fn set_user_only_permissions(path: &Path) -> Result<(), ConfigError> {
    #[cfg(unix)]
    {
        let metadata = fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        permissions.set_mode(0o700);
        fs::set_permissions(path, permissions)?;
        Ok(())
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}

/// Errors that can occur when working with configuration directories.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to determine configuration directory for lnr")]
    MissingProjectDirs,
    #[error("failed to create configuration directory: {0}")]
    CreateDir(#[source] std::io::Error),
    #[error("filesystem error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn credentials_file_appends_profile() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator::from_roots_for_tests(
            temp_dir.path().join("config"),
            temp_dir.path().join("cache"),
        );
        let path = locator.credentials_file("default");
        assert!(path.ends_with("credentials-default.json"));
    }

    #[test]
    fn cache_dir_is_distinct_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let locator = ConfigLocator::from_roots_for_tests(
            temp_dir.path().join("config"),
            temp_dir.path().join("cache"),
        );
        assert_ne!(locator.cache_dir(), locator.credentials_file("x").parent().unwrap());
    }
}
