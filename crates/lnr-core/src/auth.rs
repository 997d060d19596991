use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ConfigLocator};

/// Environment variable consulted before the credentials file.
pub const API_KEY_ENV: &str = "LINEAR_API_KEY";

/// A stored personal API key for one profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
}

/// Filesystem-backed credential storage in the user configuration directory.
pub struct CredentialStore {
    locator: ConfigLocator,
}

impl CredentialStore {
    pub fn new(locator: ConfigLocator) -> Self {
        Self { locator }
    }

    pub fn with_default_locator() -> Result<Self, AuthError> {
        Ok(Self::new(ConfigLocator::new()?))
    }

    pub fn load(&self, profile: &str) -> Result<Option<ApiCredentials>, AuthError> {
        let path = self.locator.credentials_file(profile);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        let envelope: CredentialsEnvelope = serde_json::from_str(&raw)?;
        Ok(Some(envelope.credentials))
    }

    pub fn save(&self, profile: &str, credentials: &ApiCredentials) -> Result<(), AuthError> {
        let path = self.locator.credentials_file(profile);
        let envelope = CredentialsEnvelope {
            version: 1,
            profile: profile.to_owned(),
            credentials: credentials.clone(),
        };
        let payload = serde_json::to_string_pretty(&envelope)?;
        write_private_file(&path, &payload)
    }

    pub fn delete(&self, profile: &str) -> Result<(), AuthError> {
        let path = self.locator.credentials_file(profile);
        match fs::remove_file(path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Resolve the API key for a profile: environment first, stored file second.
pub fn resolve_api_key(
    store: &CredentialStore,
    profile: &str,
) -> Result<Option<ApiCredentials>, AuthError> {
    if let Ok(key) = env::var(API_KEY_ENV) {
        let key = key.trim().to_owned();
        if !key.is_empty() {
            return Ok(Some(ApiCredentials { api_key: key }));
        }
    }
    store.load(profile)
}

fn write_private_file(path: &Path, payload: &str) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(payload.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perm = file.metadata()?.permissions();
        perm.set_mode(0o600);
        fs::set_permissions(path, perm)?;
    }

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct CredentialsEnvelope {
    version: u32,
    profile: String,
    credentials: ApiCredentials,
}

/// Errors surfaced by credential management routines.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> CredentialStore {
        let locator = ConfigLocator::from_roots_for_tests(
            temp_dir.path().join("config"),
            temp_dir.path().join("cache"),
        );
        CredentialStore::new(locator)
    }

    #[test]
    fn round_trip_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let credentials = ApiCredentials {
            api_key: "lin_api_123".into(),
        };
        store.save("default", &credentials).unwrap();
        let loaded = store.load("default").unwrap().unwrap();
        assert_eq!(loaded.api_key, credentials.api_key);
    }

    #[test]
    fn load_missing_profile_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        assert!(store.load("absent").unwrap().is_none());
    }

    #[test]
    fn delete_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        store.delete("missing").unwrap();
    }
}
