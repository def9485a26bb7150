// Credential store
// Holds the single bearer token used for the task service

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::services::settings::project_dirs;

pub trait CredentialStore {
    fn token(&self) -> Option<String>;
    fn set_token(&mut self, token: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;

    fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Token kept in memory only; gone when the session ends.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    token: Option<String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }

    fn set_token(&mut self, token: &str) -> Result<()> {
        self.token = Some(normalize_token(token)?);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.token = None;
        Ok(())
    }
}

/// Token persisted as a single-line file in the user's data directory.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        let dirs = project_dirs().context("Failed to resolve application data directory")?;
        Ok(Self::new(dirs.data_dir().join("api_token")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn token(&self) -> Option<String> {
        let content = fs::read_to_string(&self.path).ok()?;
        let trimmed = content.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn set_token(&mut self, token: &str) -> Result<()> {
        let token = normalize_token(token)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create credential directory {:?}", parent))?;
        }

        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write API token to {:?}", self.path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {:?}", self.path))?;
        }

        log::info!("Stored API token at {:?}", self.path);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove API token at {:?}", self.path))?;
            log::info!("Cleared stored API token");
        }
        Ok(())
    }
}

fn normalize_token(token: &str) -> Result<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        anyhow::bail!("API token cannot be empty");
    }
    Ok(trimmed.to_string())
}
