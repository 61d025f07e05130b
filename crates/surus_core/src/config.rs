//! Configuration types for Surus.
//!
//! This module provides the [`Config`] struct which stores where local drafts
//! live, where published documents go, and the remote repository settings.
//! Configuration is persisted as TOML (typically at
//! `~/.config/surus/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `data_dir`: Directory backing the local key-value area
//! - `storage_capacity`: Optional override of the area's character ceiling
//! - `content_dir`: Repository-relative directory of the published JSON
//! - `download_dir`: Where documents are written when no remote is configured
//! - `remote`: Repository target and credential
//!
//! # Example
//!
//! ```ignore
//! use surus_core::config::{Config, RemotePatch};
//!
//! let mut config = Config::load()?;
//! config.merge_remote(RemotePatch {
//!     owner: Some("surus".into()),
//!     repo: Some("website".into()),
//!     ..Default::default()
//! });
//! config.save()?;
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CmsError, Result};
use crate::storage::DEFAULT_CAPACITY;

/// Default repository-relative directory of the published JSON documents.
pub const DEFAULT_CONTENT_DIR: &str = "public/data";

/// Default API endpoint of the remote repository host.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Branch used when none is given.
pub const DEFAULT_BRANCH: &str = "main";

fn default_content_dir() -> String {
    DEFAULT_CONTENT_DIR.to_string()
}

/// Remote repository target and credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Access token with write permission on the repository
    #[serde(default)]
    pub token: String,

    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repo: String,

    /// Branch commits are written to
    #[serde(default)]
    pub branch: String,

    /// API endpoint, for self-hosted instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl RemoteConfig {
    /// Whether token, owner, repo and branch are all set.
    pub fn is_configured(&self) -> bool {
        [&self.token, &self.owner, &self.repo, &self.branch]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// API endpoint without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
    }

    /// "owner/repo"
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// The token with all but its last four characters hidden, for display.
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 4 {
            return "*".repeat(chars.len());
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(chars.len() - 4), tail)
    }
}

/// Partial update of the remote settings. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePatch {
    /// new access token
    pub token: Option<String>,
    /// new repository owner
    pub owner: Option<String>,
    /// new repository name
    pub repo: Option<String>,
    /// new target branch
    pub branch: Option<String>,
    /// new API endpoint; empty resets to the default
    pub api_url: Option<String>,
}

/// `Config` holds the parts of Surus the operator can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory backing the local key-value area
    pub data_dir: PathBuf,

    /// Character capacity of the local area (defaults to 5 MiB)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_capacity: Option<usize>,

    /// Repository-relative directory of the published JSON documents
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// Where documents are written when no remote is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Remote repository settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

impl Config {
    /// Create a new config with the given data directory and defaults elsewhere.
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            storage_capacity: None,
            content_dir: default_content_dir(),
            download_dir: None,
            remote: None,
        }
    }

    /// Character capacity of the local area.
    pub fn capacity(&self) -> usize {
        self.storage_capacity.unwrap_or(DEFAULT_CAPACITY)
    }

    /// Directory for download-fallback documents (defaults to `<data_dir>/downloads`).
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("downloads"))
    }

    /// Remote settings, only if complete.
    pub fn configured_remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref().filter(|remote| remote.is_configured())
    }

    /// Merge a partial update over the stored remote settings.
    pub fn merge_remote(&mut self, patch: RemotePatch) {
        let remote = self.remote.get_or_insert_with(RemoteConfig::default);
        if let Some(token) = patch.token {
            remote.token = token;
        }
        if let Some(owner) = patch.owner {
            remote.owner = owner;
        }
        if let Some(repo) = patch.repo {
            remote.repo = repo;
        }
        if let Some(branch) = patch.branch {
            remote.branch = branch;
        }
        if let Some(api_url) = patch.api_url {
            remote.api_url = Some(api_url).filter(|url| !url.trim().is_empty());
        }
        if remote.branch.trim().is_empty() {
            remote.branch = DEFAULT_BRANCH.to_string();
        }
    }

    /// Forget the remote settings.
    pub fn clear_remote(&mut self) {
        self.remote = None;
    }

    /// Parse a config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Render the config as TOML text.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load config from a specific path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| CmsError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Save config to a specific path, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| CmsError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("surus");
        Self::new(data_dir)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/surus/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("surus").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(CmsError::NoConfigDir)?;
        self.save_to(&path)
    }
}

// ============================================================================
// WASM-specific implementation
// ============================================================================

#[cfg(target_arch = "wasm32")]
impl Default for Config {
    fn default() -> Self {
        // The key-value area is the browser's; the path is nominal
        Self::new(PathBuf::from("/surus"))
    }
}
