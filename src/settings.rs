//! Uploader settings
//!
//! Settings are read from a JSON file in the platform-specific config folder:
//! - Linux: ~/.config/image-uploader/settings.json
//! - Windows: %APPDATA%/image-uploader/settings.json
//! - macOS: ~/Library/Application Support/image-uploader/settings.json
//!
//! Environment variables override values from the file.

use crate::s3::{PublicUrl, S3ClientConfig};
use crate::uploader::UploaderConfig;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";
pub const ENV_BUCKET: &str = "IMAGE_UPLOADER_BUCKET";
pub const ENV_PUBLIC_URL: &str = "IMAGE_UPLOADER_PUBLIC_URL";
pub const ENV_FORCE_PATH_STYLE: &str = "IMAGE_UPLOADER_FORCE_PATH_STYLE";
pub const ENV_TIMEOUT_SECS: &str = "IMAGE_UPLOADER_TIMEOUT_SECS";

/// Uploader settings as stored on disk
#[derive(Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Custom S3 endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub bucket: Option<String>,

    /// Base URL the bucket is publicly served from
    #[serde(default)]
    pub public_url: Option<PublicUrl>,

    #[serde(default)]
    pub force_path_style: bool,

    /// Timeout in seconds for store operations and remote downloads
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket", &self.bucket)
            .field("public_url", &self.public_url)
            .field("force_path_style", &self.force_path_style)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Settings {
    /// Load the settings file (if any) and apply environment overrides
    pub fn load() -> Result<Self> {
        let path = Self::settings_path()?;
        let mut settings = Self::load_from(&path)?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Load settings from `path`, returning defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Settings file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {:?}", path))?;

        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {:?}", path))?;

        tracing::info!(
            "Loaded settings: bucket={:?}, region={:?}, endpoint={:?}",
            settings.bucket,
            settings.region,
            settings.endpoint_url
        );

        Ok(settings)
    }

    /// Get the path to the settings file
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "github.n-orlov", "image-uploader")
            .context("Failed to determine settings directory")?;

        Ok(proj_dirs.config_dir().join("settings.json"))
    }

    /// Override values with whatever `lookup` returns for the known variables
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_ACCESS_KEY_ID) {
            self.access_key_id = Some(v);
        }
        if let Some(v) = get(ENV_SECRET_ACCESS_KEY) {
            self.secret_access_key = Some(v);
        }
        if let Some(v) = get(ENV_REGION) {
            self.region = Some(v);
        }
        if let Some(v) = get(ENV_ENDPOINT_URL) {
            self.endpoint_url = Some(v);
        }
        if let Some(v) = get(ENV_BUCKET) {
            self.bucket = Some(v);
        }
        if let Some(v) = get(ENV_PUBLIC_URL) {
            let public_url = PublicUrl::parse(&v)
                .with_context(|| format!("Invalid {}: {}", ENV_PUBLIC_URL, v))?;
            self.public_url = Some(public_url);
        }
        if let Some(v) = get(ENV_FORCE_PATH_STYLE) {
            self.force_path_style = parse_bool(&v)
                .ok_or_else(|| anyhow!("Invalid {}: {}", ENV_FORCE_PATH_STYLE, v))?;
        }
        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            let secs = v
                .parse::<u64>()
                .with_context(|| format!("Invalid {}: {}", ENV_TIMEOUT_SECS, v))?;
            self.timeout_secs = Some(secs);
        }

        Ok(())
    }

    /// True when both halves of a static key pair are present
    pub fn has_static_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }

    /// Turn the settings into an uploader configuration.
    ///
    /// The bucket and public URL are required; everything else is optional.
    pub fn uploader_config(&self) -> Result<UploaderConfig> {
        let bucket = self
            .bucket
            .clone()
            .with_context(|| format!("No bucket configured (set {})", ENV_BUCKET))?;

        let public_url = self
            .public_url
            .clone()
            .with_context(|| format!("No public URL configured (set {})", ENV_PUBLIC_URL))?;

        let timeout = self.timeout_secs.map(Duration::from_secs);

        Ok(UploaderConfig {
            s3: S3ClientConfig {
                endpoint_url: self.endpoint_url.clone(),
                force_path_style: self.force_path_style,
                region: self.region.clone(),
                access_key_id: self.access_key_id.clone(),
                secret_access_key: self.secret_access_key.clone(),
                bucket,
                operation_timeout: timeout,
            },
            public_url,
            request_timeout: timeout,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
