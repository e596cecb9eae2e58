//! Startup configuration from environment variables.
//!
//! All configuration is read once at process start; anything missing or
//! malformed is fatal then, never per-request. Values are read through a
//! lookup closure so tests never touch the process environment.
//!
//! Variables: `APP_ID`, `API_HASH`, `BOT_TOKEN` (chat platform),
//! `SA_JSON` / `SERVICE_ACCOUNT_FILE` (storage credentials),
//! `DRIVE_FOLDER_ID` (optional destination folder), `QUALITY_CEILING`
//! (default 1080).

use std::path::{Path, PathBuf};

use tracing::info;

const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "service_account.json";
const DEFAULT_QUALITY_CEILING: u32 = 1080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("storage credentials unavailable: {0}")]
    Credentials(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub app_id: i64,
    pub api_hash: String,
    pub bot_token: String,
    /// Path the storage client reads its key from.
    pub service_account_file: PathBuf,
    /// Inline key JSON, materialized to the file path at startup.
    pub service_account_json: Option<String>,
    pub drive_folder_id: Option<String>,
    pub quality_ceiling: u32,
}

impl RelayConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`. Values are whitespace-trimmed;
    /// blank values count as absent. Every missing required variable is
    /// reported in one error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut missing = Vec::new();
        let mut require = |name: &str| match get(name) {
            Some(value) => value,
            None => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let app_id_raw = require("APP_ID");
        let api_hash = require("API_HASH");
        let bot_token = require("BOT_TOKEN");
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let app_id = app_id_raw
            .parse::<i64>()
            .map_err(|e| ConfigError::Invalid {
                name: "APP_ID".into(),
                reason: e.to_string(),
            })?;

        let quality_ceiling = match get("QUALITY_CEILING") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                name: "QUALITY_CEILING".into(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_QUALITY_CEILING,
        };

        Ok(Self {
            app_id,
            api_hash,
            bot_token,
            service_account_file: get("SERVICE_ACCOUNT_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SERVICE_ACCOUNT_FILE)),
            service_account_json: get("SA_JSON"),
            drive_folder_id: get("DRIVE_FOLDER_ID"),
            quality_ceiling,
        })
    }

    /// Makes sure the service-account key file exists, materializing the
    /// inline JSON when the file is absent. The written key is readable
    /// by the owner only.
    pub fn ensure_service_account_key(&self) -> Result<&Path, ConfigError> {
        let path = self.service_account_file.as_path();
        if path.exists() {
            return Ok(path);
        }

        let json = self.service_account_json.as_deref().ok_or_else(|| {
            ConfigError::Credentials(format!(
                "{} does not exist and SA_JSON is not set",
                path.display()
            ))
        })?;

        serde_json::from_str::<serde_json::Value>(json).map_err(|e| {
            ConfigError::Credentials(format!("SA_JSON is not valid JSON: {e}"))
        })?;

        std::fs::write(path, json)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        info!(path = %path.display(), "service account key materialized");
        Ok(path)
    }
}
