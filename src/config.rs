//! # Config Module
//!
//! Credentials live in one flat JSON file:
//!
//! ```json
//! {"token": "...", "groupId": "...", "secondaryToken": "...", "secondaryGroupId": "..."}
//! ```
//!
//! stored at `~/.plan-statusline/credentials.json` unless
//! `PLAN_STATUSLINE_CREDENTIALS` points elsewhere. `PLAN_STATUSLINE_TOKEN` /
//! `PLAN_STATUSLINE_GROUP_ID` (and their `SECONDARY_` variants) override the
//! file. Nothing else is persisted.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{QuotaError, Result};

const CREDENTIALS_PATH_ENV: &str = "PLAN_STATUSLINE_CREDENTIALS";
const CONFIG_DIR_NAME: &str = ".plan-statusline";
const CREDENTIALS_FILE_NAME: &str = "credentials.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_group_id: Option<String>,
}

/// Token and account id for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub group_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub primary: Credentials,
    pub secondary: Option<Credentials>,
}

/// Location of the credentials file
pub fn credentials_path() -> Result<PathBuf> {
    if let Some(custom) = env_non_empty(CREDENTIALS_PATH_ENV) {
        return Ok(PathBuf::from(custom));
    }
    let base = BaseDirs::new()
        .ok_or_else(|| QuotaError::Configuration("cannot locate home directory".into()))?;
    Ok(base
        .home_dir()
        .join(CONFIG_DIR_NAME)
        .join(CREDENTIALS_FILE_NAME))
}

/// Read the credentials file; a missing or unparsable file reads as empty
pub fn read_credentials_file(path: &Path) -> CredentialsFile {
    let Ok(raw) = fs::read_to_string(path) else {
        return CredentialsFile::default();
    };
    match serde_json::from_str(&raw) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring malformed credentials file");
            CredentialsFile::default()
        }
    }
}

/// Resolve credentials from environment and file. Missing primary credentials
/// are a [`QuotaError::Configuration`]; an incomplete secondary pair is ignored.
pub fn load_credentials() -> Result<AccountCredentials> {
    let path = credentials_path()?;
    let file = read_credentials_file(&path);

    let token = env_non_empty("PLAN_STATUSLINE_TOKEN").or(non_empty(file.token));
    let group_id = env_non_empty("PLAN_STATUSLINE_GROUP_ID").or(non_empty(file.group_id));
    let primary = match (token, group_id) {
        (Some(token), Some(group_id)) => Credentials { token, group_id },
        (None, _) => {
            return Err(QuotaError::Configuration(format!(
                "API token not set; run `plan-statusline auth <TOKEN> <GROUP_ID>` or set PLAN_STATUSLINE_TOKEN (looked in {})",
                path.display()
            )));
        }
        (_, None) => {
            return Err(QuotaError::Configuration(format!(
                "group id not set; run `plan-statusline auth <TOKEN> <GROUP_ID>` or set PLAN_STATUSLINE_GROUP_ID (looked in {})",
                path.display()
            )));
        }
    };

    let secondary_token =
        env_non_empty("PLAN_STATUSLINE_SECONDARY_TOKEN").or(non_empty(file.secondary_token));
    let secondary_group =
        env_non_empty("PLAN_STATUSLINE_SECONDARY_GROUP_ID").or(non_empty(file.secondary_group_id));
    let secondary = match (secondary_token, secondary_group) {
        (Some(token), Some(group_id)) => Some(Credentials { token, group_id }),
        _ => None,
    };

    Ok(AccountCredentials { primary, secondary })
}

/// Write one account's credentials, keeping the other account's entry intact
pub fn save_credentials(token: &str, group_id: &str, secondary: bool) -> Result<PathBuf> {
    let path = credentials_path()?;
    let mut file = read_credentials_file(&path);
    let (token, group_id) = (Some(token.trim().to_string()), Some(group_id.trim().to_string()));
    if secondary {
        file.secondary_token = token;
        file.secondary_group_id = group_id;
    } else {
        file.token = token;
        file.group_id = group_id;
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| {
            QuotaError::Configuration(format!("create {}: {e}", dir.display()))
        })?;
    }
    let json = serde_json::to_string_pretty(&file)?;
    fs::write(&path, json)
        .map_err(|e| QuotaError::Configuration(format!("write {}: {e}", path.display())))?;
    restrict_permissions(&path);
    Ok(path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(err) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!(path = %path.display(), %err, "could not restrict credentials file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|v| non_empty(Some(v)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
