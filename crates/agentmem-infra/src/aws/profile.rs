//! Static keys from the shared AWS files (`~/.aws/credentials` and
//! `~/.aws/config`), as written by `aws configure`.
//!
//! The profile is `AWS_PROFILE` (or `AWS_DEFAULT_PROFILE`), else `default`.
//! The credentials file is consulted before the config file. Profiles that
//! delegate to SSO, role assumption or a credential process carry no static
//! keys and are reported as such.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use secrecy::SecretString;

use agentmem_types::error::ConfigError;

use super::credentials::AwsCredentials;

pub const PROFILE_VAR: &str = "AWS_PROFILE";
pub const DEFAULT_PROFILE_VAR: &str = "AWS_DEFAULT_PROFILE";
pub const SHARED_CREDENTIALS_FILE_VAR: &str = "AWS_SHARED_CREDENTIALS_FILE";
pub const CONFIG_FILE_VAR: &str = "AWS_CONFIG_FILE";

const DEFAULT_PROFILE: &str = "default";

type Sections = HashMap<String, HashMap<String, String>>;

/// Credentials for the selected profile.
///
/// `Ok(None)` when neither file has the profile and none was named
/// explicitly; an explicitly named profile without static keys is an error.
pub(crate) fn profile_credentials(
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<Option<AwsCredentials>, ConfigError> {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
    let explicit = get(PROFILE_VAR).or_else(|| get(DEFAULT_PROFILE_VAR));
    let profile = explicit.as_deref().unwrap_or(DEFAULT_PROFILE);

    let credentials_file = shared_file(get(SHARED_CREDENTIALS_FILE_VAR), "credentials");
    let config_file = shared_file(get(CONFIG_FILE_VAR), "config");

    if let Some(path) = credentials_file {
        let sections = read_sections(&path, SHARED_CREDENTIALS_FILE_VAR)?;
        if let Some(credentials) = sections.get(profile).and_then(static_keys) {
            tracing::debug!(profile, path = %path.display(), "Using shared credentials file");
            return Ok(Some(credentials));
        }
    }
    if let Some(path) = config_file {
        let sections = read_sections(&path, CONFIG_FILE_VAR)?;
        let section = if profile == DEFAULT_PROFILE {
            sections
                .get(DEFAULT_PROFILE)
                .or_else(|| sections.get("profile default"))
        } else {
            sections.get(&format!("profile {profile}"))
        };
        if let Some(credentials) = section.and_then(static_keys) {
            tracing::debug!(profile, path = %path.display(), "Using shared config file");
            return Ok(Some(credentials));
        }
    }

    match explicit {
        Some(profile) => Err(ConfigError::Invalid {
            name: PROFILE_VAR,
            reason: format!(
                "profile '{profile}' has no aws_access_key_id/aws_secret_access_key \
                 (SSO, role and credential_process profiles are not supported)"
            ),
        }),
        None => Ok(None),
    }
}

/// `override_path` if set, else `~/.aws/{name}`.
fn shared_file(override_path: Option<String>, name: &str) -> Option<PathBuf> {
    match override_path {
        Some(path) => Some(PathBuf::from(path)),
        None => dirs::home_dir().map(|home| home.join(".aws").join(name)),
    }
}

/// A missing file has no sections.
fn read_sections(path: &Path, var: &'static str) -> Result<Sections, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse_sections(&contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Sections::new()),
        Err(e) => Err(ConfigError::Invalid {
            name: var,
            reason: format!("{}: {e}", path.display()),
        }),
    }
}

fn parse_sections(contents: &str) -> Sections {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        let (Some(section), Some((key, value))) = (&current, line.split_once('=')) else {
            continue;
        };
        if let Some(entries) = sections.get_mut(section) {
            entries.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    sections
}

fn static_keys(section: &HashMap<String, String>) -> Option<AwsCredentials> {
    let value = |key: &str| section.get(key).filter(|v| !v.is_empty()).cloned();
    let access_key_id = value("aws_access_key_id")?;
    let secret = value("aws_secret_access_key")?;
    Some(AwsCredentials::new(
        access_key_id,
        SecretString::from(secret),
        value("aws_session_token").map(SecretString::from),
    ))
}
