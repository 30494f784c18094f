/// `load_config` module: finds and parses the settings file, then injects secrets from the environment.
///
/// This module is the only place where user-supplied settings text is parsed into
/// [`Settings`]. JSON and YAML are both accepted; the parser is chosen from the file
/// extension, never by trial and error.
///
/// # Discovery
/// When only a settings directory is given, [`locate_settings`] picks a file
/// deterministically: `settings.json`, then `settings.yaml`, then `settings.yml`,
/// then the first supported file in name order.
///
/// # Secrets
/// `CANVAS_ACCESS_TOKEN`, when set, overrides the token from the file so that the
/// credential does not have to be committed alongside the other settings.
use anyhow::{Context, Result};
use canvas_avatars_core::config::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ACCESS_TOKEN_ENV: &str = "CANVAS_ACCESS_TOKEN";

const PREFERRED_SETTINGS_FILES: [&str; 3] = ["settings.json", "settings.yaml", "settings.yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Yaml,
}

impl SettingsFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(SettingsFormat::Json),
            "yaml" | "yml" => Some(SettingsFormat::Yaml),
            _ => None,
        }
    }

    pub fn parse(self, content: &str) -> Result<Settings> {
        match self {
            SettingsFormat::Json => {
                serde_json::from_str(content).context("Failed to parse settings JSON")
            }
            SettingsFormat::Yaml => {
                serde_yaml::from_str(content).context("Failed to parse settings YAML")
            }
        }
    }
}

/// Picks the settings file to use inside `dir`.
pub fn locate_settings(dir: &Path) -> Result<PathBuf> {
    for name in PREFERRED_SETTINGS_FILES {
        let candidate = dir.join(name);
        if candidate.is_file() {
            info!(settings = %candidate.display(), "Found settings file");
            return Ok(candidate);
        }
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read settings directory {}", dir.display()))?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && SettingsFormat::from_path(path).is_some())
        .collect();
    candidates.sort();

    match candidates.into_iter().next() {
        Some(path) => {
            info!(settings = %path.display(), "Using first supported settings file");
            Ok(path)
        }
        None => {
            error!(dir = %dir.display(), "No JSON or YAML settings file found");
            anyhow::bail!(
                "No settings file (.json, .yaml, .yml) found in {}",
                dir.display()
            )
        }
    }
}

/// Loads the settings file at `path` and injects the access token from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading settings from file");

    let Some(format) = SettingsFormat::from_path(path_ref) else {
        error!(config_path = ?path_ref, "Unsupported settings file extension");
        anyhow::bail!(
            "Unsupported settings file {:?}: expected .json, .yaml or .yml",
            path_ref
        );
    };

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read settings file");
            return Err(anyhow::anyhow!(
                "Failed to read settings file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut settings = match format.parse(&content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, ?format, "Parsed settings successfully");
            settings
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse settings");
            return Err(e);
        }
    };

    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.trim().is_empty() {
            info!("{} found in env", ACCESS_TOKEN_ENV);
            settings.access_token = token;
        }
    }

    if settings.access_token.trim().is_empty() {
        error!("No access token in settings or environment");
        anyhow::bail!(
            "Missing access token: set access_token in the settings file or {}",
            ACCESS_TOKEN_ENV
        );
    }
    if settings.domain.trim().is_empty() {
        error!("No domain in settings");
        anyhow::bail!("Missing domain in settings");
    }

    Ok(settings)
}
