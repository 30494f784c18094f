use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run settings, as read from the settings file.
///
/// Relative paths are resolved against `working_path`.
#[derive(Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_working_path")]
    pub working_path: PathBuf,
    pub images_path: PathBuf,
    pub csv_directory: PathBuf,
    pub csv_filename: String,
    pub domain: String,
    #[serde(default)]
    pub access_token: String,
    pub log_filename: PathBuf,
}

fn default_working_path() -> PathBuf {
    PathBuf::from(".")
}

impl Settings {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_path.join(path)
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.resolve(&self.images_path)
    }

    pub fn roster_dir(&self) -> PathBuf {
        self.resolve(&self.csv_directory)
    }

    pub fn roster_path(&self) -> PathBuf {
        self.roster_dir().join(&self.csv_filename)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_filename)
    }

    pub fn trace_loaded(&self) {
        info!(
            working_path = %self.working_path.display(),
            images_dir = %self.images_dir().display(),
            roster = %self.roster_path().display(),
            domain = %self.domain,
            access_token_len = self.access_token.len(),
            "Loaded Settings"
        );
        debug!(?self, "Settings loaded (full debug)");
    }
}

// Hand-written so the access token never reaches a log line.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("working_path", &self.working_path)
            .field("images_path", &self.images_path)
            .field("csv_directory", &self.csv_directory)
            .field("csv_filename", &self.csv_filename)
            .field("domain", &self.domain)
            .field("access_token", &"<redacted>")
            .field("log_filename", &self.log_filename)
            .finish()
    }
}
