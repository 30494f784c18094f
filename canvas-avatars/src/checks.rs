//! Startup gate: every path the run depends on must exist before anything else happens.

use canvas_avatars_core::config::Settings;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("File or directory missing: {}", .0.display())]
    Missing(PathBuf),
    #[error("Directory is empty: {}", .0.display())]
    Empty(PathBuf),
    #[error("Could not read directory {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },
}

/// Verifies the audit-log directory, the images directory, the roster directory
/// and the roster file, in that order. The first problem found is returned.
pub fn check_paths(settings: &Settings) -> Result<(), CheckError> {
    info!("Verifying directories");

    let log_path = settings.log_path();
    let log_dir = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    check_exists(&log_dir)?;
    check_directory(&settings.images_dir())?;
    check_directory(&settings.roster_dir())?;
    check_exists(&settings.roster_path())?;

    info!("File checks complete");
    Ok(())
}

fn check_exists(path: &Path) -> Result<(), CheckError> {
    if !path.exists() {
        error!(path = %path.display(), "File or directory MISSING");
        return Err(CheckError::Missing(path.to_path_buf()));
    }
    info!(path = %path.display(), "Found");
    Ok(())
}

/// The path must be an existing directory with at least one entry.
pub fn check_directory(path: &Path) -> Result<(), CheckError> {
    if !path.is_dir() {
        error!(path = %path.display(), "Directory MISSING");
        return Err(CheckError::Missing(path.to_path_buf()));
    }
    let mut entries = fs::read_dir(path).map_err(|source| CheckError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if entries.next().is_none() {
        error!(path = %path.display(), "Directory EMPTY");
        return Err(CheckError::Empty(path.to_path_buf()));
    }
    info!(path = %path.display(), "Found");
    Ok(())
}
