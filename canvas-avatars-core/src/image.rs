//! Image resolution: turns a roster filename into an in-memory image snapshot.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path};

use tracing::{debug, warn};

use crate::contract::ImageDescriptor;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Reads `images_dir/filename` into an [`ImageDescriptor`].
///
/// Returns `None` when the file is missing or unreadable, or when `filename` is
/// anything other than a single path component. The directory itself is assumed
/// to have been checked already.
pub fn resolve_image(images_dir: &Path, filename: &str) -> Option<ImageDescriptor> {
    if filename.trim().is_empty() {
        warn!(images_dir = %images_dir.display(), "Empty image filename");
        return None;
    }
    if !is_plain_file_name(filename) {
        warn!(filename, "Image filename must name a file directly inside the images directory");
        return None;
    }
    let path = images_dir.join(filename);

    let raw_bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Image not found");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = ?e, "Image could not be read");
            return None;
        }
    };

    let content_type = content_type_for(&path);
    debug!(
        path = %path.display(),
        size = raw_bytes.len(),
        content_type = %content_type,
        "Image found"
    );
    Some(ImageDescriptor::new(filename, content_type, raw_bytes))
}

fn is_plain_file_name(filename: &str) -> bool {
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}
