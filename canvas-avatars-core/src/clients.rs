//! Client factory: joins roster records to image files.

use std::path::Path;

use tracing::{error, info, warn};

use crate::contract::{Client, RosterRecord, SkipReason, SkippedRecord};
use crate::image::resolve_image;

/// Result of building clients from a roster.
///
/// `accepted.len() + skipped.len()` always equals the number of records given.
#[derive(Debug, Default)]
pub struct ClientBatch {
    pub accepted: Vec<Client>,
    pub skipped: Vec<SkippedRecord>,
}

impl ClientBatch {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Builds one client per record whose image can be resolved, in roster order.
///
/// Records without a readable image, or whose client fails validation, are
/// skipped and reported; the batch is never aborted.
pub fn build_clients(records: &[RosterRecord], images_dir: &Path) -> ClientBatch {
    let mut batch = ClientBatch::default();

    for record in records {
        info!(client_id = %record.client_id, image = %record.image_filename, "Current student");

        let Some(image) = resolve_image(images_dir, &record.image_filename) else {
            error!(image = %record.image_filename, "Image file cannot be found");
            warn!(client_id = %record.client_id, "Skipped as no image could be found");
            batch.skipped.push(skipped(record, SkipReason::ImageNotFound));
            continue;
        };

        match Client::new(record.client_id.clone(), image) {
            Ok(client) => batch.accepted.push(client),
            Err(e) => {
                error!(client_id = %record.client_id, error = %e, "Could not create user");
                batch.skipped.push(skipped(record, SkipReason::InvalidClient(e)));
            }
        }
    }

    info!(
        accepted = batch.accepted.len(),
        skipped = batch.skipped_count(),
        "Total of {} users created",
        batch.accepted.len()
    );
    batch
}

fn skipped(record: &RosterRecord, reason: SkipReason) -> SkippedRecord {
    SkippedRecord {
        client_id: record.client_id.clone(),
        image_filename: record.image_filename.clone(),
        reason,
    }
}
