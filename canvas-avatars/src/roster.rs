use anyhow::{Context, Result};
use canvas_avatars_core::contract::RosterRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Reads the roster CSV at `path`. Records keep file order.
pub fn read_roster(path: &Path) -> Result<Vec<RosterRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open roster file {}", path.display()))?;
    let records = parse_roster(file)
        .with_context(|| format!("Failed to parse roster file {}", path.display()))?;
    info!(roster = %path.display(), records = records.len(), "Roster loaded");
    Ok(records)
}

/// Parses roster CSV with a header row; `client_id` and `image_filename` are
/// required, other columns are ignored.
pub fn parse_roster<R: Read>(reader: R) -> Result<Vec<RosterRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize()
        .enumerate()
        // Row 1 is the header.
        .map(|(index, row)| row.with_context(|| format!("Invalid roster row {}", index + 2)))
        .collect()
}
