//! CSV and clipboard exports of allocation results

use anyhow::Result;
use datawheel_common::{AssignmentSequence, StatsTable, TeamCodes};
use std::io::Write;

/// Write one `team,recipient` row per data item
pub fn write_assignments<W: Write>(
    writer: W,
    sequence: &AssignmentSequence,
    teams: &TeamCodes,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["team", "recipient"])?;
    for name in sequence {
        csv_writer.write_record([teams.label(name).unwrap_or(""), name.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write `name,count` rows, highest count first
pub fn write_stats<W: Write>(writer: W, stats: &StatsTable) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["name", "count"])?;
    for entry in stats.sorted_by_count() {
        let count = entry.count.to_string();
        csv_writer.write_record([entry.name.as_str(), count.as_str()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Tab-separated `team<TAB>recipient` lines without a header, ready to
/// paste into a spreadsheet
pub fn clipboard_tsv(sequence: &AssignmentSequence, teams: &TeamCodes) -> Result<String> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(Vec::new());
    for name in sequence {
        csv_writer.write_record([teams.label(name).unwrap_or(""), name.as_str()])?;
    }
    let bytes = csv_writer.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Write an export to `path`
pub fn to_file(path: &std::path::Path, export: impl FnOnce(std::fs::File) -> Result<()>) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", path.display(), e))?;
    export(file)
}
