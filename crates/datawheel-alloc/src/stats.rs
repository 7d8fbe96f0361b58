//! Per-person totals for an assignment sequence

use datawheel_common::{AssignmentSequence, Name, StatsTable};

/// Count how many items each name received
#[must_use]
pub fn aggregate(sequence: &AssignmentSequence) -> StatsTable {
    aggregate_names(sequence.as_slice())
}

/// Count occurrences of each distinct name in a slice
#[must_use]
pub fn aggregate_names(names: &[Name]) -> StatsTable {
    names.iter().fold(StatsTable::new(), |mut stats, name| {
        stats.add(name, 1);
        stats
    })
}
