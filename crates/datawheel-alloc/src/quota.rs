//! Two-tier quota allocation
//!
//! Low-tier members receive a fixed quota; the remainder of the total is
//! split as evenly as possible among everyone else, with leftover items
//! going one each to the earliest members.

use datawheel_common::{
    AssignmentSequence, Error, LowPolicy, Name, Result, Roster, StatsTable,
};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// How a quota request was split
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuotaPlan {
    /// Items per low-tier member
    pub low_value: usize,
    /// Number of low-tier members on the roster
    pub low_members: usize,
    /// Items reserved for the low tier
    pub total_low: usize,
    /// Items left for normal members
    pub remaining: usize,
    /// Base share per normal member
    pub per_person: usize,
    /// Normal members (from the front) receiving one extra item
    pub extra: usize,
}

/// Result of a quota allocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotaAllocation {
    /// Normal members first, then low-tier members, each repeated by count
    pub sequence: AssignmentSequence,
    /// Count for every roster member, including those that got nothing
    pub stats: StatsTable,
    pub plan: QuotaPlan,
}

/// Quota allocator for a fixed low-tier policy
#[derive(Clone, Copy, Debug)]
pub struct QuotaAllocator {
    policy: LowPolicy,
}

impl QuotaAllocator {
    #[must_use]
    pub fn new(policy: LowPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> LowPolicy {
        self.policy
    }

    /// Allocate `total` items over a roster. Low names missing from the
    /// roster have no effect.
    pub fn allocate(&self, roster: &Roster, total: usize) -> Result<QuotaAllocation> {
        allocate_quota(roster.names(), &roster.low_set(), total, self.policy)
    }
}

/// Split `total` items between the low tier and everyone else
pub fn allocate_quota(
    names: &[Name],
    low_set: &HashSet<Name>,
    total: usize,
    policy: LowPolicy,
) -> Result<QuotaAllocation> {
    crate::check_total(total)?;

    let (low_list, normal_list): (Vec<&Name>, Vec<&Name>) =
        names.iter().partition(|name| low_set.contains(*name));

    let low_value = low_value(policy, total, low_list.len())?;
    let total_low = low_value
        .checked_mul(low_list.len())
        .filter(|&reserved| reserved <= total)
        .ok_or_else(|| Error::capacity("low quota exceeds total"))?;
    let remaining = total - total_low;

    if remaining > 0 && normal_list.is_empty() {
        return Err(Error::capacity("no normal members for remainder"));
    }

    let (per_person, extra) = if normal_list.is_empty() {
        (0, 0)
    } else {
        (remaining / normal_list.len(), remaining % normal_list.len())
    };

    let plan = QuotaPlan {
        low_value,
        low_members: low_list.len(),
        total_low,
        remaining,
        per_person,
        extra,
    };
    debug!(?policy, ?plan, "quota split");

    let shares = normal_list
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, per_person + usize::from(i < extra)))
        .chain(low_list.iter().map(|name| (*name, low_value)));

    let mut sequence = Vec::with_capacity(total);
    let mut stats = StatsTable::new();
    for (name, count) in shares {
        sequence.extend(std::iter::repeat_n(name, count).cloned());
        stats.add(name, count);
    }

    Ok(QuotaAllocation {
        sequence: AssignmentSequence::from(sequence),
        stats,
        plan,
    })
}

/// Items per low-tier member.
///
/// Percentages round down twice (once for the tier, once per member); the
/// shortfall goes to the normal members.
fn low_value(policy: LowPolicy, total: usize, low_members: usize) -> Result<usize> {
    match policy {
        LowPolicy::FixedCount(n) => Ok(n),
        LowPolicy::Percentage(_) if low_members == 0 => Ok(0),
        LowPolicy::Percentage(p) => {
            let target_low_total = usize::try_from(p)
                .ok()
                .and_then(|p| total.checked_mul(p))
                .map(|scaled| scaled / 100)
                .ok_or_else(|| Error::invalid_argument("percentage overflows total"))?;
            Ok(target_low_total / low_members)
        }
    }
}
