//! Weighted round-robin ("wheel") allocation
//!
//! One round of the wheel is the A segment, then the B segment, then the C
//! segment, where each segment gives every active member of that group
//! `weight` items. Enough rounds are concatenated to cover the requested
//! total, the wheel is optionally rotated to resume after a previous
//! recipient, and the result is truncated to the total.

use datawheel_common::{AssignmentSequence, Error, GroupAssignment, GroupLabel, Name, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Order of items inside one group segment of a round
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelOrder {
    /// Cycle through the whole group `weight` times: `X Y X Y X Y`
    #[default]
    Cycled,
    /// Give each member all `weight` items before the next: `X X X Y Y Y`
    PerMember,
}

/// Dimensions of the wheel built for one request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WheelPlan {
    /// Group members that are also on the working roster, in group order
    pub active: GroupAssignment,
    /// Items handed out per round
    pub base_unit: usize,
    /// Rounds needed to cover the total
    pub rounds: usize,
}

impl WheelPlan {
    /// Length of the full wheel before truncation
    #[must_use]
    pub fn wheel_len(&self) -> usize {
        self.base_unit * self.rounds
    }
}

/// Result of a wheel allocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WheelAllocation {
    /// Items in delivery order, exactly `total` long
    pub sequence: AssignmentSequence,
    pub plan: WheelPlan,
}

/// Wheel allocator over an injected group assignment
#[derive(Clone, Debug, Default)]
pub struct WheelAllocator {
    groups: GroupAssignment,
    order: WheelOrder,
}

impl WheelAllocator {
    /// Create an allocator using the default cycled order
    #[must_use]
    pub fn new(groups: GroupAssignment) -> Self {
        Self {
            groups,
            order: WheelOrder::default(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: WheelOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn groups(&self) -> &GroupAssignment {
        &self.groups
    }

    #[must_use]
    pub fn order(&self) -> WheelOrder {
        self.order
    }

    /// Restrict every group to the names on the working roster.
    ///
    /// Group order is kept; the roster's own order is irrelevant.
    #[must_use]
    pub fn active_groups(&self, names: &[Name]) -> GroupAssignment {
        let roster: HashSet<&Name> = names.iter().collect();
        self.groups
            .iter()
            .fold(GroupAssignment::new(), |active, (label, members)| {
                let kept = members
                    .iter()
                    .filter(|name| roster.contains(name))
                    .cloned()
                    .collect();
                active.with(label, kept)
            })
    }

    /// Compute the wheel dimensions for a request
    pub fn plan(&self, names: &[Name], total: usize) -> Result<WheelPlan> {
        crate::check_total(total)?;

        let active = self.active_groups(names);
        let base_unit: usize = active
            .iter()
            .map(|(label, members)| label.weight() * members.len())
            .sum();

        if base_unit == 0 {
            return Err(Error::configuration("no recognized group members"));
        }

        Ok(WheelPlan {
            active,
            base_unit,
            rounds: total.div_ceil(base_unit),
        })
    }

    /// Build the full, unrotated wheel for a plan
    #[must_use]
    pub fn build_wheel(&self, plan: &WheelPlan) -> Vec<Name> {
        let round: Vec<&Name> = GroupLabel::ALL
            .into_iter()
            .flat_map(|label| segment(plan.active.members(label), label.weight(), self.order))
            .collect();

        let mut wheel = Vec::with_capacity(plan.wheel_len());
        for _ in 0..plan.rounds {
            wheel.extend(round.iter().map(|name| (*name).clone()));
        }
        wheel
    }

    /// Allocate `total` items to the roster `names`.
    ///
    /// When `resume_after` is on the wheel, allocation starts right after
    /// its last occurrence; otherwise it starts at the top of the wheel.
    pub fn allocate(
        &self,
        names: &[Name],
        total: usize,
        resume_after: Option<&Name>,
    ) -> Result<AssignmentSequence> {
        self.allocate_with_plan(names, total, resume_after)
            .map(|allocation| allocation.sequence)
    }

    /// Same as [`allocate`](Self::allocate), also returning the wheel dimensions
    pub fn allocate_with_plan(
        &self,
        names: &[Name],
        total: usize,
        resume_after: Option<&Name>,
    ) -> Result<WheelAllocation> {
        let plan = self.plan(names, total)?;
        debug!(
            base_unit = plan.base_unit,
            rounds = plan.rounds,
            order = ?self.order,
            "building wheel"
        );

        let mut wheel = self.build_wheel(&plan);

        if let Some(marker) = resume_after {
            if rotate_after_last(&mut wheel, marker) {
                debug!(resume_after = %marker, "resuming wheel");
            } else {
                debug!(resume_after = %marker, "resume marker not on wheel, starting from top");
            }
        }

        wheel.truncate(total);
        Ok(WheelAllocation {
            sequence: AssignmentSequence::from(wheel),
            plan,
        })
    }
}

/// Allocate with the default wheel order
pub fn allocate_wheel(
    names: &[Name],
    groups: &GroupAssignment,
    total: usize,
    resume_after: Option<&Name>,
) -> Result<AssignmentSequence> {
    WheelAllocator::new(groups.clone()).allocate(names, total, resume_after)
}

/// Items for one group within a round
fn segment(members: &[Name], weight: usize, order: WheelOrder) -> Vec<&Name> {
    if members.is_empty() {
        return Vec::new();
    }

    match order {
        WheelOrder::Cycled => (0..weight * members.len())
            .map(|i| &members[i % members.len()])
            .collect(),
        WheelOrder::PerMember => members
            .iter()
            .flat_map(|name| std::iter::repeat_n(name, weight))
            .collect(),
    }
}

/// Rotate so the wheel starts right after the last occurrence of `marker`.
///
/// Returns false, leaving the wheel untouched, when `marker` is absent.
fn rotate_after_last(wheel: &mut [Name], marker: &Name) -> bool {
    match wheel.iter().rposition(|name| name == marker) {
        Some(pos) => {
            wheel.rotate_left(pos + 1);
            true
        }
        None => false,
    }
}
