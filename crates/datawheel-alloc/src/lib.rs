//! Datawheel Allocation - deterministic assignment of data items
//!
//! This crate turns a roster of names plus group/weight metadata into an
//! ordered assignment sequence sized to a target item count, and reduces
//! sequences to per-person totals.
//!
//! # Algorithms
//!
//! ## Wheel
//! Weighted round-robin over the ranked groups A, B and C (weights 3:2:1).
//! The wheel is rebuilt from the group definitions on every call, so a run
//! can be resumed from the name that received the last item of the
//! previous run without storing running totals.
//!
//! ## Quota
//! Two-tier split: low-tier members get a fixed quota (flat count or a
//! percentage of the total) and the remainder is divided evenly among the
//! others, leftovers going to the earliest members.
//!
//! # Example
//! ```ignore
//! use datawheel_alloc::WheelAllocator;
//!
//! let wheel = WheelAllocator::new(groups);
//! let sequence = wheel.allocate(&names, 120, last_recipient.as_ref())?;
//! let stats = datawheel_alloc::aggregate(&sequence);
//! ```

use datawheel_common::{Error, Result};

pub mod quota;
pub mod stats;
pub mod wheel;

pub use quota::{QuotaAllocation, QuotaAllocator, QuotaPlan, allocate_quota};
pub use stats::{aggregate, aggregate_names};
pub use wheel::{WheelAllocation, WheelAllocator, WheelOrder, WheelPlan, allocate_wheel};

/// Largest item count a single request may ask for
pub const MAX_TOTAL: usize = 1_000_000;

/// Reject totals no allocation can be built for
pub(crate) fn check_total(total: usize) -> Result<()> {
    if total == 0 {
        return Err(Error::invalid_argument("total must be positive"));
    }
    if total > MAX_TOTAL {
        return Err(Error::invalid_argument(format!(
            "total {total} exceeds the maximum of {MAX_TOTAL}"
        )));
    }
    Ok(())
}
