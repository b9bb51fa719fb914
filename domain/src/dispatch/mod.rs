//! Dispatch domain
//!
//! Canonical keys and grouping rules used by the deduplicating executor.

mod work_unit;

pub use work_unit::{WorkUnit, canonical_key, group_work_units};
