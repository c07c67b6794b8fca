//! Domain logic that does not depend on the HTTP layer.
//!
//! * [`permissions`] resolves what a user may access and edits the custom
//!   permission list of a group.
//! * [`time_bill`] parses recorded durations and rates and builds the
//!   per-day calendar summary.

pub mod error;
pub mod permissions;
pub mod time_bill;

pub use error::{ComputeError, Result};
