//! Analysis modules.
//!
//! Date window resolution and the helpers that correlate PRs with
//! stories and team members.

pub mod aggregator;
pub mod window;

pub use aggregator::*;
pub use window::{DateRange, PrState};
