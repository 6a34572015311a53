//! Background Tasks Module
//!
//! Tasks spawned by the coordinator for each fetch cycle.
//!
//! # Tasks
//! - Fetch: awaits the query's fetch function and settles the entry
//! - Staleness check: fires once at the entry's expiry to notify subscribers

mod fetch;
mod staleness;

pub(crate) use fetch::spawn_fetch;
pub(crate) use staleness::spawn_staleness_check;
