//! Core module - snapshot storage, locking and rollup aggregation

mod aggregator;
mod lock;
mod store;
mod types;

pub(crate) use aggregator::{Aggregator, SnapshotOutcome};
pub(crate) use lock::LockSettings;
pub(crate) use store::SnapshotStore;
pub(crate) use types::{
    DateFilter, HistoryDay, Report, Session, SnapshotWarning, TokenTotals,
};
#[cfg(test)]
pub(crate) use types::{Period, RollupResult};
