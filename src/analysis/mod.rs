//! Classification and counting of resource items.

pub mod aggregator;
pub mod predicates;

pub use aggregator::{aggregate, Cancelled, Counts, Parallelism};
