//! Analysis modules.
//!
//! Sample collection and averaging over a result tree.

pub mod aggregator;

pub use aggregator::Aggregator;
