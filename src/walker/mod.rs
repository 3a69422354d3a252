//! Parallel metadata collection pipeline
//!
//! One sequential producer (the tree walker) feeds a bounded queue of file
//! paths to a pool of stat workers, whose records flow to the batched CSV
//! sink. Inaccessible directories are reported through an injected error
//! handler instead of aborting the traversal.

pub mod coordinator;
pub mod dispatcher;
pub mod extract;
pub mod walk;

pub use coordinator::{ScanCoordinator, ScanProgress, ScanSummary};
pub use dispatcher::DispatchStats;
pub use extract::{FsStat, MetadataExtractor, RetryPolicy, Stat};
pub use walk::{TreeWalker, WalkErrorHandler};
