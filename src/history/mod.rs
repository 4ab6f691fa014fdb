//! Sample queue, raw log and the two in-memory views of history.
//!
//! - `queue`: FIFO between the acquirer and the consumer
//! - `short`: fixed-size window of raw rows
//! - `decimate`: adaptively downsampled long view
//! - `logfile`: append-only text log of every raw sample
//! - `store`: the consumer that ties them together

pub mod decimate;
pub mod logfile;
pub mod queue;
pub mod short;
pub mod store;

pub use decimate::{Compaction, LongHistory};
pub use logfile::LogFile;
pub use queue::SampleQueue;
pub use short::ShortHistory;
pub use store::{HistoryStore, LongStats};
