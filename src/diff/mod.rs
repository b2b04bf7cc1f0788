//! Staged changeset collection, filtering and size capping.

pub mod filter;
pub mod staged;
pub mod truncate;

pub use filter::{DiffSegment, FilteredDiff, filter_diff, header_path, partition_diff, split_segments};
pub use staged::{GitStagedSource, StagedSource, collect_staged_diff};
pub use truncate::{TruncatedDiff, truncate_chars};
