pub mod group;

pub use group::{merge_groups, GroupMergeReport, GroupSelection};
