pub mod config;
pub mod exports;
pub mod yaml;

// Re-export the merge entry points
pub use config::group::{merge_groups, GroupMergeReport, GroupSelection};
pub use exports::proxy_to_clash::{merge_proxies, MergePolicy, ProxyMergeReport};
pub use yaml::clash::{render_proxy, ClashProxy};
