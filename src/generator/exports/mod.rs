pub mod proxy_to_clash;

pub use proxy_to_clash::{is_valid_name, merge_proxies, MergePolicy, ProxyMergeReport};
