//! Core data models for the application
//!
//! This module contains the primary data structures used throughout the application,
//! separated from the logic that operates on them.
//!
//! # Usage
//!
//! ```rust
//! use nodesync::models::{Credentials, NodeRecord, ProxyType, TransportOptions};
//!
//! let node = NodeRecord::new(
//!     "HK-01".to_string(),
//!     ProxyType::Shadowsocks,
//!     "1.2.3.4".to_string(),
//!     8388,
//!     Credentials::Cipher {
//!         cipher: "aes-256-gcm".to_string(),
//!         password: "pass".to_string(),
//!     },
//!     TransportOptions::default(),
//! );
//! assert_eq!(node.protocol.clash_type(), "ss");
//! ```

pub mod batch;
pub mod configs;
pub mod proxy;
pub mod proxy_group_config;

pub use batch::{BatchResult, ParseError, ParseErrorKind, ParseOutcome};
pub use configs::{ConfigDocument, ConfigError};
pub use proxy::*;
pub use proxy_group_config::{
    ProxyGroup, ProxyGroupType, RESERVED_GROUP_NAMES, RETAINED_MEMBERS,
};
