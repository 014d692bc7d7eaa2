//! One parser per link scheme, dispatched from [`explode`]

pub mod common;
pub mod http;
pub mod hysteria;
pub mod snell;
pub mod socks;
pub mod ss;
pub mod ssr;
pub mod trojan;
pub mod tuic;
pub mod vless;
pub mod vmess;

pub use common::explode;
