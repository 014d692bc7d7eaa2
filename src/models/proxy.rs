//! Proxy model definitions
//!
//! Contains the canonical node record every link dialect is parsed into.

use std::fmt;

/// Represents the type of a proxy.
/// This is the canonical enum used for proxy type identification across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyType {
    Unknown,
    Shadowsocks,
    ShadowsocksR,
    VMess,
    Vless,
    Trojan,
    HTTP,
    HTTPS,
    Socks5,
    Snell,
    Hysteria,
    Tuic,
}

impl ProxyType {
    /// Human-readable name, used in log lines
    pub fn as_str(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "SS",
            ProxyType::ShadowsocksR => "SSR",
            ProxyType::VMess => "VMess",
            ProxyType::Vless => "Vless",
            ProxyType::Trojan => "Trojan",
            ProxyType::HTTP => "HTTP",
            ProxyType::HTTPS => "HTTPS",
            ProxyType::Socks5 => "SOCKS5",
            ProxyType::Snell => "Snell",
            ProxyType::Hysteria => "Hysteria",
            ProxyType::Tuic => "TUIC",
            ProxyType::Unknown => "Unknown",
        }
    }

    /// Value of the `type` key in a Clash proxy entry
    pub fn clash_type(self) -> &'static str {
        match self {
            ProxyType::Shadowsocks => "ss",
            ProxyType::ShadowsocksR => "ssr",
            ProxyType::VMess => "vmess",
            ProxyType::Vless => "vless",
            ProxyType::Trojan => "trojan",
            ProxyType::HTTP | ProxyType::HTTPS => "http",
            ProxyType::Socks5 => "socks5",
            ProxyType::Snell => "snell",
            ProxyType::Hysteria => "hysteria",
            ProxyType::Tuic => "tuic",
            ProxyType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication material of a node, one variant per protocol family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Shadowsocks and ShadowsocksR
    Cipher { cipher: String, password: String },
    /// VMess and VLESS
    Uuid {
        uuid: String,
        alter_id: Option<u16>,
        cipher: Option<String>,
    },
    /// TUIC
    UuidPassword { uuid: String, password: String },
    /// HTTP(S) and SOCKS5 with authentication
    UserPass { username: String, password: String },
    /// HTTP(S) and SOCKS5 without authentication
    Anonymous,
    /// Trojan
    Password { password: String },
    /// Snell
    Psk { psk: String },
    /// Hysteria; the token is optional on the wire
    AuthToken { token: Option<String> },
}

/// Protocol-dependent transport and obfuscation settings.
///
/// Every field is optional; explode functions only fill what their dialect
/// carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOptions {
    /// `tcp`, `ws`, `grpc`, `h2` ...
    pub network: Option<String>,
    pub path: Option<String>,
    /// Host header
    pub host: Option<String>,
    pub tls: bool,
    pub sni: Option<String>,
    pub alpn: Vec<String>,
    pub skip_cert_verify: Option<bool>,

    // vless
    pub flow: Option<String>,
    pub encryption: Option<String>,

    // ss plugin
    pub plugin: Option<String>,
    /// Plugin options in the format of `key1=value1;key2=value2`
    pub plugin_opts: Option<String>,

    // ssr and snell obfuscation, hysteria obfs
    pub obfs: Option<String>,
    /// SSR obfs param, snell obfs host
    pub obfs_param: Option<String>,
    /// SSR protocol, hysteria transport protocol
    pub protocol: Option<String>,
    pub protocol_param: Option<String>,

    // hysteria
    /// upload speed in Mbps
    pub up_mbps: Option<u32>,
    /// download speed in Mbps
    pub down_mbps: Option<u32>,

    // tuic
    pub congestion_control: Option<String>,
    pub udp_relay_mode: Option<String>,
    pub disable_sni: Option<bool>,

    pub snell_version: Option<u16>,
    pub udp: Option<bool>,
    pub tfo: Option<bool>,
    pub timeout: Option<u32>,
}

/// One parsed proxy endpoint.
///
/// Built once per successfully parsed line and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    pub protocol: ProxyType,
    pub server: String,
    pub port: u16,
    pub credentials: Credentials,
    pub transport: TransportOptions,
}

impl NodeRecord {
    pub fn new(
        name: String,
        protocol: ProxyType,
        server: String,
        port: u16,
        credentials: Credentials,
        transport: TransportOptions,
    ) -> Self {
        NodeRecord {
            name,
            protocol,
            server,
            port,
            credentials,
            transport,
        }
    }
}
