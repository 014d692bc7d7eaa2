//! Clash proxy entries
//!
//! [`ClashProxy`] mirrors the shape of one element of the `proxies` sequence.
//! Records are converted with `TryFrom<&NodeRecord>` and then serialized into
//! the document as a `serde_yaml::Value`.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value as YamlValue};
use thiserror::Error;

use crate::models::{Credentials, NodeRecord, ProxyType, TransportOptions};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0} nodes have no Clash representation")]
    Unsupported(ProxyType),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn is_empty_option_string(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, str::is_empty)
}

/// Options shared by every proxy type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommonProxyOptions {
    pub name: String,
    pub server: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tfo: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_cert_verify: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "is_empty_option_string")]
    pub sni: Option<String>,
}

impl CommonProxyOptions {
    pub fn new(name: String, server: String, port: u16) -> Self {
        Self {
            name,
            server,
            port,
            udp: None,
            tfo: None,
            skip_cert_verify: None,
            tls: None,
            sni: None,
        }
    }
}

/// A single proxy in Clash configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClashProxy {
    #[serde(rename = "ss")]
    Shadowsocks {
        #[serde(flatten)]
        common: CommonProxyOptions,
        cipher: String,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        plugin: Option<String>,
        #[serde(rename = "plugin-opts", skip_serializing_if = "Option::is_none")]
        plugin_opts: Option<Mapping>,
    },
    #[serde(rename = "ssr")]
    ShadowsocksR {
        #[serde(flatten)]
        common: CommonProxyOptions,
        cipher: String,
        password: String,
        protocol: String,
        obfs: String,
        #[serde(rename = "protocol-param", skip_serializing_if = "is_empty_option_string")]
        protocol_param: Option<String>,
        #[serde(rename = "obfs-param", skip_serializing_if = "is_empty_option_string")]
        obfs_param: Option<String>,
    },
    #[serde(rename = "vmess")]
    VMess {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(rename = "alterId")]
        alter_id: u16,
        cipher: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        network: Option<String>,
        #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
        ws_opts: Option<Mapping>,
        #[serde(rename = "grpc-opts", skip_serializing_if = "Option::is_none")]
        grpc_opts: Option<Mapping>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        servername: Option<String>,
    },
    #[serde(rename = "vless")]
    Vless {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        flow: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        network: Option<String>,
        #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
        ws_opts: Option<Mapping>,
        #[serde(rename = "grpc-opts", skip_serializing_if = "Option::is_none")]
        grpc_opts: Option<Mapping>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        servername: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        alpn: Vec<String>,
    },
    #[serde(rename = "trojan")]
    Trojan {
        #[serde(flatten)]
        common: CommonProxyOptions,
        password: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        network: Option<String>,
        #[serde(rename = "ws-opts", skip_serializing_if = "Option::is_none")]
        ws_opts: Option<Mapping>,
        #[serde(rename = "grpc-opts", skip_serializing_if = "Option::is_none")]
        grpc_opts: Option<Mapping>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        alpn: Vec<String>,
    },
    #[serde(rename = "http")]
    Http {
        #[serde(flatten)]
        common: CommonProxyOptions,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    #[serde(rename = "socks5")]
    Socks5 {
        #[serde(flatten)]
        common: CommonProxyOptions,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        password: Option<String>,
    },
    #[serde(rename = "snell")]
    Snell {
        #[serde(flatten)]
        common: CommonProxyOptions,
        psk: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<u16>,
        #[serde(rename = "obfs-opts", skip_serializing_if = "Option::is_none")]
        obfs_opts: Option<Mapping>,
    },
    #[serde(rename = "hysteria")]
    Hysteria {
        #[serde(flatten)]
        common: CommonProxyOptions,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        protocol: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        up: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        down: Option<u32>,
        #[serde(rename = "auth-str", skip_serializing_if = "is_empty_option_string")]
        auth_str: Option<String>,
        #[serde(skip_serializing_if = "is_empty_option_string")]
        obfs: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        alpn: Vec<String>,
    },
    #[serde(rename = "tuic")]
    Tuic {
        #[serde(flatten)]
        common: CommonProxyOptions,
        uuid: String,
        #[serde(skip_serializing_if = "String::is_empty", default)]
        password: String,
        #[serde(rename = "congestion-controller", skip_serializing_if = "is_empty_option_string")]
        congestion_controller: Option<String>,
        #[serde(rename = "udp-relay-mode", skip_serializing_if = "is_empty_option_string")]
        udp_relay_mode: Option<String>,
        #[serde(rename = "disable-sni", skip_serializing_if = "Option::is_none")]
        disable_sni: Option<bool>,
        #[serde(skip_serializing_if = "Vec::is_empty", default)]
        alpn: Vec<String>,
    },
}

impl ClashProxy {
    /// Serialize into a document node
    pub fn to_yaml_value(&self) -> Result<YamlValue, serde_yaml::Error> {
        serde_yaml::to_value(self)
    }
}

fn key(s: &str) -> YamlValue {
    YamlValue::String(s.to_string())
}

/// `key=value;flag` plugin options of an SS link
fn plugin_option_pairs(opts: &str) -> Vec<(&str, Option<&str>)> {
    opts.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (kv, None),
        })
        .collect()
}

/// Map SIP003 plugin name and options onto Clash's `plugin` / `plugin-opts`
fn clash_plugin(transport: &TransportOptions) -> (Option<String>, Option<Mapping>) {
    let Some(plugin) = transport.plugin.as_deref() else {
        return (None, None);
    };
    let pairs = plugin_option_pairs(transport.plugin_opts.as_deref().unwrap_or(""));
    let get = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == name)
            .and_then(|(_, v)| *v)
            .filter(|v| !v.is_empty())
    };

    let mut opts = Mapping::new();
    match plugin {
        "simple-obfs" | "obfs-local" | "obfs" => {
            if let Some(mode) = get("obfs").or_else(|| get("mode")) {
                opts.insert(key("mode"), key(mode));
            }
            if let Some(host) = get("obfs-host").or_else(|| get("host")) {
                opts.insert(key("host"), key(host));
            }
            (Some("obfs".to_string()), Some(opts))
        }
        "v2ray-plugin" => {
            for name in ["mode", "host", "path"] {
                if let Some(value) = get(name) {
                    opts.insert(key(name), key(value));
                }
            }
            for flag in ["tls", "mux"] {
                if pairs.iter().any(|(k, _)| *k == flag) {
                    opts.insert(key(flag), YamlValue::Bool(true));
                }
            }
            (Some(plugin.to_string()), Some(opts))
        }
        other => {
            for (k, v) in pairs {
                let value = v.map_or(YamlValue::Bool(true), key);
                opts.insert(key(k), value);
            }
            (Some(other.to_string()), Some(opts).filter(|o| !o.is_empty()))
        }
    }
}

/// `ws-opts` for websocket transports
fn ws_opts(transport: &TransportOptions) -> Option<Mapping> {
    if transport.network.as_deref() != Some("ws") {
        return None;
    }
    let mut opts = Mapping::new();
    opts.insert(
        key("path"),
        key(transport.path.as_deref().unwrap_or("/")),
    );
    if let Some(host) = transport.host.as_deref().filter(|h| !h.is_empty()) {
        let mut headers = Mapping::new();
        headers.insert(key("Host"), key(host));
        opts.insert(key("headers"), YamlValue::Mapping(headers));
    }
    Some(opts)
}

/// `grpc-opts` for gRPC transports; the service name travels in `path`
fn grpc_opts(transport: &TransportOptions) -> Option<Mapping> {
    if transport.network.as_deref() != Some("grpc") {
        return None;
    }
    let mut opts = Mapping::new();
    if let Some(service) = transport.path.as_deref().filter(|p| !p.is_empty()) {
        opts.insert(key("grpc-service-name"), key(service));
    }
    Some(opts)
}

fn network(transport: &TransportOptions) -> Option<String> {
    transport
        .network
        .clone()
        .filter(|n| !n.is_empty() && n != "tcp")
}

fn common_options(node: &NodeRecord) -> CommonProxyOptions {
    let t = &node.transport;
    CommonProxyOptions {
        udp: t.udp,
        tfo: t.tfo,
        skip_cert_verify: t.skip_cert_verify,
        ..CommonProxyOptions::new(node.name.clone(), node.server.clone(), node.port)
    }
}

fn user_pass(credentials: &Credentials) -> (Option<String>, Option<String>) {
    match credentials {
        Credentials::UserPass { username, password } => (
            Some(username.clone()).filter(|s| !s.is_empty()),
            Some(password.clone()).filter(|s| !s.is_empty()),
        ),
        _ => (None, None),
    }
}

fn secret(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Cipher { password, .. }
        | Credentials::Password { password }
        | Credentials::UuidPassword { password, .. }
        | Credentials::UserPass { password, .. } => password.clone(),
        Credentials::Psk { psk } => psk.clone(),
        Credentials::AuthToken { token } => token.clone().unwrap_or_default(),
        Credentials::Uuid { uuid, .. } => uuid.clone(),
        Credentials::Anonymous => String::new(),
    }
}

fn cipher_of(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Cipher { cipher, .. } => cipher.clone(),
        Credentials::Uuid { cipher, .. } => cipher.clone().unwrap_or_else(|| "auto".to_string()),
        _ => String::new(),
    }
}

fn uuid_of(credentials: &Credentials) -> String {
    match credentials {
        Credentials::Uuid { uuid, .. } | Credentials::UuidPassword { uuid, .. } => uuid.clone(),
        _ => String::new(),
    }
}

impl TryFrom<&NodeRecord> for ClashProxy {
    type Error = RenderError;

    fn try_from(node: &NodeRecord) -> Result<Self, Self::Error> {
        let t = &node.transport;
        let mut common = common_options(node);

        let proxy = match node.protocol {
            ProxyType::Shadowsocks => {
                let (plugin, plugin_opts) = clash_plugin(t);
                ClashProxy::Shadowsocks {
                    common,
                    cipher: cipher_of(&node.credentials),
                    password: secret(&node.credentials),
                    plugin,
                    plugin_opts,
                }
            }
            ProxyType::ShadowsocksR => ClashProxy::ShadowsocksR {
                common,
                cipher: cipher_of(&node.credentials),
                password: secret(&node.credentials),
                protocol: t.protocol.clone().unwrap_or_else(|| "origin".to_string()),
                obfs: t.obfs.clone().unwrap_or_else(|| "plain".to_string()),
                protocol_param: t.protocol_param.clone(),
                obfs_param: t.obfs_param.clone(),
            },
            ProxyType::VMess => {
                let alter_id = match &node.credentials {
                    Credentials::Uuid { alter_id, .. } => alter_id.unwrap_or(0),
                    _ => 0,
                };
                common.tls = t.tls.then_some(true);
                ClashProxy::VMess {
                    common,
                    uuid: uuid_of(&node.credentials),
                    alter_id,
                    cipher: cipher_of(&node.credentials),
                    network: network(t),
                    ws_opts: ws_opts(t),
                    grpc_opts: grpc_opts(t),
                    servername: t.sni.clone().or_else(|| t.tls.then(|| t.host.clone()).flatten()),
                }
            }
            ProxyType::Vless => {
                common.tls = Some(t.tls);
                ClashProxy::Vless {
                    common,
                    uuid: uuid_of(&node.credentials),
                    flow: t.flow.clone(),
                    network: network(t),
                    ws_opts: ws_opts(t),
                    grpc_opts: grpc_opts(t),
                    servername: t.sni.clone(),
                    alpn: t.alpn.clone(),
                }
            }
            ProxyType::Trojan => {
                common.sni = t.sni.clone();
                ClashProxy::Trojan {
                    common,
                    password: secret(&node.credentials),
                    network: network(t),
                    ws_opts: ws_opts(t),
                    grpc_opts: grpc_opts(t),
                    alpn: t.alpn.clone(),
                }
            }
            ProxyType::HTTP | ProxyType::HTTPS => {
                let (username, password) = user_pass(&node.credentials);
                common.tls = t.tls.then_some(true);
                ClashProxy::Http {
                    common,
                    username,
                    password,
                }
            }
            ProxyType::Socks5 => {
                let (username, password) = user_pass(&node.credentials);
                ClashProxy::Socks5 {
                    common,
                    username,
                    password,
                }
            }
            ProxyType::Snell => {
                let obfs_opts = t.obfs.as_ref().map(|mode| {
                    let mut opts = Mapping::new();
                    opts.insert(key("mode"), key(mode));
                    if let Some(host) = t.obfs_param.as_deref().filter(|h| !h.is_empty()) {
                        opts.insert(key("host"), key(host));
                    }
                    opts
                });
                ClashProxy::Snell {
                    common,
                    psk: secret(&node.credentials),
                    version: t.snell_version,
                    obfs_opts,
                }
            }
            ProxyType::Hysteria => {
                common.sni = t.sni.clone();
                ClashProxy::Hysteria {
                    common,
                    protocol: t.protocol.clone(),
                    up: t.up_mbps,
                    down: t.down_mbps,
                    auth_str: Some(secret(&node.credentials)),
                    obfs: t.obfs.clone(),
                    alpn: t.alpn.clone(),
                }
            }
            ProxyType::Tuic => {
                common.sni = t.sni.clone();
                ClashProxy::Tuic {
                    common,
                    uuid: uuid_of(&node.credentials),
                    password: secret(&node.credentials),
                    congestion_controller: t.congestion_control.clone(),
                    udp_relay_mode: t.udp_relay_mode.clone(),
                    disable_sni: t.disable_sni,
                    alpn: t.alpn.clone(),
                }
            }
            ProxyType::Unknown => return Err(RenderError::Unsupported(node.protocol)),
        };
        Ok(proxy)
    }
}

/// Render a record as one entry of the `proxies` sequence
pub fn render_proxy(node: &NodeRecord) -> Result<YamlValue, RenderError> {
    Ok(ClashProxy::try_from(node)?.to_yaml_value()?)
}
