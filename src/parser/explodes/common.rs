use std::collections::HashMap;

use url::{Host, Url};

use crate::models::{NodeRecord, ParseErrorKind, ProxyType};
use crate::parser::remark::{BatchContext, UNNAMED};
use crate::utils::url::url_decode;

/// A node link split into its scheme, body and display-name fragment
#[derive(Debug, Clone)]
pub struct RawLink<'a> {
    /// Lowercased scheme, without `://`
    pub scheme: String,
    /// Everything between `://` and the first `#`
    pub body: &'a str,
    /// Text after the first `#`, still percent-encoded
    pub fragment: Option<&'a str>,
}

impl<'a> RawLink<'a> {
    /// Split a trimmed line into scheme, body and fragment
    pub fn split(line: &'a str) -> Result<Self, ParseErrorKind> {
        let (scheme, rest) = line
            .split_once("://")
            .ok_or_else(|| ParseErrorKind::UnsupportedProtocol(scheme_hint(line)))?;

        let (body, fragment) = match rest.split_once('#') {
            Some((body, fragment)) => (body, Some(fragment).filter(|f| !f.is_empty())),
            None => (rest, None),
        };

        Ok(RawLink {
            scheme: scheme.to_ascii_lowercase(),
            body,
            fragment,
        })
    }

    /// Parse the body with the `url` crate, re-attaching the scheme
    pub fn to_url(&self) -> Result<Url, ParseErrorKind> {
        Url::parse(&format!("{}://{}", self.scheme, self.body))
            .map_err(|e| ParseErrorKind::InvalidEndpoint(e.to_string()))
    }
}

fn scheme_hint(line: &str) -> String {
    line.chars().take_while(|c| *c != ':').take(16).collect()
}

/// Map a link scheme onto the protocol it carries
pub fn proxy_type_from_scheme(scheme: &str) -> ProxyType {
    match scheme {
        "ss" => ProxyType::Shadowsocks,
        "ssr" => ProxyType::ShadowsocksR,
        "vmess" => ProxyType::VMess,
        "vless" => ProxyType::Vless,
        "trojan" => ProxyType::Trojan,
        "http" => ProxyType::HTTP,
        "https" => ProxyType::HTTPS,
        "socks" | "socks5" => ProxyType::Socks5,
        "snell" => ProxyType::Snell,
        "hysteria" => ProxyType::Hysteria,
        "tuic" => ProxyType::Tuic,
        _ => ProxyType::Unknown,
    }
}

/// Explode a proxy link into a node record
///
/// Detects the link type and calls the matching parser. On success the
/// display name is normalized against the batch context; failed lines never
/// reserve a name.
pub fn explode(line: &str, ctx: &mut BatchContext) -> Result<NodeRecord, ParseErrorKind> {
    let link = RawLink::split(line.trim())?;

    let record = match proxy_type_from_scheme(&link.scheme) {
        ProxyType::Shadowsocks => super::ss::explode_ss(&link),
        ProxyType::ShadowsocksR => super::ssr::explode_ssr(&link),
        ProxyType::VMess => super::vmess::explode_vmess(&link),
        ProxyType::Vless => super::vless::explode_vless(&link),
        ProxyType::Trojan => super::trojan::explode_trojan(&link),
        ProxyType::HTTP | ProxyType::HTTPS => super::http::explode_http(&link),
        ProxyType::Socks5 => super::socks::explode_socks(&link),
        ProxyType::Snell => super::snell::explode_snell(&link),
        ProxyType::Hysteria => super::hysteria::explode_hysteria(&link),
        ProxyType::Tuic => super::tuic::explode_tuic(&link),
        ProxyType::Unknown => Err(ParseErrorKind::UnsupportedProtocol(link.scheme.clone())),
    }?;

    let name = ctx.normalize_name(&record.name);
    Ok(NodeRecord { name, ..record })
}

/// Raw display name: the fragment if any, otherwise `fallback`, otherwise the
/// placeholder. Normalization happens later, in [`explode`].
pub fn raw_remark(link: &RawLink, fallback: Option<&str>) -> String {
    link.fragment
        .or(fallback.filter(|s| !s.trim().is_empty()))
        .unwrap_or(UNNAMED)
        .to_string()
}

/// Query parameters of a parsed link; later duplicates win
pub fn query_map(url: &Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// First non-empty value among `keys`
pub fn param(params: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| params.get(*k))
        .find(|v| !v.is_empty())
        .cloned()
}

/// Comma-separated ALPN list
pub fn alpn_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Host and port of a parsed link
///
/// `default_port` applies when the link has no explicit port and the scheme
/// has no well-known one.
pub fn host_port(url: &Url, default_port: Option<u16>) -> Result<(String, u16), ParseErrorKind> {
    let host = match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        _ => return Err(ParseErrorKind::MissingField("server")),
    };

    let port = url
        .port_or_known_default()
        .or(default_port)
        .ok_or(ParseErrorKind::MissingField("port"))?;
    if port == 0 {
        return Err(ParseErrorKind::InvalidEndpoint(format!("{}:0", host)));
    }

    Ok((host, port))
}

/// Percent-decoded username and password of a parsed link
pub fn userinfo(url: &Url) -> (String, String) {
    (
        url_decode(url.username()),
        url.password().map(url_decode).unwrap_or_default(),
    )
}

/// Split a bare `host:port`, tolerating a trailing `/` and IPv6 brackets
pub fn split_host_port(hostport: &str) -> Result<(String, u16), ParseErrorKind> {
    let hostport = hostport.trim().trim_end_matches('/');
    let (host, port) = hostport
        .rsplit_once(':')
        .ok_or_else(|| ParseErrorKind::InvalidEndpoint(hostport.to_string()))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ParseErrorKind::MissingField("server"));
    }

    match port.parse::<u16>() {
        Ok(p) if p != 0 => Ok((host.to_string(), p)),
        _ => Err(ParseErrorKind::InvalidEndpoint(hostport.to_string())),
    }
}
