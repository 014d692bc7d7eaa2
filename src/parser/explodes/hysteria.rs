use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::is_truthy;

use super::common::{alpn_list, host_port, param, query_map, raw_remark, RawLink};

const DEFAULT_PORT: u16 = 443;
const DEFAULT_UP_MBPS: u32 = 10;
const DEFAULT_DOWN_MBPS: u32 = 50;

fn mbps(value: Option<String>, default: u32) -> Result<u32, ParseErrorKind> {
    match value {
        // "100 Mbps" and "100" are both seen in the wild
        Some(v) => v
            .trim()
            .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace())
            .parse()
            .map_err(|_| ParseErrorKind::MalformedCredentials(format!("bandwidth: {}", v))),
        None => Ok(default),
    }
}

/// Parse a Hysteria (v1) link into a node record
///
/// Format: `hysteria://server:port?protocol=udp&auth=...&peer=...&upmbps=10&downmbps=50#name`
pub fn explode_hysteria(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let url = link.to_url()?;
    let (server, port) = host_port(&url, Some(DEFAULT_PORT))?;
    let params = query_map(&url);

    let token = param(&params, &["auth", "auth_str"]);

    Ok(NodeRecord::new(
        raw_remark(link, None),
        ProxyType::Hysteria,
        server,
        port,
        Credentials::AuthToken { token },
        TransportOptions {
            protocol: Some(param(&params, &["protocol"]).unwrap_or_else(|| "udp".to_string())),
            up_mbps: Some(mbps(param(&params, &["upmbps", "up"]), DEFAULT_UP_MBPS)?),
            down_mbps: Some(mbps(param(&params, &["downmbps", "down"]), DEFAULT_DOWN_MBPS)?),
            sni: param(&params, &["peer", "sni"]),
            skip_cert_verify: param(&params, &["insecure"]).map(|v| is_truthy(&v)),
            alpn: alpn_list(param(&params, &["alpn"])),
            obfs: param(&params, &["obfs"]),
            tls: true,
            ..Default::default()
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::explodes::common::explode;
    use crate::parser::remark::{BatchContext, NameStrictness};

    fn parse(line: &str) -> Result<NodeRecord, ParseErrorKind> {
        explode(line, &mut BatchContext::new(NameStrictness::Strict))
    }

    #[test]
    fn test_explode_hysteria() {
        let node = parse("hysteria://hy.example.com:36712?protocol=faketcp&auth=tok&peer=sni.example.com&insecure=1&upmbps=20&downmbps=100&alpn=hysteria&obfs=xplus#HY").unwrap();

        assert_eq!(node.protocol, ProxyType::Hysteria);
        assert_eq!(node.port, 36712);
        assert_eq!(
            node.credentials,
            Credentials::AuthToken {
                token: Some("tok".to_string())
            }
        );
        assert_eq!(node.transport.protocol.as_deref(), Some("faketcp"));
        assert_eq!(node.transport.up_mbps, Some(20));
        assert_eq!(node.transport.down_mbps, Some(100));
        assert_eq!(node.transport.sni.as_deref(), Some("sni.example.com"));
        assert_eq!(node.transport.skip_cert_verify, Some(true));
        assert_eq!(node.transport.alpn, vec!["hysteria"]);
        assert_eq!(node.transport.obfs.as_deref(), Some("xplus"));
    }

    #[test]
    fn test_explode_hysteria_defaults() {
        let node = parse("hysteria://hy.example.com?up=30%20Mbps").unwrap();
        assert_eq!(node.port, 443);
        assert_eq!(node.transport.protocol.as_deref(), Some("udp"));
        assert_eq!(node.transport.up_mbps, Some(30));
        assert_eq!(node.transport.down_mbps, Some(50));
        assert_eq!(node.credentials, Credentials::AuthToken { token: None });
    }
}
