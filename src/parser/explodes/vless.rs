use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::is_truthy;

use super::common::{alpn_list, host_port, param, query_map, raw_remark, userinfo, RawLink};

/// Parse a VLESS link into a node record
///
/// Format: `vless://uuid@server:port?type=ws&security=tls&sni=...#name`
pub fn explode_vless(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let url = link.to_url()?;
    let (server, port) = host_port(&url, None)?;

    let (uuid, _) = userinfo(&url);
    if uuid.is_empty() {
        return Err(ParseErrorKind::MissingField("uuid"));
    }

    let params = query_map(&url);
    let tls = param(&params, &["security"])
        .is_some_and(|s| matches!(s.to_ascii_lowercase().as_str(), "tls" | "reality" | "xtls"));

    Ok(NodeRecord::new(
        raw_remark(link, None),
        ProxyType::Vless,
        server,
        port,
        Credentials::Uuid {
            uuid,
            alter_id: None,
            cipher: None,
        },
        TransportOptions {
            network: param(&params, &["type"]),
            path: param(&params, &["path", "serviceName"]),
            host: param(&params, &["host"]),
            tls,
            sni: param(&params, &["sni", "peer"]),
            alpn: alpn_list(param(&params, &["alpn"])),
            skip_cert_verify: param(&params, &["allowInsecure", "insecure"]).map(|v| is_truthy(&v)),
            flow: param(&params, &["flow"]),
            encryption: Some(param(&params, &["encryption"]).unwrap_or_else(|| "none".to_string())),
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
    fn test_explode_vless_reality() {
        let node = parse("vless://b831381d-6324-4d53-ad4f-8cda48b30811@v.example.com:443?type=tcp&security=reality&sni=www.example.com&flow=xtls-rprx-vision&alpn=h2,http/1.1#JP-02").unwrap();

        assert_eq!(node.protocol, ProxyType::Vless);
        assert_eq!(node.name, "JP-02");
        assert_eq!(node.server, "v.example.com");
        assert_eq!(node.port, 443);
        assert!(node.transport.tls);
        assert_eq!(node.transport.sni.as_deref(), Some("www.example.com"));
        assert_eq!(node.transport.flow.as_deref(), Some("xtls-rprx-vision"));
        assert_eq!(node.transport.encryption.as_deref(), Some("none"));
        assert_eq!(node.transport.alpn, vec!["h2", "http/1.1"]);
        assert_eq!(
            node.credentials,
            Credentials::Uuid {
                uuid: "b831381d-6324-4d53-ad4f-8cda48b30811".to_string(),
                alter_id: None,
                cipher: None,
            }
        );
    }

    #[test]
    fn test_explode_vless_ws_without_tls() {
        let node = parse("vless://id@10.0.0.1:8080?type=ws&path=%2Fws&host=cdn.example.com").unwrap();
        assert!(!node.transport.tls);
        assert_eq!(node.transport.network.as_deref(), Some("ws"));
        assert_eq!(node.transport.path.as_deref(), Some("/ws"));
        assert_eq!(node.transport.host.as_deref(), Some("cdn.example.com"));
        assert_eq!(node.name, "Unnamed");
    }

    #[test]
    fn test_explode_vless_requires_uuid_and_port() {
        assert_eq!(
            parse("vless://@h.example:443").unwrap_err(),
            ParseErrorKind::MissingField("uuid")
        );
        assert_eq!(
            parse("vless://id@h.example").unwrap_err(),
            ParseErrorKind::MissingField("port")
        );
    }
}
