use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::is_truthy;

use super::common::{alpn_list, host_port, param, query_map, raw_remark, userinfo, RawLink};

/// Parse a Trojan link into a node record
///
/// Format: `trojan://password@server:port?sni=...&allowInsecure=1#name`.
/// Trojan always runs over TLS.
pub fn explode_trojan(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let url = link.to_url()?;
    let (server, port) = host_port(&url, None)?;

    let (password, _) = userinfo(&url);
    if password.is_empty() {
        return Err(ParseErrorKind::MissingField("password"));
    }

    let params = query_map(&url);

    Ok(NodeRecord::new(
        raw_remark(link, None),
        ProxyType::Trojan,
        server,
        port,
        Credentials::Password { password },
        TransportOptions {
            network: param(&params, &["type"]),
            path: param(&params, &["path", "serviceName"]),
            host: param(&params, &["host"]),
            tls: true,
            sni: param(&params, &["sni", "peer"]),
            alpn: alpn_list(param(&params, &["alpn"])),
            skip_cert_verify: param(&params, &["allowInsecure"]).map(|v| is_truthy(&v)),
            tfo: param(&params, &["tfo"]).map(|v| is_truthy(&v)),
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
    fn test_explode_trojan() {
        let node = parse("trojan://p%40ss@t.example.com:443?peer=sni.example.com&allowInsecure=1&alpn=h2#SG%2001").unwrap();

        assert_eq!(node.protocol, ProxyType::Trojan);
        assert_eq!(node.server, "t.example.com");
        assert_eq!(node.port, 443);
        assert_eq!(node.name, "SG01");
        assert_eq!(
            node.credentials,
            Credentials::Password {
                password: "p@ss".to_string()
            }
        );
        assert!(node.transport.tls);
        assert_eq!(node.transport.sni.as_deref(), Some("sni.example.com"));
        assert_eq!(node.transport.skip_cert_verify, Some(true));
        assert_eq!(node.transport.alpn, vec!["h2"]);
    }

    #[test]
    fn test_explode_trojan_missing_password() {
        assert_eq!(
            parse("trojan://@t.example.com:443").unwrap_err(),
            ParseErrorKind::MissingField("password")
        );
    }

    #[test]
    fn test_explode_trojan_port_zero() {
        assert!(matches!(
            parse("trojan://pw@t.example.com:0").unwrap_err(),
            ParseErrorKind::InvalidEndpoint(_)
        ));
    }
}
