use std::collections::HashMap;

use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::base64::base64_decode_lenient;

use super::common::{raw_remark, split_host_port, RawLink};

/// Parse a ShadowsocksR link into a node record
///
/// Format: `ssr://base64(server:port:protocol:method:obfs:base64(password)/?params)`
///
/// The five right-most colon fields are split off first so that an IPv6
/// server address keeps its colons.
pub fn explode_ssr(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let decoded = base64_decode_lenient(link.body).ok_or_else(|| {
        ParseErrorKind::MalformedCredentials("ssr body is not base64".to_string())
    })?;

    let (main, query) = decoded
        .split_once("/?")
        .ok_or(ParseErrorKind::MissingField("query"))?;

    let fields: Vec<&str> = main.rsplitn(6, ':').collect();
    let [password_encoded, obfs, method, protocol, port, server] = fields[..] else {
        return Err(ParseErrorKind::MalformedCredentials(
            "expected server:port:protocol:method:obfs:password".to_string(),
        ));
    };

    let (server, port) = split_host_port(&format!("{}:{}", server, port))?;

    let password = base64_decode_lenient(password_encoded).ok_or_else(|| {
        ParseErrorKind::MalformedCredentials("ssr password is not base64".to_string())
    })?;
    if method.is_empty() {
        return Err(ParseErrorKind::MissingField("method"));
    }

    let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let get = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

    let name = get("remarks").unwrap_or_else(|| raw_remark(link, None));

    Ok(NodeRecord::new(
        name,
        ProxyType::ShadowsocksR,
        server,
        port,
        Credentials::Cipher {
            cipher: method.to_string(),
            password,
        },
        TransportOptions {
            protocol: Some(protocol.to_string()).filter(|s| !s.is_empty()),
            protocol_param: get("protoparam"),
            obfs: Some(obfs.to_string()).filter(|s| !s.is_empty()),
            obfs_param: get("obfsparam"),
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
    fn test_explode_ssr_full() {
        // example.com:8388:auth_aes128_md5:aes-256-cfb:tls1.2_ticket_auth:c2VjcmV0/?obfsparam=...&protoparam=...&remarks=SSR%2520Node
        let node = parse("ssr://ZXhhbXBsZS5jb206ODM4ODphdXRoX2FlczEyOF9tZDU6YWVzLTI1Ni1jZmI6dGxzMS4yX3RpY2tldF9hdXRoOmMyVmpjbVYwLz9vYmZzcGFyYW09Y2RuLmV4YW1wbGUuY29tJnByb3RvcGFyYW09MzIlM0F1c2VyJnJlbWFya3M9U1NSJTI1MjBOb2Rl").unwrap();

        assert_eq!(node.protocol, ProxyType::ShadowsocksR);
        assert_eq!(node.server, "example.com");
        assert_eq!(node.port, 8388);
        assert_eq!(
            node.credentials,
            Credentials::Cipher {
                cipher: "aes-256-cfb".to_string(),
                password: "secret".to_string(),
            }
        );
        assert_eq!(node.transport.protocol.as_deref(), Some("auth_aes128_md5"));
        assert_eq!(node.transport.protocol_param.as_deref(), Some("32:user"));
        assert_eq!(node.transport.obfs.as_deref(), Some("tls1.2_ticket_auth"));
        assert_eq!(node.transport.obfs_param.as_deref(), Some("cdn.example.com"));
        assert_eq!(node.name, "SSRNode");
    }

    #[test]
    fn test_explode_ssr_ipv6_server_uses_fragment() {
        // 2001:db8::1:443:origin:aes-128-ctr:plain:c2VjcmV0/?remarks=
        let node = parse("ssr://MjAwMTpkYjg6OjE6NDQzOm9yaWdpbjphZXMtMTI4LWN0cjpwbGFpbjpjMlZqY21WMC8_cmVtYXJrcz0#v6").unwrap();
        assert_eq!(node.server, "2001:db8::1");
        assert_eq!(node.port, 443);
        assert_eq!(node.name, "v6");
    }

    #[test]
    fn test_explode_ssr_without_query() {
        let err = parse("ssr://ZXhhbXBsZS5jb206ODM4ODpvcmlnaW46YWVzLTEyOC1jdHI6cGxhaW46YzJWamNtVjA").unwrap_err();
        assert_eq!(err, ParseErrorKind::MissingField("query"));
    }

    #[test]
    fn test_explode_ssr_too_few_fields() {
        let err = parse("ssr://ZXhhbXBsZS5jb206ODM4ODpvcmlnaW46cGxhaW46YzJWamNtVjAvP3JlbWFya3M9eA").unwrap_err();
        assert!(matches!(err, ParseErrorKind::MalformedCredentials(_)));
    }
}
