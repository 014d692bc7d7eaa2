use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};

use super::common::{host_port, raw_remark, userinfo, RawLink};

/// Parse an HTTP or HTTPS proxy link into a node record
///
/// Format: `http[s]://[user:pass@]server[:port]#name`. Ports default to 80
/// and 443; credentials are kept only when both halves are present.
pub fn explode_http(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let url = link.to_url()?;
    let (server, port) = host_port(&url, None)?;

    let (username, password) = userinfo(&url);
    let credentials = if !username.is_empty() && !password.is_empty() {
        Credentials::UserPass { username, password }
    } else {
        Credentials::Anonymous
    };

    let protocol = if link.scheme == "https" {
        ProxyType::HTTPS
    } else {
        ProxyType::HTTP
    };

    Ok(NodeRecord::new(
        raw_remark(link, None),
        protocol,
        server,
        port,
        credentials,
        TransportOptions {
            tls: protocol == ProxyType::HTTPS,
            ..Default::default()
        },
    ))
}
