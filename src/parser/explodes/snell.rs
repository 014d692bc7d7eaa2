use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};

use super::common::{host_port, param, query_map, raw_remark, userinfo, RawLink};

const DEFAULT_PORT: u16 = 443;
const DEFAULT_VERSION: u16 = 1;

/// Parse a Snell link into a node record
///
/// Format: `snell://psk@server:port?obfs=http&obfs-host=...&version=2#name`
pub fn explode_snell(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let url = link.to_url()?;
    let (server, port) = host_port(&url, Some(DEFAULT_PORT))?;

    let (psk, _) = userinfo(&url);
    if psk.is_empty() {
        return Err(ParseErrorKind::MissingField("psk"));
    }

    let params = query_map(&url);
    let version = match param(&params, &["version"]) {
        Some(v) => v
            .parse::<u16>()
            .map_err(|_| ParseErrorKind::MalformedCredentials(format!("snell version: {}", v)))?,
        None => DEFAULT_VERSION,
    };

    Ok(NodeRecord::new(
        raw_remark(link, None),
        ProxyType::Snell,
        server,
        port,
        Credentials::Psk { psk },
        TransportOptions {
            obfs: param(&params, &["obfs"]),
            obfs_param: param(&params, &["obfs-host", "host"]),
            snell_version: Some(version),
            ..Default::default()
        },
    ))
}
