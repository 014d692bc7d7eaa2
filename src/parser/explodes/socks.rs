use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::base64::base64_decode_text;
use crate::utils::is_truthy;

use super::common::{host_port, param, query_map, raw_remark, userinfo, RawLink};

const DEFAULT_PORT: u16 = 1080;

/// Userinfo halves may be Base64-wrapped; literals pass through unchanged
fn maybe_base64(raw: String) -> String {
    base64_decode_text(&raw).unwrap_or(raw)
}

/// Parse a SOCKS5 link into a node record
///
/// Accepts `socks://` and `socks5://`. The username may be Base64 of
/// `user:pass`, in which case it supplies both halves.
pub fn explode_socks(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let url = link.to_url()?;
    let (server, port) = host_port(&url, Some(DEFAULT_PORT))?;

    let (raw_user, raw_pass) = userinfo(&url);
    let mut username = maybe_base64(raw_user);
    let mut password = if raw_pass.is_empty() {
        raw_pass
    } else {
        maybe_base64(raw_pass)
    };
    if password.is_empty() {
        if let Some((user, pass)) = username.split_once(':') {
            (username, password) = (user.to_string(), pass.to_string());
        }
    }

    let credentials = if username.is_empty() {
        Credentials::Anonymous
    } else {
        Credentials::UserPass { username, password }
    };

    let params = query_map(&url);

    Ok(NodeRecord::new(
        raw_remark(link, param(&params, &["remarks"]).as_deref()),
        ProxyType::Socks5,
        server,
        port,
        credentials,
        TransportOptions {
            udp: param(&params, &["udp"]).map(|v| is_truthy(&v)),
            tfo: param(&params, &["tfo"]).map(|v| is_truthy(&v)),
            timeout: param(&params, &["timeout"]).and_then(|v| v.parse().ok()),
            ..Default::default()
        },
    ))
}
