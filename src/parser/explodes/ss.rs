use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::base64::base64_decode_lenient;
use crate::utils::url::url_decode;

use super::common::{raw_remark, split_host_port, RawLink};

/// Tries one way of reading `method:password`; `None` hands over to the next.
type CredentialDecoder = fn(&str) -> Option<(String, String)>;

/// Userinfo layouts accepted in front of `@host:port`, in order
const USERINFO_DECODERS: [CredentialDecoder; 2] = [decode_encoded_userinfo, decode_literal_userinfo];

fn split_method_password(s: &str) -> Option<(String, String)> {
    let (method, password) = s.split_once(':')?;
    if method.is_empty() || password.is_empty() {
        return None;
    }
    Some((method.to_string(), password.to_string()))
}

/// SIP002: Base64 of `method:password`
fn decode_encoded_userinfo(userinfo: &str) -> Option<(String, String)> {
    base64_decode_lenient(&url_decode(userinfo)).and_then(|s| split_method_password(&s))
}

/// Plain (possibly percent-encoded) `method:password`
fn decode_literal_userinfo(userinfo: &str) -> Option<(String, String)> {
    split_method_password(&url_decode(userinfo))
}

/// Split the `plugin` query value into plugin name and options
fn parse_plugin(query: &str) -> (Option<String>, Option<String>) {
    let Some(plugin) = url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "plugin")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
    else {
        return (None, None);
    };

    match plugin.split_once(';') {
        Some((name, opts)) => (Some(name.to_string()), Some(opts.to_string())),
        None => (Some(plugin), None),
    }
}

/// Parse a Shadowsocks link into a node record
///
/// Two layouts are accepted:
/// * `ss://base64(method:password)@server:port` (SIP002), where the userinfo
///   may also be a literal `method:password`;
/// * `ss://base64(method:password@server:port)` (legacy).
pub fn explode_ss(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let content = link.body.replace("/?", "?");
    let (main, query) = match content.split_once('?') {
        Some((main, query)) => (main, query),
        None => (content.as_str(), ""),
    };

    let ((method, password), (server, port)) = if let Some((userinfo, hostport)) = main.rsplit_once('@') {
        let credentials = USERINFO_DECODERS
            .iter()
            .find_map(|decode| decode(userinfo))
            .ok_or_else(|| {
                ParseErrorKind::MalformedCredentials(
                    "userinfo is neither base64 nor method:password".to_string(),
                )
            })?;
        (credentials, split_host_port(hostport)?)
    } else {
        let decoded = base64_decode_lenient(main.trim_end_matches('/')).ok_or_else(|| {
            ParseErrorKind::MalformedCredentials("link body is not base64".to_string())
        })?;
        let (secret, hostport) = decoded.rsplit_once('@').ok_or_else(|| {
            ParseErrorKind::MalformedCredentials("decoded body has no '@'".to_string())
        })?;
        let credentials = split_method_password(secret).ok_or_else(|| {
            ParseErrorKind::MalformedCredentials("expected method:password".to_string())
        })?;
        (credentials, split_host_port(hostport)?)
    };

    let (plugin, plugin_opts) = parse_plugin(query);

    Ok(NodeRecord::new(
        raw_remark(link, None),
        ProxyType::Shadowsocks,
        server,
        port,
        Credentials::Cipher {
            cipher: method,
            password,
        },
        TransportOptions {
            plugin,
            plugin_opts,
            ..Default::default()
        },
    ))
}
