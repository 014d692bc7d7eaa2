use serde_json::Value;

use crate::models::{Credentials, NodeRecord, ParseErrorKind, ProxyType, TransportOptions};
use crate::utils::base64::base64_decode_lenient;

use super::common::{raw_remark, RawLink};

/// A JSON field that some clients write as a number and others as a string
fn json_u64(json: &Value, key: &str) -> Option<Result<u64, String>> {
    match &json[key] {
        Value::Number(n) => Some(n.as_u64().ok_or_else(|| n.to_string())),
        Value::String(s) if !s.trim().is_empty() => {
            Some(s.trim().parse::<u64>().map_err(|_| s.clone()))
        }
        _ => None,
    }
}

/// Non-empty string field; `none` counts as empty
fn json_str(json: &Value, key: &str) -> Option<String> {
    json[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .map(str::to_string)
}

/// Parse a VMess link into a node record
///
/// Format: `vmess://base64(json)` where the JSON object carries `add`,
/// `port`, `id`, optionally `aid`, `scy`, `net`, `path`, `host`, `tls`,
/// `sni` and the display name in `ps`.
pub fn explode_vmess(link: &RawLink) -> Result<NodeRecord, ParseErrorKind> {
    let decoded = base64_decode_lenient(link.body).ok_or_else(|| {
        ParseErrorKind::MalformedCredentials("vmess body is not base64".to_string())
    })?;

    let json: Value = serde_json::from_str(&decoded)
        .map_err(|e| ParseErrorKind::MalformedCredentials(format!("vmess json: {}", e)))?;
    if !json.is_object() {
        return Err(ParseErrorKind::MalformedCredentials(
            "vmess json is not an object".to_string(),
        ));
    }

    let server = json_str(&json, "add").ok_or(ParseErrorKind::MissingField("server"))?;
    let port = match json_u64(&json, "port") {
        None => return Err(ParseErrorKind::MissingField("port")),
        Some(Ok(p)) if (1..=u16::MAX as u64).contains(&p) => p as u16,
        Some(Ok(p)) => return Err(ParseErrorKind::InvalidEndpoint(format!("{}:{}", server, p))),
        Some(Err(raw)) => return Err(ParseErrorKind::InvalidEndpoint(format!("{}:{}", server, raw))),
    };
    let uuid = json_str(&json, "id").ok_or(ParseErrorKind::MissingField("id"))?;

    let alter_id = match json_u64(&json, "aid") {
        Some(Ok(aid)) => Some(u16::try_from(aid).map_err(|_| {
            ParseErrorKind::MalformedCredentials(format!("alterId out of range: {}", aid))
        })?),
        Some(Err(raw)) => {
            return Err(ParseErrorKind::MalformedCredentials(format!(
                "alterId is not a number: {}",
                raw
            )))
        }
        None => None,
    };

    let cipher = json_str(&json, "scy").unwrap_or_else(|| "auto".to_string());
    let tls = json["tls"]
        .as_str()
        .is_some_and(|t| t.eq_ignore_ascii_case("tls"));

    Ok(NodeRecord::new(
        raw_remark(link, json["ps"].as_str()),
        ProxyType::VMess,
        server,
        port,
        Credentials::Uuid {
            uuid,
            alter_id,
            cipher: Some(cipher),
        },
        TransportOptions {
            network: json_str(&json, "net"),
            path: json_str(&json, "path"),
            host: json_str(&json, "host"),
            tls,
            sni: json_str(&json, "sni"),
            ..Default::default()
        },
    ))
}
