//! The gateway configuration document being reconciled
//!
//! The document is kept as a `serde_yaml::Value` so that every key this crate
//! does not own (dns, rules, tun, ...) survives a load/save cycle untouched
//! and in its source order.

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Sequence, Value as YamlValue};
use thiserror::Error;

use super::proxy_group_config::{ProxyGroup, ProxyGroupType};

const PROXIES_KEY: &str = "proxies";
const GROUPS_KEY: &str = "proxy-groups";
const LEGACY_PROXIES_KEY: &str = "Proxy";
const LEGACY_GROUPS_KEY: &str = "Proxy Group";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration root is not a mapping")]
    NotMapping,
}

/// A loaded configuration document
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: YamlValue,
    /// Whether the document uses the pre-1.0 `Proxy` / `Proxy Group` keys
    legacy_fields: bool,
}

impl ConfigDocument {
    /// Parse a document from YAML text. An empty document is an empty mapping.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut root: YamlValue = serde_yaml::from_str(content)?;
        if root.is_null() {
            root = YamlValue::Mapping(Mapping::new());
        }
        let map = root.as_mapping().ok_or(ConfigError::NotMapping)?;

        let legacy_fields = !map.contains_key(PROXIES_KEY)
            && !map.contains_key(GROUPS_KEY)
            && (map.contains_key(LEGACY_PROXIES_KEY) || map.contains_key(LEGACY_GROUPS_KEY));

        Ok(ConfigDocument {
            root,
            legacy_fields,
        })
    }

    /// Load a document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Serialize the document to YAML text
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    /// Serialize the document and write it to `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_yaml_string()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn root(&self) -> &YamlValue {
        &self.root
    }

    pub fn uses_legacy_fields(&self) -> bool {
        self.legacy_fields
    }

    fn proxies_key(&self) -> &'static str {
        if self.legacy_fields {
            LEGACY_PROXIES_KEY
        } else {
            PROXIES_KEY
        }
    }

    fn groups_key(&self) -> &'static str {
        if self.legacy_fields {
            LEGACY_GROUPS_KEY
        } else {
            GROUPS_KEY
        }
    }

    fn root_map_mut(&mut self) -> &mut Mapping {
        if !self.root.is_mapping() {
            self.root = YamlValue::Mapping(Mapping::new());
        }
        match &mut self.root {
            YamlValue::Mapping(map) => map,
            _ => unreachable!("root was just made a mapping"),
        }
    }

    /// The proxy entries, empty when the key is missing or not a sequence
    pub fn proxies(&self) -> &[YamlValue] {
        match self.root.get(self.proxies_key()) {
            Some(YamlValue::Sequence(seq)) => seq,
            _ => &[],
        }
    }

    /// Names of the proxy entries, in order
    pub fn proxy_names(&self) -> Vec<String> {
        self.proxies()
            .iter()
            .filter_map(|p| p.get("name").and_then(YamlValue::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Replace the proxy entries
    pub fn set_proxies(&mut self, proxies: Sequence) {
        let key = YamlValue::String(self.proxies_key().to_string());
        self.root_map_mut().insert(key, YamlValue::Sequence(proxies));
    }

    /// Typed view of the policy groups; entries without a name are skipped
    pub fn proxy_groups(&self) -> Vec<ProxyGroup> {
        match self.root.get(self.groups_key()) {
            Some(YamlValue::Sequence(seq)) => seq
                .iter()
                .filter_map(YamlValue::as_mapping)
                .filter_map(|map| {
                    let name = group_name(map)?;
                    Some(ProxyGroup::new(
                        name.to_string(),
                        ProxyGroupType::from(group_type(map)),
                        group_members(map),
                    ))
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Raw group entries for in-place editing
    pub fn group_entries_mut(&mut self) -> Option<&mut Sequence> {
        let key = self.groups_key();
        match self.root.get_mut(key) {
            Some(YamlValue::Sequence(seq)) => Some(seq),
            _ => None,
        }
    }
}

/// `name` of a raw group entry
pub fn group_name(group: &Mapping) -> Option<&str> {
    group.get("name").and_then(YamlValue::as_str)
}

/// `type` of a raw group entry, empty when absent
pub fn group_type(group: &Mapping) -> &str {
    group.get("type").and_then(YamlValue::as_str).unwrap_or("")
}

/// String members of a raw group entry
pub fn group_members(group: &Mapping) -> Vec<String> {
    match group.get("proxies") {
        Some(YamlValue::Sequence(seq)) => seq
            .iter()
            .filter_map(YamlValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Overwrite the members of a raw group entry
pub fn set_group_members(group: &mut Mapping, members: Vec<String>) {
    let seq = members.into_iter().map(YamlValue::String).collect();
    group.insert(
        YamlValue::String("proxies".to_string()),
        YamlValue::Sequence(seq),
    );
}

/// Remove every member equal to `name`, returning how many were removed
pub fn remove_group_member(group: &mut Mapping, name: &str) -> usize {
    match group.get_mut("proxies") {
        Some(YamlValue::Sequence(seq)) => {
            let before = seq.len();
            seq.retain(|p| p.as_str() != Some(name));
            before - seq.len()
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
mixed-port: 7890
proxies:
  - name: old
    type: ss
    server: 1.1.1.1
    port: 1
proxy-groups:
  - name: Auto
    type: url-test
    url: http://www.gstatic.com/generate_204
    proxies: [old, DIRECT]
rules:
  - MATCH,Auto
"#;

    #[test]
    fn test_parse_and_views() {
        let doc = ConfigDocument::parse(BASE).unwrap();
        assert!(!doc.uses_legacy_fields());
        assert_eq!(doc.proxy_names(), vec!["old"]);

        let groups = doc.proxy_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Auto");
        assert_eq!(groups[0].group_type, ProxyGroupType::URLTest);
        assert_eq!(groups[0].proxies, vec!["old", "DIRECT"]);
    }

    #[test]
    fn test_unrelated_keys_survive_round_trip() {
        let mut doc = ConfigDocument::parse(BASE).unwrap();
        doc.set_proxies(Sequence::new());
        let text = doc.to_yaml_string().unwrap();
        let reparsed = ConfigDocument::parse(&text).unwrap();

        assert_eq!(reparsed.root().get("mixed-port"), Some(&YamlValue::from(7890)));
        assert!(reparsed.root().get("rules").is_some());
        assert!(reparsed.proxies().is_empty());
        assert_eq!(reparsed.proxy_groups()[0].proxies, vec!["old", "DIRECT"]);
    }

    #[test]
    fn test_empty_document_is_mapping() {
        let mut doc = ConfigDocument::parse("").unwrap();
        assert!(doc.proxies().is_empty());
        assert!(doc.proxy_groups().is_empty());
        doc.set_proxies(vec![YamlValue::from("x")]);
        assert_eq!(doc.proxies().len(), 1);
    }

    #[test]
    fn test_non_mapping_root_is_rejected() {
        assert!(matches!(
            ConfigDocument::parse("- a\n- b\n"),
            Err(ConfigError::NotMapping)
        ));
    }

    #[test]
    fn test_legacy_field_names() {
        let doc = ConfigDocument::parse(
            "Proxy:\n  - {name: a, type: http, server: h, port: 80}\nProxy Group:\n  - {name: G, type: select, proxies: [a]}\n",
        )
        .unwrap();
        assert!(doc.uses_legacy_fields());
        assert_eq!(doc.proxy_names(), vec!["a"]);
        assert_eq!(doc.proxy_groups()[0].name, "G");
    }

    #[test]
    fn test_remove_group_member() {
        let mut doc = ConfigDocument::parse(
            "proxy-groups:\n  - {name: G, type: select, proxies: [G, a, G]}\n",
        )
        .unwrap();
        let entry = doc.group_entries_mut().unwrap()[0].as_mapping_mut().unwrap();
        assert_eq!(remove_group_member(entry, "G"), 2);
        assert_eq!(group_members(entry), vec!["a"]);
    }
}
