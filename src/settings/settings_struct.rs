use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::config::group::GroupSelection;
use crate::parser::remark::NameStrictness;
use crate::utils::system::command_stdout;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported settings format: {0} (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(String),

    #[error("Could not determine the configuration path: {0}")]
    ConfigPathUnresolved(String),
}

fn default_nodes_path() -> String {
    "/root/OpenClashManage/wangluo/nodes.txt".to_string()
}

fn default_config_path_command() -> Vec<String> {
    ["uci", "get", "openclash.config.config_path"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_fingerprint_path() -> String {
    "/root/OpenClashManage/wangluo/nodes_content.md5".to_string()
}

fn default_lock_path() -> String {
    "/tmp/openclash_update.lock".to_string()
}

fn default_scratch_path() -> String {
    "/tmp/clash_verify_test.yaml".to_string()
}

fn default_settle_secs() -> u64 {
    8
}

fn default_error_marker() -> String {
    "Parse config error".to_string()
}

fn default_group_prefix() -> String {
    "Proxy-Group-".to_string()
}

fn default_group_count() -> usize {
    8
}

fn default_verify_command() -> Vec<String> {
    vec!["/etc/init.d/openclash".to_string(), "verify_config".to_string()]
}

fn default_restart_command() -> Vec<String> {
    vec!["/etc/init.d/openclash".to_string(), "restart".to_string()]
}

fn default_log_command() -> Vec<String> {
    vec!["logread".to_string()]
}

/// Which policy groups receive node names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Every selectable, non-reserved group
    #[default]
    All,
    /// Only `{group_prefix}1` ..= `{group_prefix}{group_count}`
    Fixed,
}

/// Settings structure to hold the reconciler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(default = "default_nodes_path")]
    pub nodes_path: String,
    /// Live configuration; resolved through `config_path_command` when unset
    pub config_path: Option<String>,
    #[serde(default = "default_config_path_command")]
    pub config_path_command: Vec<String>,
    #[serde(default = "default_fingerprint_path")]
    pub fingerprint_path: String,
    #[serde(default = "default_lock_path")]
    pub lock_path: String,
    #[serde(default = "default_scratch_path")]
    pub scratch_path: String,
    /// Defaults to `<config_path>.bak`
    pub backup_path: Option<String>,
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Log text that marks a failed gateway restart
    #[serde(default = "default_error_marker")]
    pub error_marker: String,
    pub name_strictness: NameStrictness,
    pub group_mode: GroupMode,
    #[serde(default = "default_group_prefix")]
    pub group_prefix: String,
    #[serde(default = "default_group_count")]
    pub group_count: usize,
    /// Verifier argv; the scratch path is appended
    #[serde(default = "default_verify_command")]
    pub verify_command: Vec<String>,
    #[serde(default = "default_restart_command")]
    pub restart_command: Vec<String>,
    #[serde(default = "default_log_command")]
    pub log_command: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            nodes_path: default_nodes_path(),
            config_path: None,
            config_path_command: default_config_path_command(),
            fingerprint_path: default_fingerprint_path(),
            lock_path: default_lock_path(),
            scratch_path: default_scratch_path(),
            backup_path: None,
            settle_secs: default_settle_secs(),
            error_marker: default_error_marker(),
            name_strictness: NameStrictness::default(),
            group_mode: GroupMode::default(),
            group_prefix: default_group_prefix(),
            group_count: default_group_count(),
            verify_command: default_verify_command(),
            restart_command: default_restart_command(),
            log_command: default_log_command(),
        }
    }
}

impl Settings {
    /// Parse settings text; `format` is a file extension
    pub fn from_str_with_format(content: &str, format: &str) -> Result<Self, SettingsError> {
        match format.to_ascii_lowercase().as_str() {
            "toml" => Ok(toml::from_str(content)?),
            "yaml" | "yml" => {
                if content.trim().is_empty() {
                    return Ok(Settings::default());
                }
                Ok(serde_yaml::from_str(content)?)
            }
            other => Err(SettingsError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Load settings from a TOML or YAML file, chosen by extension
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loading settings from {}", path.display());
        Self::from_str_with_format(&content, &format)
    }

    /// The live configuration path, asking the gateway when not configured
    pub fn resolve_config_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = self.config_path.as_deref().filter(|p| !p.trim().is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let output = command_stdout(&self.config_path_command).map_err(|e| {
            SettingsError::ConfigPathUnresolved(format!(
                "{}: {}",
                self.config_path_command.join(" "),
                e
            ))
        })?;
        let path = output.lines().next().unwrap_or_default().trim();
        if path.is_empty() {
            return Err(SettingsError::ConfigPathUnresolved(format!(
                "{} printed nothing",
                self.config_path_command.join(" ")
            )));
        }
        Ok(PathBuf::from(path))
    }

    /// Backup location for a given live configuration path
    pub fn backup_path_for(&self, config_path: &Path) -> PathBuf {
        match self.backup_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => {
                let mut name = config_path.as_os_str().to_os_string();
                name.push(".bak");
                PathBuf::from(name)
            }
        }
    }

    pub fn group_selection(&self) -> GroupSelection {
        match self.group_mode {
            GroupMode::All => GroupSelection::AllGroups,
            GroupMode::Fixed => GroupSelection::FixedTargets {
                prefix: self.group_prefix.clone(),
                count: self.group_count,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let settings = Settings::from_str_with_format("", "toml").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.settle_secs, 8);
        assert_eq!(settings.error_marker, "Parse config error");
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_str_with_format(
            "nodes_path = \"/data/nodes.txt\"\nname_strictness = \"relaxed\"\ngroup_mode = \"fixed\"\ngroup_count = 2\n",
            "toml",
        )
        .unwrap();
        assert_eq!(settings.nodes_path, "/data/nodes.txt");
        assert_eq!(settings.name_strictness, NameStrictness::Relaxed);
        assert_eq!(
            settings.group_selection(),
            GroupSelection::FixedTargets {
                prefix: "Proxy-Group-".to_string(),
                count: 2,
            }
        );
        assert_eq!(settings.lock_path, default_lock_path());
    }

    #[test]
    fn test_yaml_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "config_path: /etc/openclash/config.yaml\nsettle_secs: 0").unwrap();

        let settings = Settings::load_from_file(file.path()).unwrap();
        assert_eq!(settings.settle_secs, 0);
        assert_eq!(
            settings.resolve_config_path().unwrap(),
            PathBuf::from("/etc/openclash/config.yaml")
        );
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(matches!(
            Settings::from_str_with_format("", "ini"),
            Err(SettingsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_backup_path_defaults_next_to_config() {
        let settings = Settings::default();
        assert_eq!(
            settings.backup_path_for(Path::new("/etc/openclash/config.yaml")),
            PathBuf::from("/etc/openclash/config.yaml.bak")
        );
    }

    #[test]
    fn test_config_path_command_failure() {
        let settings = Settings {
            config_path_command: vec!["/nonexistent/uci".to_string()],
            ..Settings::default()
        };
        assert!(matches!(
            settings.resolve_config_path(),
            Err(SettingsError::ConfigPathUnresolved(_))
        ));
    }
}
