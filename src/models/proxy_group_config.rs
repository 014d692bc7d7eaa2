/// Type of proxy group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyGroupType {
    Select,
    URLTest,
    Fallback,
    LoadBalance,
    Relay,
    /// Anything the gateway accepts that this crate does not model
    Other(String),
}

impl From<&str> for ProxyGroupType {
    /// Parse the `type` value of a group entry
    fn from(s: &str) -> Self {
        match s {
            "select" => ProxyGroupType::Select,
            "url-test" => ProxyGroupType::URLTest,
            "fallback" => ProxyGroupType::Fallback,
            "load-balance" => ProxyGroupType::LoadBalance,
            "relay" => ProxyGroupType::Relay,
            other => ProxyGroupType::Other(other.to_string()),
        }
    }
}

impl ProxyGroupType {
    /// Get string representation of the proxy group type
    pub fn as_str(&self) -> &str {
        match self {
            ProxyGroupType::Select => "select",
            ProxyGroupType::URLTest => "url-test",
            ProxyGroupType::LoadBalance => "load-balance",
            ProxyGroupType::Fallback => "fallback",
            ProxyGroupType::Relay => "relay",
            ProxyGroupType::Other(s) => s,
        }
    }

    /// Whether nodes may be injected into groups of this type
    pub fn is_selectable(&self) -> bool {
        matches!(
            self,
            ProxyGroupType::Select
                | ProxyGroupType::URLTest
                | ProxyGroupType::Fallback
                | ProxyGroupType::LoadBalance
        )
    }
}

/// Group names never touched by injection
pub const RESERVED_GROUP_NAMES: [&str; 5] = ["DIRECT", "REJECT", "GLOBAL", "Proxy", "Final"];

/// Built-in policies kept at the head of a group when its members are replaced
pub const RETAINED_MEMBERS: [&str; 2] = ["REJECT", "DIRECT"];

/// A policy group as read from a configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyGroup {
    /// Name of the proxy group
    pub name: String,
    /// Type of the proxy group
    pub group_type: ProxyGroupType,
    /// Member names: proxies, other groups or built-in policies
    pub proxies: Vec<String>,
}

impl ProxyGroup {
    pub fn new(name: String, group_type: ProxyGroupType, proxies: Vec<String>) -> Self {
        Self {
            name,
            group_type,
            proxies,
        }
    }

    /// Whether the group lists itself as a member
    pub fn is_self_referencing(&self) -> bool {
        self.proxies.iter().any(|p| p == &self.name)
    }
}
