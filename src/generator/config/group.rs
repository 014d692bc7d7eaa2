//! Policy group membership
//!
//! Injects the freshly merged proxy names into the document's policy groups.
//! Each touched group is rebuilt from its retained built-in members
//! (`REJECT`, `DIRECT`) followed by the node names, so a node removed from
//! the list disappears from every group. No group may ever list itself.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde_yaml::Mapping;

use crate::generator::exports::proxy_to_clash::is_valid_name;
use crate::models::configs::{group_members, group_name, group_type, remove_group_member, set_group_members};
use crate::models::{ConfigDocument, ProxyGroupType, RESERVED_GROUP_NAMES, RETAINED_MEMBERS};

/// Which groups receive the node names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GroupSelection {
    /// Every selectable group that is not reserved
    #[default]
    AllGroups,
    /// Only the groups named `{prefix}1` ..= `{prefix}{count}`
    FixedTargets { prefix: String, count: usize },
}

impl GroupSelection {
    fn target_names(&self) -> Option<Vec<String>> {
        match self {
            GroupSelection::AllGroups => None,
            GroupSelection::FixedTargets { prefix, count } => {
                Some((1..=*count).map(|i| format!("{}{}", prefix, i)).collect())
            }
        }
    }
}

/// What [`merge_groups`] changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupMergeReport {
    /// Member references written into groups
    pub injected_total: usize,
    /// Of those, references the group did not have before
    pub newly_added: usize,
    pub groups_touched: usize,
    pub skipped_groups: usize,
    pub invalid_names: usize,
    pub self_references_removed: usize,
}

fn is_reserved(name: &str) -> bool {
    RESERVED_GROUP_NAMES.contains(&name)
}

/// Rebuild one group's members; returns false when nothing was written
fn inject_into_group(group: &mut Mapping, candidates: &[String], report: &mut GroupMergeReport) -> bool {
    let Some(own_name) = group_name(group).map(str::to_string) else {
        return false;
    };

    let previous = group_members(group);
    let mut members: Vec<String> = Vec::new();
    for retained in previous.iter().filter(|m| RETAINED_MEMBERS.contains(&m.as_str())) {
        if !members.contains(retained) {
            members.push(retained.clone());
        }
    }

    let injected: Vec<&String> = candidates
        .iter()
        .filter(|name| **name != own_name && !members.contains(name))
        .collect();
    if injected.is_empty() {
        info!("Group '{}' has no candidate nodes, left untouched", own_name);
        return false;
    }

    let previous: HashSet<&str> = previous.iter().map(String::as_str).collect();
    report.injected_total += injected.len();
    report.newly_added += injected
        .iter()
        .filter(|name| !previous.contains(name.as_str()))
        .count();
    report.groups_touched += 1;

    debug!("Group '{}' now holds {} nodes", own_name, injected.len());
    members.extend(injected.into_iter().cloned());
    set_group_members(group, members);
    true
}

/// Inject `names` into the document's policy groups
///
/// Afterwards every group in the document, touched or not, is stripped of
/// references to itself.
pub fn merge_groups(
    document: &mut ConfigDocument,
    names: &[String],
    selection: &GroupSelection,
) -> GroupMergeReport {
    let mut report = GroupMergeReport::default();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut candidates: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !is_valid_name(name) {
            warn!("Not injecting unsafe name '{}' into groups", name);
            report.invalid_names += 1;
        } else if seen.insert(name.as_str()) {
            candidates.push(name.clone());
        }
    }

    let Some(entries) = document.group_entries_mut() else {
        warn!("Configuration has no proxy groups to update");
        return report;
    };

    let mut targets = selection.target_names();
    for entry in entries.iter_mut() {
        let Some(group) = entry.as_mapping_mut() else {
            continue;
        };
        let Some(name) = group_name(group).map(str::to_string) else {
            continue;
        };

        let kind = ProxyGroupType::from(group_type(group));
        let selected = match targets.as_mut() {
            None => {
                if is_reserved(&name) {
                    debug!("Skipping reserved group '{}'", name);
                    false
                } else if !kind.is_selectable() {
                    debug!("Skipping group '{}' of type '{}'", name, kind.as_str());
                    false
                } else {
                    true
                }
            }
            Some(pending) => match pending.iter().position(|t| *t == name) {
                Some(index) => {
                    pending.remove(index);
                    true
                }
                None => false,
            },
        };

        if !selected || !inject_into_group(group, &candidates, &mut report) {
            report.skipped_groups += 1;
        }
    }

    if let Some(missing) = targets.filter(|t| !t.is_empty()) {
        warn!("Target groups not found: {}", missing.join(", "));
    }

    for entry in entries.iter_mut() {
        let Some(group) = entry.as_mapping_mut() else {
            continue;
        };
        let Some(name) = group_name(group).map(str::to_string) else {
            continue;
        };
        let removed = remove_group_member(group, &name);
        if removed > 0 {
            warn!("Removed {} self-reference(s) from group '{}'", removed, name);
            report.self_references_removed += removed;
        }
    }

    info!(
        "Group merge: {} references written ({} new) into {} groups, {} groups skipped",
        report.injected_total, report.newly_added, report.groups_touched, report.skipped_groups
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
proxy-groups:
  - name: Auto
    type: url-test
    proxies: [old, REJECT, DIRECT]
  - name: Manual
    type: select
    proxies: [Auto, DIRECT]
  - name: GLOBAL
    type: select
    proxies: [DIRECT]
  - name: Chain
    type: relay
    proxies: [old]
"#;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn members(doc: &ConfigDocument, group: &str) -> Vec<String> {
        doc.proxy_groups()
            .into_iter()
            .find(|g| g.name == group)
            .map(|g| g.proxies)
            .unwrap_or_default()
    }

    #[test]
    fn test_all_groups_retains_builtins_and_replaces_nodes() {
        let mut doc = ConfigDocument::parse(CONFIG).unwrap();
        let report = merge_groups(&mut doc, &names(&["A", "B"]), &GroupSelection::AllGroups);

        assert_eq!(members(&doc, "Auto"), vec!["REJECT", "DIRECT", "A", "B"]);
        assert_eq!(members(&doc, "Manual"), vec!["DIRECT", "A", "B"]);
        assert_eq!(members(&doc, "GLOBAL"), vec!["DIRECT"]);
        assert_eq!(members(&doc, "Chain"), vec!["old"]);

        assert_eq!(report.groups_touched, 2);
        assert_eq!(report.skipped_groups, 2);
        assert_eq!(report.injected_total, 4);
        assert_eq!(report.newly_added, 4);
    }

    #[test]
    fn test_group_never_receives_its_own_name() {
        let mut doc = ConfigDocument::parse(CONFIG).unwrap();
        merge_groups(&mut doc, &names(&["Auto", "A"]), &GroupSelection::AllGroups);

        assert_eq!(members(&doc, "Auto"), vec!["REJECT", "DIRECT", "A"]);
        for group in doc.proxy_groups() {
            assert!(!group.is_self_referencing(), "{} lists itself", group.name);
        }
    }

    #[test]
    fn test_existing_self_reference_removed_in_post_pass() {
        let mut doc = ConfigDocument::parse(
            "proxy-groups:\n  - {name: Chain, type: relay, proxies: [Chain, x]}\n",
        )
        .unwrap();
        let report = merge_groups(&mut doc, &names(&["A"]), &GroupSelection::AllGroups);

        assert_eq!(report.self_references_removed, 1);
        assert_eq!(members(&doc, "Chain"), vec!["x"]);
    }

    #[test]
    fn test_newly_added_counts_only_unseen_members() {
        let mut doc = ConfigDocument::parse(CONFIG).unwrap();
        merge_groups(&mut doc, &names(&["A", "B"]), &GroupSelection::AllGroups);
        let report = merge_groups(&mut doc, &names(&["B", "C"]), &GroupSelection::AllGroups);

        assert_eq!(report.injected_total, 4);
        assert_eq!(report.newly_added, 2);
        assert_eq!(members(&doc, "Manual"), vec!["DIRECT", "B", "C"]);
    }

    #[test]
    fn test_invalid_names_dropped() {
        let mut doc = ConfigDocument::parse(CONFIG).unwrap();
        let report = merge_groups(&mut doc, &names(&["ok", "not ok"]), &GroupSelection::AllGroups);

        assert_eq!(report.invalid_names, 1);
        assert_eq!(members(&doc, "Manual"), vec!["DIRECT", "ok"]);
    }

    #[test]
    fn test_fixed_targets() {
        let mut doc = ConfigDocument::parse(
            r#"
proxy-groups:
  - {name: Pool1, type: select, proxies: [stale, DIRECT]}
  - {name: Other, type: select, proxies: [keep]}
"#,
        )
        .unwrap();
        let selection = GroupSelection::FixedTargets {
            prefix: "Pool".to_string(),
            count: 2,
        };
        let report = merge_groups(&mut doc, &names(&["A"]), &selection);

        assert_eq!(members(&doc, "Pool1"), vec!["DIRECT", "A"]);
        assert_eq!(members(&doc, "Other"), vec!["keep"]);
        assert_eq!(report.groups_touched, 1);
    }

    #[test]
    fn test_no_groups_is_not_an_error() {
        let mut doc = ConfigDocument::parse("proxies: []\n").unwrap();
        let report = merge_groups(&mut doc, &names(&["A"]), &GroupSelection::AllGroups);
        assert_eq!(report, GroupMergeReport::default());
    }
}
