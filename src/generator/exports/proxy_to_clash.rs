use std::collections::HashSet;

use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use serde_yaml::Sequence;

use crate::generator::yaml::clash::render_proxy;
use crate::models::{ConfigDocument, NodeRecord};
use crate::parser::remark::name_char_class;

lazy_static! {
    static ref NODE_NAME_REGEX: Regex = Regex::new(&format!("^{}+$", name_char_class(""))).unwrap();
}

/// Whether `name` may be written into the document as a proxy or group member
pub fn is_valid_name(name: &str) -> bool {
    NODE_NAME_REGEX.is_match(name)
}

/// How parsed records are combined with the proxies already in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// The node list is authoritative: `proxies` is rebuilt from it, so a node
    /// removed from the list disappears from the document.
    #[default]
    ReplaceAll,
}

/// What [`merge_proxies`] wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyMergeReport {
    pub injected: usize,
    pub skipped_invalid: usize,
    pub skipped_duplicate: usize,
    /// Names of the injected proxies, in order
    pub names: Vec<String>,
}

/// Write `records` into the document's proxy list
///
/// Records whose name is not a safe identifier, or repeats an earlier name,
/// are skipped and counted.
pub fn merge_proxies(
    document: &mut ConfigDocument,
    records: &[NodeRecord],
    policy: MergePolicy,
) -> ProxyMergeReport {
    let mut report = ProxyMergeReport::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut proxies = Sequence::with_capacity(records.len());

    for record in records {
        if !is_valid_name(&record.name) {
            warn!("Skipping node with unsafe name '{}'", record.name);
            report.skipped_invalid += 1;
            continue;
        }
        if !seen.insert(record.name.as_str()) {
            warn!("Skipping duplicate node name '{}'", record.name);
            report.skipped_duplicate += 1;
            continue;
        }

        match render_proxy(record) {
            Ok(value) => {
                proxies.push(value);
                report.names.push(record.name.clone());
                report.injected += 1;
            }
            Err(e) => {
                error!("Failed to render node '{}': {}", record.name, e);
                report.skipped_invalid += 1;
            }
        }
    }

    match policy {
        MergePolicy::ReplaceAll => {
            let previous = document.proxies().len();
            document.set_proxies(proxies);
            info!(
                "Replaced {} existing proxies with {} parsed nodes",
                previous, report.injected
            );
        }
    }

    report
}
