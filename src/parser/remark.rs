//! Remark (display name) processing
//!
//! Node names end up as YAML scalars and as members of policy groups, so they
//! are decoded, stripped down to a safe alphabet, bounded in length and made
//! unique within one batch.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::{collapse_whitespace, truncate_chars, url::url_decode_repeated};

/// Name given to nodes whose remark is empty after cleaning
pub const UNNAMED: &str = "Unnamed";

/// Upper bound on percent-decoding passes applied to a remark
pub const MAX_DECODE_PASSES: usize = 3;

const BRACKET_CHARS: [char; 4] = ['(', ')', '（', '）'];

/// Letters and combining marks of any script, digits and `_-.`
const NAME_CHARS: &str = r"\p{L}\p{M}\p{N}_\-.";

/// Emoji variation selectors are marks but never part of a name
const EXCLUDED_MARKS: &str = r"\x{FE00}-\x{FE0F}";

/// Regex character class of the characters a node name may hold, plus `extra`
pub(crate) fn name_char_class(extra: &str) -> String {
    format!("[{}{}&&[^{}]]", NAME_CHARS, extra, EXCLUDED_MARKS)
}

lazy_static! {
    static ref BRACKET_PHRASE_REGEX: Regex = Regex::new(r"[（(]([^()（）]*)[)）]").unwrap();
    static ref STRICT_RUN_REGEX: Regex = Regex::new(&format!("{}+", name_char_class(""))).unwrap();
    static ref RELAXED_RUN_REGEX: Regex =
        Regex::new(&format!("{}+", name_char_class(r"\s:/\[\]()"))).unwrap();
}

/// How aggressively remarks are filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStrictness {
    /// Letters, marks, digits and `_-.` only, at most 24 characters
    #[default]
    Strict,
    /// Additionally whitespace, `:`, `/` and brackets, at most 50 characters
    Relaxed,
}

impl NameStrictness {
    pub fn max_len(self) -> usize {
        match self {
            NameStrictness::Strict => 24,
            NameStrictness::Relaxed => 50,
        }
    }

    /// Keep only the allowed characters of `name`
    fn filter(self, name: &str) -> String {
        let allowed = match self {
            NameStrictness::Strict => &*STRICT_RUN_REGEX,
            NameStrictness::Relaxed => &*RELAXED_RUN_REGEX,
        };
        allowed.find_iter(name).map(|m| m.as_str()).collect()
    }
}

/// Per-batch naming state
///
/// Dedup suffixes depend on the order names are seen in, so one context must
/// be fed the node list in line order.
#[derive(Debug, Clone, Default)]
pub struct BatchContext {
    strictness: NameStrictness,
    seen_names: HashSet<String>,
}

impl BatchContext {
    pub fn new(strictness: NameStrictness) -> Self {
        BatchContext {
            strictness,
            seen_names: HashSet::new(),
        }
    }

    pub fn seen_names(&self) -> &HashSet<String> {
        &self.seen_names
    }

    /// Clean `raw_name` and reserve a unique variant of it
    pub fn normalize_name(&mut self, raw_name: &str) -> String {
        normalize_name(raw_name, &mut self.seen_names, self.strictness)
    }
}

/// Prefer a bracketed sub-phrase when it is a real word, otherwise drop the
/// bracket characters and keep everything.
fn resolve_brackets(name: &str) -> String {
    let Some(captures) = BRACKET_PHRASE_REGEX.captures(name) else {
        return name.to_string();
    };

    let phrase = captures.get(1).map_or("", |m| m.as_str());
    if phrase.chars().count() > 2 && phrase.chars().all(char::is_alphabetic) {
        phrase.to_string()
    } else {
        name.chars().filter(|c| !BRACKET_CHARS.contains(c)).collect()
    }
}

/// Clean a remark without deduplicating it
///
/// Never fails; anything that cleans down to nothing becomes [`UNNAMED`].
pub fn clean_name(raw_name: &str, strictness: NameStrictness) -> String {
    let decoded = url_decode_repeated(raw_name.trim(), MAX_DECODE_PASSES);
    let resolved = resolve_brackets(&decoded);

    let filtered = strictness.filter(&resolved);
    let collapsed = collapse_whitespace(&filtered);
    let truncated = truncate_chars(&collapsed, strictness.max_len());
    let name = truncated.trim();

    if name.is_empty() {
        UNNAMED.to_string()
    } else {
        name.to_string()
    }
}

/// Clean a remark and make it unique against `seen_names`
///
/// Collisions get `_1`, `_2`, ... appended. The returned name is inserted
/// into `seen_names`.
pub fn normalize_name(
    raw_name: &str,
    seen_names: &mut HashSet<String>,
    strictness: NameStrictness,
) -> String {
    let base = clean_name(raw_name, strictness);

    let mut name = base.clone();
    let mut count = 1;
    while seen_names.contains(&name) {
        name = format!("{}_{}", base, count);
        count += 1;
    }

    seen_names.insert(name.clone());
    name
}
