//! Label whitelist handling.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

/// Maximum length of the name segment of a label key.
const MAX_LABEL_NAME_LENGTH: usize = 63;

/// Maximum length of the DNS subdomain prefix of a label key.
const MAX_LABEL_PREFIX_LENGTH: usize = 253;

/// Check if a string is a valid Kubernetes label key (`[prefix/]name`).
pub fn is_valid_label_key(key: &str) -> bool {
    // Pattern: ^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$
    static NAME_RE: LazyLock<Option<regex::Regex>> = LazyLock::new(|| {
        regex::Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$").ok()
    });
    // Pattern: ^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$
    static PREFIX_RE: LazyLock<Option<regex::Regex>> = LazyLock::new(|| {
        regex::Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .ok()
    });

    let (prefix, name) = match key.split_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if name.len() > MAX_LABEL_NAME_LENGTH || !NAME_RE.as_ref().is_some_and(|re| re.is_match(name))
    {
        return false;
    }

    match prefix {
        Some(prefix) => {
            prefix.len() <= MAX_LABEL_PREFIX_LENGTH
                && PREFIX_RE.as_ref().is_some_and(|re| re.is_match(prefix))
        }
        None => true,
    }
}

/// Remove duplicate keys, keeping the first occurrence of each.
pub fn dedup_whitelist(whitelist: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    whitelist
        .iter()
        .filter(|key| seen.insert(key.as_str()))
        .cloned()
        .collect()
}

/// Select the labels the reconciler may copy onto generated resources.
///
/// An empty whitelist propagates nothing.
pub fn filter_labels(
    whitelist: &[String],
    labels: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let allowed: HashSet<&str> = whitelist.iter().map(String::as_str).collect();
    labels
        .iter()
        .filter(|(key, _)| allowed.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
