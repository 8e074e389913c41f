//! URL construction: template substitution and the search query contract.

use crate::error::BindError;
use crate::search::{FilterKind, SearchState};
use std::collections::BTreeMap;

/// A fully qualified URL plus whether a query string was started (the
/// pagination token appends with `&` vs `?`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuiltPath {
    pub url: String,
    pub has_query: bool,
}

/// Placeholder names referenced by a template, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('<') {
        let tail = &rest[open + 1..];
        match tail.find('>') {
            Some(close) => {
                names.push(tail[..close].to_string());
                rest = &tail[close + 1..];
            }
            None => break,
        }
    }
    names
}

/// Whether every placeholder in the template has a parameter. Operations
/// with unresolvable templates are skipped by the controller rather than
/// built.
pub fn resolvable(template: &str, params: &BTreeMap<String, String>) -> bool {
    placeholders(template)
        .iter()
        .all(|name| params.contains_key(name))
}

/// Substitute every `<name>` placeholder and append the search query
/// string. Bucket key order is a wire contract: `se`, `sl`, `sil`, `oa`,
/// `od`, comma-joined values, `?` for the first parameter then `&`.
pub fn build(
    base_url: &str,
    template: &str,
    params: &BTreeMap<String, String>,
    search: Option<&SearchState>,
) -> Result<BuiltPath, BindError> {
    let mut path = template.strip_suffix('/').unwrap_or(template).to_string();

    for (name, value) in params {
        path = path.replace(&format!("<{}>", name), value);
    }
    if let Some(leftover) = placeholders(&path).into_iter().next() {
        return Err(BindError::UnresolvedPathParam(leftover));
    }

    let mut has_query = false;
    if let Some(search) = search {
        for (key, entries) in partition(search) {
            if entries.is_empty() {
                continue;
            }
            path.push(if has_query { '&' } else { '?' });
            has_query = true;
            path.push_str(key);
            path.push('=');
            path.push_str(&entries.join(","));
        }
    }

    Ok(BuiltPath {
        url: format!("{}{}", base_url, path),
        has_query,
    })
}

/// Partition tracked criteria into the five query buckets. Filter buckets
/// take `field:value` entries and require a non-empty value, a matching
/// filter mode, and the capability for that mode; sort buckets take bare
/// field names where the order holder is explicitly set.
fn partition(search: &SearchState) -> [(&'static str, Vec<String>); 5] {
    let mut eq = Vec::new();
    let mut like = Vec::new();
    let mut i_like = Vec::new();
    let mut asc = Vec::new();
    let mut desc = Vec::new();

    for criterion in search.criteria() {
        if !criterion.value.is_empty() {
            let entry = format!("{}:{}", criterion.field, criterion.value);
            match criterion.filter {
                Some(FilterKind::Equivalent) if criterion.caps.enable_equivalent => eq.push(entry),
                Some(FilterKind::Like) if criterion.caps.enable_like => like.push(entry),
                Some(FilterKind::ILike) if criterion.caps.enable_i_like => i_like.push(entry),
                _ => {}
            }
        }
        match criterion.order {
            Some(true) if criterion.caps.order_asc => asc.push(criterion.field.clone()),
            Some(false) if criterion.caps.order_desc => desc.push(criterion.field.clone()),
            _ => {}
        }
    }

    [
        ("se", eq),
        ("sl", like),
        ("sil", i_like),
        ("oa", asc),
        ("od", desc),
    ]
}
