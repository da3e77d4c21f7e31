//! Tag parsing and ignore-list matching for the snapshot builder.
//!
//! The wildcard semantics are deliberately a *contains* match after the
//! trailing `*` is stripped, not a prefix match. Operators relying on
//! prefix matching will be surprised — this is documented, not fixed.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTags {
    pub group_include: Option<String>,
    pub group_exclude: Option<String>,
    pub ignore_vm: bool,
}

/// Parse a semicolon-separated Proxmox tag string into the `plb_*`
/// vocabulary. Unknown `plb_*` tags, and any non-`plb_` tag, are ignored.
/// Only the first `plb_include_`/`plb_exclude_` tag in the list is taken.
pub fn parse_tags(raw: &str) -> ParsedTags {
    let mut parsed = ParsedTags::default();
    for tag in raw.split(';').map(str::trim).filter(|t| !t.is_empty()) {
        if tag.starts_with("plb_ignore_vm") {
            parsed.ignore_vm = true;
        } else if let Some(group) = tag.strip_prefix("plb_include_") {
            if parsed.group_include.is_none() {
                parsed.group_include = Some(group.to_string());
            }
        } else if let Some(group) = tag.strip_prefix("plb_exclude_") {
            if parsed.group_exclude.is_none() {
                parsed.group_exclude = Some(group.to_string());
            }
        }
    }
    parsed
}

/// Whether `name` is matched by any entry of an ignore list: a literal
/// match, or a `prefix*` wildcard whose `prefix` appears anywhere in
/// `name` (substring, not prefix-only).
pub fn name_ignored(name: &str, ignore_list: &[String]) -> bool {
    ignore_list.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => name.contains(prefix),
        None => name == pattern,
    })
}
