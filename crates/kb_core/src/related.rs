//! Derived related-links section: a machine-owned block in the note body,
//! bounded by sentinel marker lines, listing links resolved from the
//! `related` frontmatter field.
//!
//! Content between the markers is fully replaceable and must never be
//! hand-edited.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::KbError;
use crate::frontmatter::NoteMeta;
use crate::id::is_valid_id;

pub const AUTO_RELATED_START: &str = "<!-- kb:auto-related-links:start -->";
pub const AUTO_RELATED_END: &str = "<!-- kb:auto-related-links:end -->";

const RELATED_HEADING: &str = "## 関連ノート";

/// A resolvable link target, keyed in the note index by uppercased id.
#[derive(Debug, Clone)]
pub struct LinkTarget {
    pub stem: String,
    pub label: String,
}

/// The de-duplicated, order-preserving list of syntactically valid related
/// ids, uppercased. Invalid and duplicate entries are dropped; lint is the
/// reporting surface for those, so the drops only show up at debug level.
pub fn extract_related_ids(meta: &NoteMeta) -> Vec<String> {
    let Some(raw) = meta.related.as_ref() else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for value in raw {
        let rid = value.trim().to_ascii_uppercase();
        if !is_valid_id(&rid) {
            log::debug!("dropping invalid related id: {value}");
            continue;
        }
        if !seen.insert(rid.clone()) {
            log::debug!("dropping duplicate related id: {rid}");
            continue;
        }
        out.push(rid);
    }
    out
}

/// The display label for a link: title, else summary, else the filename
/// stem; `|` would break the wiki-link syntax so it becomes ` / `, and
/// whitespace is collapsed.
pub fn note_link_label(meta: &NoteMeta, fallback: &str) -> String {
    let text = meta
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| {
            meta.summary
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(fallback);
    text.replace('|', " / ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the block for `ids`, or `None` when there is nothing to link.
/// Unresolved ids get a `[missing]` placeholder line instead of a link.
pub fn build_related_block(
    ids: &[String],
    index: &BTreeMap<String, LinkTarget>,
) -> Option<String> {
    if ids.is_empty() {
        return None;
    }
    let mut lines = vec![AUTO_RELATED_START.to_string(), RELATED_HEADING.to_string()];
    for rid in ids {
        match index.get(rid) {
            Some(target) => lines.push(format!("- [[{}|{}]]", target.stem, target.label)),
            None => lines.push(format!("- [missing] {rid}")),
        }
    }
    lines.push(AUTO_RELATED_END.to_string());
    Some(lines.join("\n"))
}

/// Replace (or remove, for `None`) the auto-generated block in `body`.
///
/// Explicit two-pass scan: locate the start sentinel line, then the end
/// sentinel after it, and splice the region out before appending the new
/// block after a blank line. Idempotent for an unchanged block. A body with
/// more than one start sentinel, or a start without an end, is ambiguous
/// and fails rather than being rewritten silently.
pub fn replace_related_block(body: &str, block: Option<&str>) -> Result<String, KbError> {
    let cleaned = strip_related_block(body)?;
    match block {
        None => Ok(cleaned),
        Some(block) if cleaned.is_empty() => Ok(block.to_string()),
        Some(block) => Ok(format!("{cleaned}\n\n{block}")),
    }
}

fn strip_related_block(body: &str) -> Result<String, KbError> {
    let lines: Vec<&str> = body.split('\n').collect();
    let mut starts = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.trim_end() == AUTO_RELATED_START)
        .map(|(i, _)| i);

    let Some(start) = starts.next() else {
        return Ok(trim_newlines(body).to_string());
    };
    if starts.next().is_some() {
        return Err(KbError::Format(
            "multiple auto-related-links blocks".to_string(),
        ));
    }
    let end = lines
        .iter()
        .enumerate()
        .skip(start + 1)
        .find(|(_, line)| line.trim_end() == AUTO_RELATED_END)
        .map(|(i, _)| i)
        .ok_or_else(|| KbError::Format("auto-related-links block is not closed".to_string()))?;

    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
    kept.extend_from_slice(&lines[..start]);
    kept.extend_from_slice(&lines[end + 1..]);
    Ok(trim_newlines(&kept.join("\n")).to_string())
}

fn trim_newlines(text: &str) -> &str {
    text.trim_matches('\n')
}
