//! Validator: check every note's frontmatter and filename against the rule
//! set, accumulating problems instead of failing fast.
//!
//! The validator never mutates anything; normalization is the organizer's
//! job.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::KbError;
use crate::frontmatter::read_doc;
use crate::id::is_valid_id;
use crate::notes::iter_note_paths;
use crate::repo::Repo;
use crate::timeutil::parse_iso;

const SLUG_PATTERN: &str = "[a-z0-9]+(?:-[a-z0-9]+)*";

static KEBAB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{SLUG_PATTERN}$")).expect("kebab pattern compiles"));

pub fn is_kebab_case(value: &str) -> bool {
    KEBAB_RE.is_match(value)
}

/// Whether `name` matches the naming template with `{id}` substituted
/// literally and `{slug}` substituted with the kebab-case pattern.
pub fn filename_matches_template(name: &str, note_id: &str, template: &str) -> bool {
    let pattern = regex::escape(template)
        .replace(&regex::escape("{id}"), &regex::escape(note_id))
        .replace(&regex::escape("{slug}"), SLUG_PATTERN);
    match Regex::new(&format!("^{pattern}$")) {
        Ok(re) => re.is_match(name),
        Err(_) => false,
    }
}

/// Validate every note under the configured directories.
///
/// Returns one human-readable problem string per violated rule, each
/// prefixed with the repo-relative path. An empty result means the
/// repository is clean. Rule-set shape errors are fatal.
pub fn lint_repo(repo: &Repo) -> Result<Vec<String>, KbError> {
    let rules = &repo.rules;
    let required = &rules.frontmatter.required;
    let allowed_kinds: BTreeSet<&str> = rules.kinds.iter().map(String::as_str).collect();
    let allowed_domains: BTreeSet<&str> = rules.domains.iter().map(String::as_str).collect();
    let allowed_scopes: BTreeSet<String> = rules.scope_values()?.into_iter().collect();
    let allowed_created_os: BTreeSet<String> = rules.created_os_values()?.into_iter().collect();
    let template = &rules.naming.file_template;

    let mut problems = Vec::new();

    for path in iter_note_paths(&repo.root, &rules.note_dirs) {
        let rel = display_rel(&path, &repo.root);
        let doc = match read_doc(&path) {
            Ok(doc) => doc,
            Err(err) => {
                problems.push(format!("{rel}: {err}"));
                continue;
            }
        };
        let meta = &doc.meta;

        for field in required {
            if meta.field_is_blank(field) {
                problems.push(format!("{rel}: missing required field: {field}"));
            }
        }

        let note_id = meta
            .id
            .as_deref()
            .unwrap_or("")
            .to_ascii_uppercase();
        if !note_id.is_empty() {
            if !is_valid_id(&note_id) {
                problems.push(format!(
                    "{rel}: invalid id (expected ULID): {}",
                    meta.id.as_deref().unwrap_or("")
                ));
            }
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if !filename_matches_template(name, &note_id, template) {
                problems.push(format!(
                    "{rel}: filename does not match template '{template}' for id '{note_id}' (got: {name})"
                ));
            }
        }

        let kind = meta.kind.as_deref().unwrap_or("");
        if !kind.is_empty() && !allowed_kinds.contains(kind) {
            problems.push(format!("{rel}: invalid kind: {kind}"));
        }

        let domain = meta.domain.as_deref().unwrap_or("");
        if !domain.is_empty() && !allowed_domains.contains(domain) {
            problems.push(format!("{rel}: invalid domain: {domain}"));
        }

        if let Some(scope) = meta.scope.as_deref() {
            if scope.trim().is_empty() {
                problems.push(format!("{rel}: scope must be a non-empty string"));
            } else {
                let normalized = scope.trim().to_lowercase();
                if !allowed_scopes.contains(&normalized) {
                    problems.push(format!(
                        "{rel}: invalid scope: {scope} (allowed: {allowed_scopes:?})"
                    ));
                }
            }
        }

        if let Some(created_by) = meta.created_by.as_deref() {
            if created_by.trim().is_empty() {
                problems.push(format!("{rel}: created_by must be a non-empty string"));
            }
        }

        if let Some(created_os) = meta.created_os.as_deref() {
            if created_os.trim().is_empty() {
                problems.push(format!("{rel}: created_os must be a non-empty string"));
            } else {
                let normalized = crate::hostenv::normalize_os_name(created_os);
                if !allowed_created_os.contains(&normalized) {
                    problems.push(format!(
                        "{rel}: invalid created_os: {created_os} (allowed: {allowed_created_os:?})"
                    ));
                }
            }
        }

        for (field, value) in [("created", &meta.created), ("updated", &meta.updated)] {
            if let Some(value) = value.as_deref() {
                if !value.trim().is_empty() && parse_iso(value).is_none() {
                    problems.push(format!("{rel}: invalid {field}: {value}"));
                }
            }
        }
        if let (Some(created), Some(updated)) = (meta.created.as_deref(), meta.updated.as_deref())
        {
            if let (Some(cdt), Some(udt)) = (parse_iso(created), parse_iso(updated)) {
                if udt < cdt {
                    problems.push(format!("{rel}: updated is before created"));
                }
            }
        }

        if let Some(tags) = meta.tags.as_ref() {
            for tag in tags {
                if !is_kebab_case(tag) {
                    problems.push(format!("{rel}: invalid tag: {tag}"));
                }
            }
        }

        if let Some(related) = meta.related.as_ref() {
            for rid in related {
                if !is_valid_id(rid) {
                    problems.push(format!("{rel}: invalid related ULID: {rid}"));
                }
            }
        }
    }

    Ok(problems)
}

fn display_rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
