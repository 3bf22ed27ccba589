//! Organizer: normalize frontmatter defaults, recompute the derived
//! related-links block, and relocate notes to their rule-prescribed
//! directory.
//!
//! The organizer is the only component licensed to mutate the note tree.
//! Notes missing the minimal preconditions (valid id, kind, domain) are
//! left untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::KbError;
use crate::frontmatter::{write_doc, Doc};
use crate::id::is_valid_id;
use crate::notes::{iter_note_paths, try_read_note, Note};
use crate::related::{
    build_related_block, extract_related_ids, note_link_label, replace_related_block, LinkTarget,
};
use crate::repo::Repo;
use crate::vcs::VersionControl;

pub struct OrganizeInput<'a> {
    pub repo: &'a Repo,
    pub vcs: &'a dyn VersionControl,
    /// Environment-detected authoring identity for notes missing
    /// `created_by`.
    pub default_created_by: String,
    /// Environment-detected OS tag for notes missing `created_os`.
    pub default_created_os: String,
    /// Stamp applied to `updated` whenever a document is rewritten.
    pub timestamp: String,
}

#[derive(Debug, Default)]
pub struct OrganizeOutcome {
    pub moved: Vec<(PathBuf, PathBuf)>,
    pub rewritten: Vec<PathBuf>,
}

impl OrganizeOutcome {
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty() && self.rewritten.is_empty()
    }
}

/// Run one reconciliation pass. Idempotent: a second pass over unchanged
/// inputs reports no moves and no rewrites.
pub fn run_organize(input: OrganizeInput<'_>) -> Result<OrganizeOutcome, KbError> {
    let repo = input.repo;
    let rules = &repo.rules;
    let allowed_scopes: Vec<String> = rules.scope_values()?;
    let allowed_created_os: Vec<String> = rules.created_os_values()?;
    let default_created_os = if allowed_created_os.contains(&input.default_created_os) {
        input.default_created_os.clone()
    } else {
        "other".to_string()
    };

    let notes: Vec<Note> = iter_note_paths(&repo.root, &rules.note_dirs)
        .iter()
        .filter_map(|p| try_read_note(p))
        .collect();

    let index = build_note_index(&notes);

    let mut outcome = OrganizeOutcome::default();

    for note in &notes {
        let note_id = note.meta.id.as_deref().unwrap_or("").to_ascii_uppercase();
        if !is_valid_id(&note_id) {
            continue;
        }
        let kind = note.meta.kind.clone().unwrap_or_default();
        let domain = note.meta.domain.clone().unwrap_or_default();
        if kind.is_empty() || domain.is_empty() {
            continue;
        }

        let mut meta = note.meta.clone();
        let mut changed = false;

        match meta.scope.as_deref() {
            None => {
                meta.scope = Some("cross".to_string());
                changed = true;
            }
            Some(scope) if scope.trim().is_empty() => {
                meta.scope = Some("cross".to_string());
                changed = true;
            }
            Some(scope) => {
                let normalized = scope.trim().to_lowercase();
                if allowed_scopes.contains(&normalized) && normalized != scope {
                    meta.scope = Some(normalized);
                    changed = true;
                }
            }
        }

        if meta
            .created_by
            .as_deref()
            .map_or(true, |v| v.trim().is_empty())
        {
            meta.created_by = Some(input.default_created_by.clone());
            changed = true;
        }

        match meta.created_os.as_deref() {
            None => {
                meta.created_os = Some(default_created_os.clone());
                changed = true;
            }
            Some(os) if os.trim().is_empty() => {
                meta.created_os = Some(default_created_os.clone());
                changed = true;
            }
            Some(os) => {
                let normalized = crate::hostenv::normalize_os_name(os);
                if allowed_created_os.contains(&normalized) && normalized != os {
                    meta.created_os = Some(normalized);
                    changed = true;
                }
            }
        }

        let related_ids = extract_related_ids(&meta);
        let block = build_related_block(&related_ids, &index);
        let next_body = replace_related_block(&note.body, block.as_deref()).map_err(|e| {
            KbError::Format(format!("{}: {e}", display_rel(&note.path, &repo.root)))
        })?;
        if next_body != note.body {
            changed = true;
        }

        if changed {
            meta.updated = Some(input.timestamp.clone());
            write_doc(
                &note.path,
                &Doc {
                    meta,
                    body: next_body,
                },
            )?;
            outcome.rewritten.push(note.path.clone());
        }

        let desired_dir = rules.placement_dir(&repo.root, &kind, &domain);
        let current_dir = note.path.parent().map(Path::to_path_buf).unwrap_or_default();
        if same_dir(&desired_dir, &current_dir) {
            continue;
        }
        let file_name = note.path.file_name().map(PathBuf::from).unwrap_or_default();
        let dst = desired_dir.join(file_name);
        input.vcs.move_path(&note.path, &dst)?;
        outcome.moved.push((note.path.clone(), dst));
    }

    Ok(outcome)
}

/// Index every parseable note by uppercased id; the stem and link label are
/// what the related-links renderer needs.
fn build_note_index(notes: &[Note]) -> BTreeMap<String, LinkTarget> {
    let mut index = BTreeMap::new();
    for note in notes {
        let note_id = note.meta.id.as_deref().unwrap_or("").to_ascii_uppercase();
        if !is_valid_id(&note_id) {
            continue;
        }
        let stem = note
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let label = note_link_label(&note.meta, &stem);
        index.insert(note_id, LinkTarget { stem, label });
    }
    index
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn display_rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::read_doc;
    use crate::related::{AUTO_RELATED_END, AUTO_RELATED_START};
    use crate::rules::Rules;
    use std::fs;

    const ID_A: &str = "01KH5AP6B38MDFJESSS7EW3WHA";
    const ID_B: &str = "01J0Z3N3Y7F4K2M9Q3T5A6B7C8";
    const STAMP: &str = "2026-02-11T08:15+09:00";

    /// Filesystem-only stand-in for the git port.
    struct FsVcs;

    impl VersionControl for FsVcs {
        fn has_worktree(&self) -> bool {
            true
        }
        fn has_upstream(&self) -> bool {
            false
        }
        fn pull_ff_only(&self, _allow_no_upstream: bool) -> Result<(), KbError> {
            Ok(())
        }
        fn commit_and_push(&self, _message: &str) -> Result<bool, KbError> {
            Ok(false)
        }
        fn is_tracked(&self, _path: &Path) -> bool {
            false
        }
        fn move_path(&self, src: &Path, dst: &Path) -> Result<(), KbError> {
            if let Some(parent) = dst.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| KbError::io(format!("create {}", parent.display()), e))?;
            }
            fs::rename(src, dst)
                .map_err(|e| KbError::io(format!("rename {}", src.display()), e))
        }
    }

    fn fixture_rules() -> Rules {
        Rules::from_yaml(
            "kinds: [note, pattern, inbox]\n\
             \ndomains: [dev, cross]\n\
             \nnote_dirs: [inbox, tools, patterns]\n\
             \nplacement:\n\
             \n  domain_dir_map:\n\
             \n    dev: tools\n",
        )
        .expect("fixture rules parse")
    }

    fn fixture_repo(root: &Path) -> Repo {
        Repo {
            root: root.to_path_buf(),
            rules: fixture_rules(),
        }
    }

    fn write_note(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, content).expect("write note");
        path
    }

    fn organize(repo: &Repo) -> OrganizeOutcome {
        run_organize(OrganizeInput {
            repo,
            vcs: &FsVcs,
            default_created_by: "test-host".to_string(),
            default_created_os: "linux".to_string(),
            timestamp: STAMP.to_string(),
        })
        .expect("organize")
    }

    #[test]
    fn defaults_are_injected_and_updated_is_bumped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        let path = write_note(
            dir.path(),
            &format!("tools/note--{ID_A}.md"),
            &format!("---\nid: {ID_A}\nkind: note\ndomain: dev\nsummary: ok\n---\n\nbody\n"),
        );

        let outcome = organize(&repo);
        assert_eq!(outcome.rewritten, vec![path.clone()]);
        assert!(outcome.moved.is_empty());

        let doc = read_doc(&path).expect("reread");
        assert_eq!(doc.meta.scope.as_deref(), Some("cross"));
        assert_eq!(doc.meta.created_by.as_deref(), Some("test-host"));
        assert_eq!(doc.meta.created_os.as_deref(), Some("linux"));
        assert_eq!(doc.meta.updated.as_deref(), Some(STAMP));
    }

    #[test]
    fn stored_values_are_normalized_not_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        let path = write_note(
            dir.path(),
            &format!("tools/note--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: note\ndomain: dev\nscope: ' Cross '\n\
                 created_by: someone\ncreated_os: Darwin\nsummary: ok\n---\n\nbody\n"
            ),
        );

        organize(&repo);
        let doc = read_doc(&path).expect("reread");
        assert_eq!(doc.meta.scope.as_deref(), Some("cross"));
        assert_eq!(doc.meta.created_by.as_deref(), Some("someone"));
        assert_eq!(doc.meta.created_os.as_deref(), Some("macos"));
    }

    #[test]
    fn incomplete_notes_are_left_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        let no_id = write_note(
            dir.path(),
            "inbox/draft.md",
            "---\nkind: note\ndomain: dev\n---\n\ndraft\n",
        );
        let no_domain = write_note(
            dir.path(),
            &format!("inbox/nodomain--{ID_B}.md"),
            &format!("---\nid: {ID_B}\nkind: note\n---\n\ndraft\n"),
        );
        let before_a = fs::read_to_string(&no_id).expect("read");
        let before_b = fs::read_to_string(&no_domain).expect("read");

        let outcome = organize(&repo);
        assert!(outcome.is_empty());
        assert_eq!(fs::read_to_string(&no_id).expect("read"), before_a);
        assert_eq!(fs::read_to_string(&no_domain).expect("read"), before_b);
    }

    #[test]
    fn related_block_is_rendered_and_resolves_titles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        write_note(
            dir.path(),
            &format!("tools/target--{ID_B}.md"),
            &format!(
                "---\nid: {ID_B}\nkind: note\ndomain: dev\nscope: cross\n\
                 created_by: x\ncreated_os: linux\ntitle: スキル作成手順\nsummary: ok\n---\n\n内容\n"
            ),
        );
        let path = write_note(
            dir.path(),
            &format!("tools/source--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: note\ndomain: dev\nscope: cross\n\
                 created_by: x\ncreated_os: linux\nsummary: ok\n\
                 related: ['{ID_B}', '{}', missing-id]\n---\n\n## 本文\n\n内容\n",
                ID_B.to_lowercase()
            ),
        );

        organize(&repo);
        let doc = read_doc(&path).expect("reread");
        assert!(doc.body.contains(AUTO_RELATED_START));
        assert!(doc.body.contains(AUTO_RELATED_END));
        assert!(
            doc.body
                .contains(&format!("[[target--{ID_B}|スキル作成手順]]")),
            "{}",
            doc.body
        );
        // one resolved link only: case-duplicate collapsed, invalid dropped
        assert_eq!(doc.body.matches("- [[").count(), 1);
    }

    #[test]
    fn unresolved_related_ids_render_missing_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        let path = write_note(
            dir.path(),
            &format!("tools/source--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: note\ndomain: dev\nscope: cross\n\
                 created_by: x\ncreated_os: linux\nsummary: ok\nrelated: ['{ID_B}']\n---\n\nbody\n"
            ),
        );
        organize(&repo);
        let doc = read_doc(&path).expect("reread");
        assert!(doc.body.contains(&format!("- [missing] {ID_B}")), "{}", doc.body);
    }

    #[test]
    fn misplaced_note_is_moved_preserving_filename() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        let src = write_note(
            dir.path(),
            &format!("inbox/note--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: note\ndomain: dev\nscope: cross\n\
                 created_by: x\ncreated_os: linux\nsummary: ok\n---\n\nbody\n"
            ),
        );

        let outcome = organize(&repo);
        let dst = dir.path().join(format!("tools/note--{ID_A}.md"));
        assert_eq!(outcome.moved, vec![(src.clone(), dst.clone())]);
        assert!(outcome.rewritten.is_empty());
        assert!(!src.exists());
        assert!(dst.exists());
    }

    #[test]
    fn pattern_kind_collects_in_patterns_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        write_note(
            dir.path(),
            &format!("inbox/pat--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: pattern\ndomain: dev\nscope: cross\n\
                 created_by: x\ncreated_os: linux\nsummary: ok\n---\n\nbody\n"
            ),
        );
        let outcome = organize(&repo);
        assert_eq!(outcome.moved.len(), 1);
        assert!(outcome.moved[0].1.ends_with(format!("patterns/pat--{ID_A}.md")));
    }

    #[test]
    fn second_run_reports_no_changes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        write_note(
            dir.path(),
            &format!("inbox/note--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: note\ndomain: dev\nsummary: ok\n\
                 related: ['{ID_B}']\n---\n\n## 本文\n\n内容\n"
            ),
        );

        let first = organize(&repo);
        assert!(!first.is_empty());

        let moved_to = dir.path().join(format!("tools/note--{ID_A}.md"));
        let after_first = fs::read_to_string(&moved_to).expect("read");

        let second = organize(&repo);
        assert!(second.is_empty(), "moved: {:?}, rewritten: {:?}", second.moved, second.rewritten);
        assert_eq!(fs::read_to_string(&moved_to).expect("read"), after_first);
    }

    #[test]
    fn ambiguous_marker_structure_aborts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = fixture_repo(dir.path());
        write_note(
            dir.path(),
            &format!("tools/note--{ID_A}.md"),
            &format!(
                "---\nid: {ID_A}\nkind: note\ndomain: dev\nscope: cross\n\
                 created_by: x\ncreated_os: linux\nsummary: ok\n---\n\n\
                 {AUTO_RELATED_START}\na\n{AUTO_RELATED_END}\n{AUTO_RELATED_START}\nb\n{AUTO_RELATED_END}\n"
            ),
        );
        let err = run_organize(OrganizeInput {
            repo: &repo,
            vcs: &FsVcs,
            default_created_by: "x".to_string(),
            default_created_os: "linux".to_string(),
            timestamp: STAMP.to_string(),
        })
        .expect_err("ambiguous markers");
        assert!(matches!(err, KbError::Format(_)), "{err}");
    }
}
