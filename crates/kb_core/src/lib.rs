//! Core logic for the `kb` knowledge-base repository manager: identifier
//! generation, the frontmatter document codec, the repository scanner, the
//! rule set, the validator, and the organizer. Version control and text
//! search are injected capability ports; nothing in this crate spawns a
//! process except the port implementations in `vcs`.

pub mod error;
pub mod frontmatter;
pub mod hostenv;
pub mod id;
pub mod lint;
pub mod notes;
pub mod organize;
pub mod related;
pub mod repo;
pub mod rules;
pub mod timeutil;
pub mod vcs;

pub use error::KbError;
pub use frontmatter::{dump_frontmatter, read_doc, split_frontmatter, write_doc, Doc, NoteMeta};
pub use hostenv::{detect_created_by, detect_created_os, normalize_os_name};
pub use id::{is_valid_id, new_id};
pub use lint::{filename_matches_template, is_kebab_case, lint_repo};
pub use notes::{iter_note_paths, read_note, try_read_note, Note};
pub use organize::{run_organize, OrganizeInput, OrganizeOutcome};
pub use related::{
    build_related_block, extract_related_ids, replace_related_block, AUTO_RELATED_END,
    AUTO_RELATED_START,
};
pub use repo::{find_repo_root, open_repo, open_repo_at, Repo, RULES_FILE};
pub use rules::Rules;
pub use timeutil::{iso_jst_minute, now_jst, parse_iso};
pub use vcs::{GitCli, RipgrepSearch, SearchOutcome, TextSearch, VersionControl};
