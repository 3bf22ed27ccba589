//! Repository discovery: walk up from the working directory to the tree
//! that carries the rule-set file, then load the rules once.

use std::path::{Path, PathBuf};

use crate::error::KbError;
use crate::rules::Rules;

/// Root-relative location of the rule-set file that marks a repository.
pub const RULES_FILE: &str = "ops/rules/kb.rules.yml";

/// An opened repository: canonical root plus the loaded rule set, passed
/// explicitly into every component.
#[derive(Debug, Clone)]
pub struct Repo {
    pub root: PathBuf,
    pub rules: Rules,
}

pub fn find_repo_root(start: &Path) -> Result<PathBuf, KbError> {
    let start = start
        .canonicalize()
        .map_err(|e| KbError::io(format!("resolve {}", start.display()), e))?;
    for dir in start.ancestors() {
        if dir.join(RULES_FILE).is_file() {
            return Ok(dir.to_path_buf());
        }
    }
    Err(KbError::Rules(format!(
        "could not find repo root (missing {RULES_FILE})"
    )))
}

pub fn load_rules(root: &Path) -> Result<Rules, KbError> {
    let rules_path = root.join(RULES_FILE);
    let content = std::fs::read_to_string(&rules_path)
        .map_err(|e| KbError::io(format!("read {}", rules_path.display()), e))?;
    Rules::from_yaml(&content)
}

/// Open the repository containing `start`.
pub fn open_repo_at(start: &Path) -> Result<Repo, KbError> {
    let root = find_repo_root(start)?;
    let rules = load_rules(&root)?;
    Ok(Repo { root, rules })
}

/// Open the repository containing the current working directory.
pub fn open_repo() -> Result<Repo, KbError> {
    let cwd = std::env::current_dir()
        .map_err(|e| KbError::io("resolve current directory".to_string(), e))?;
    open_repo_at(&cwd)
}
