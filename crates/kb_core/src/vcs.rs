//! Version-control and text-search capability ports.
//!
//! Core logic under test never spawns real processes: the organizer and the
//! command layer talk to these traits, and `GitCli`/`RipgrepSearch` are the
//! subprocess-backed implementations used by the binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::KbError;

/// Synchronization and rename operations against the durable store.
pub trait VersionControl {
    fn has_worktree(&self) -> bool;
    fn has_upstream(&self) -> bool;
    /// Fast-forward pull. With `allow_no_upstream`, a missing upstream is
    /// tolerated (initial bootstrap) instead of failing.
    fn pull_ff_only(&self, allow_no_upstream: bool) -> Result<(), KbError>;
    /// Stage everything, commit, push. Returns false when the working tree
    /// was already clean and nothing was committed.
    fn commit_and_push(&self, message: &str) -> Result<bool, KbError>;
    fn is_tracked(&self, path: &Path) -> bool;
    /// Relocate a file, preserving the rename in version control (staging
    /// the source first when it is not yet tracked).
    fn move_path(&self, src: &Path, dst: &Path) -> Result<(), KbError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Matches,
    NoMatches,
}

/// Full-text search over the configured note directories.
pub trait TextSearch {
    fn search(&self, query: &str, dirs: &[String]) -> Result<SearchOutcome, KbError>;
}

/// `git` CLI implementation rooted at the repository working tree.
pub struct GitCli {
    root: PathBuf,
}

impl GitCli {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn git(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root).args(args);
        cmd
    }

    /// Run a git command silently, caring only whether it succeeded.
    fn git_check(&self, args: &[&str]) -> bool {
        self.git(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run a git command, failing on non-zero exit. git's own stdout (commit
    /// summaries, push notices) is suppressed so it never pollutes the
    /// machine-readable output the commands print; stderr stays inherited so
    /// genuine git errors still surface.
    fn git_run(&self, args: &[&str]) -> Result<(), KbError> {
        let status = self
            .git(args)
            .stdout(Stdio::null())
            .status()
            .map_err(|e| KbError::git(format!("failed to launch git {}: {e}", args.join(" "))))?;
        if !status.success() {
            return Err(KbError::git(format!(
                "git {} failed (exit {})",
                args.join(" "),
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }

    fn rel(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

impl VersionControl for GitCli {
    fn has_worktree(&self) -> bool {
        self.git_check(&["rev-parse", "--is-inside-work-tree"])
    }

    fn has_upstream(&self) -> bool {
        let output = self
            .git(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"])
            .stderr(Stdio::null())
            .output();
        match output {
            Ok(out) if out.status.success() => {
                let upstream = String::from_utf8_lossy(&out.stdout).trim().to_string();
                !upstream.is_empty() && upstream != "@{upstream}" && upstream != "@{u}"
            }
            _ => false,
        }
    }

    fn pull_ff_only(&self, allow_no_upstream: bool) -> Result<(), KbError> {
        if !self.has_upstream() {
            if allow_no_upstream {
                log::warn!("no upstream configured yet; skipping git pull --ff-only");
                return Ok(());
            }
            return Err(KbError::git(
                "upstream is not configured; set upstream first, then retry",
            ));
        }
        self.git_run(&["pull", "--ff-only"])
    }

    fn commit_and_push(&self, message: &str) -> Result<bool, KbError> {
        let status = self
            .git(&["status", "--porcelain"])
            .output()
            .map_err(|e| KbError::git(format!("failed to launch git status: {e}")))?;
        if !status.status.success() {
            return Err(KbError::git("git status --porcelain failed"));
        }
        if String::from_utf8_lossy(&status.stdout).trim().is_empty() {
            return Ok(false);
        }

        self.git_run(&["add", "-A"])?;
        self.git_run(&["commit", "-m", message])?;
        if self.has_upstream() {
            self.git_run(&["push"])?;
        } else {
            self.git_run(&["push", "-u", "origin", "HEAD"])?;
        }
        Ok(true)
    }

    fn is_tracked(&self, path: &Path) -> bool {
        self.git_check(&["ls-files", "--error-unmatch", &self.rel(path)])
    }

    fn move_path(&self, src: &Path, dst: &Path) -> Result<(), KbError> {
        if let Some(parent) = dst.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| KbError::io(format!("create {}", parent.display()), e))?;
        }
        let rel_src = self.rel(src);
        let rel_dst = self.rel(dst);
        if !self.is_tracked(src) {
            self.git_run(&["add", &rel_src])?;
        }
        self.git_run(&["mv", &rel_src, &rel_dst])
    }
}

/// `rg` implementation of the search port.
pub struct RipgrepSearch {
    root: PathBuf,
}

impl RipgrepSearch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TextSearch for RipgrepSearch {
    fn search(&self, query: &str, dirs: &[String]) -> Result<SearchOutcome, KbError> {
        let mut cmd = Command::new("rg");
        cmd.current_dir(&self.root)
            .args(["-n", "--hidden", "--glob", "!**/.git/**"])
            .arg(query)
            .args(dirs);
        let status = cmd.status().map_err(|e| KbError::ExternalTool {
            tool: "rg",
            context: format!("failed to launch: {e}"),
        })?;
        match status.code() {
            Some(0) => Ok(SearchOutcome::Matches),
            Some(1) => Ok(SearchOutcome::NoMatches),
            code => Err(KbError::ExternalTool {
                tool: "rg",
                context: format!("exited with code {}", code.unwrap_or(-1)),
            }),
        }
    }
}
