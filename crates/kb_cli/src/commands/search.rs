use kb_core::{open_repo, GitCli, RipgrepSearch, SearchOutcome, TextSearch, VersionControl};

use crate::SearchArgs;

pub fn run_search(args: SearchArgs) -> Result<(), String> {
    let repo = open_repo().map_err(|e| e.to_string())?;
    let vcs = GitCli::new(&repo.root);
    super::require_git_worktree(&vcs)?;
    vcs.pull_ff_only(false).map_err(|e| e.to_string())?;

    let search = RipgrepSearch::new(&repo.root);
    match search
        .search(&args.query, &repo.rules.note_dirs)
        .map_err(|e| e.to_string())?
    {
        SearchOutcome::Matches => {}
        SearchOutcome::NoMatches => println!("No matches"),
    }
    Ok(())
}
