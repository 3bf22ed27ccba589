use kb_core::{
    detect_created_by, detect_created_os, iso_jst_minute, now_jst, open_repo, GitCli,
    OrganizeInput, VersionControl,
};

use crate::OrganizeArgs;

pub fn run_organize(args: OrganizeArgs) -> Result<(), String> {
    let repo = open_repo().map_err(|e| e.to_string())?;
    let vcs = GitCli::new(&repo.root);
    super::require_git_worktree(&vcs)?;
    vcs.pull_ff_only(false).map_err(|e| e.to_string())?;

    let outcome = kb_core::run_organize(OrganizeInput {
        repo: &repo,
        vcs: &vcs,
        default_created_by: detect_created_by(),
        default_created_os: detect_created_os(),
        timestamp: iso_jst_minute(now_jst()),
    })
    .map_err(|e| e.to_string())?;

    let rel = |path: &std::path::Path| {
        path.strip_prefix(&repo.root)
            .unwrap_or(path)
            .display()
            .to_string()
    };

    if args.json {
        let payload = serde_json::json!({
            "moved": outcome
                .moved
                .iter()
                .map(|(src, dst)| serde_json::json!({"from": rel(src), "to": rel(dst)}))
                .collect::<Vec<_>>(),
            "metadata_updated": outcome.rewritten.iter().map(|p| rel(p)).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string(&payload).map_err(|e| format!("json encode: {e}"))?
        );
    } else if outcome.is_empty() {
        println!("No changes");
    } else {
        for (src, dst) in &outcome.moved {
            println!("{} -> {}", rel(src), rel(dst));
        }
        for path in &outcome.rewritten {
            println!("metadata updated: {}", rel(path));
        }
    }

    if outcome.is_empty() {
        return Ok(());
    }

    vcs.commit_and_push("ナレッジ配置とメタデータを整理")
        .map_err(|e| e.to_string())?;
    Ok(())
}
