use std::collections::BTreeSet;
use std::fs;

use kb_core::{
    detect_created_by, detect_created_os, dump_frontmatter, is_kebab_case, is_valid_id,
    iso_jst_minute, new_id, now_jst, open_repo, GitCli, NoteMeta, VersionControl,
};

use crate::NewArgs;

/// Body scaffold inserted on creation. Not enforced by lint.
fn note_template(kind: &str) -> &'static str {
    match kind {
        "inbox" => "",
        "research" => "## 背景\n\n## 調査メモ\n\n## 結論\n\n## 出典\n\n",
        "decision" => "## 結論\n\n## 背景\n\n## 選択肢\n\n## 決め手\n\n## 影響\n\n",
        "troubleshoot" => {
            "## 適用環境\n\n\
             - 確認済み:\n\
             - 未確認だが有効見込み:\n\
             - 非対応/注意:\n\n\
             ## 症状\n\n## 環境\n\n## 原因\n\n## 対処\n\n## 再発防止\n\n"
        }
        "howto" => {
            "## 目的\n\n\
             ## 適用環境\n\n\
             - 確認済み:\n\
             - 未確認だが有効見込み:\n\
             - 非対応/注意:\n\n\
             ## 手順\n\n## 検証\n\n## 注意点\n\n"
        }
        "pattern" => "## 概要\n\n## 使うとき\n\n## 例\n\n## 関連\n\n",
        _ => "## 本文\n\n",
    }
}

pub fn run_new(args: NewArgs) -> Result<(), String> {
    let repo = open_repo().map_err(|e| e.to_string())?;
    let vcs = GitCli::new(&repo.root);
    super::require_git_worktree(&vcs)?;
    vcs.pull_ff_only(true).map_err(|e| e.to_string())?;

    let rules = &repo.rules;
    let kinds: BTreeSet<&str> = rules.kinds.iter().map(String::as_str).collect();
    let domains: BTreeSet<&str> = rules.domains.iter().map(String::as_str).collect();
    let scope_values: BTreeSet<String> =
        rules.scope_values().map_err(|e| e.to_string())?.into_iter().collect();
    let created_os_values: BTreeSet<String> = rules
        .created_os_values()
        .map_err(|e| e.to_string())?
        .into_iter()
        .collect();

    if !kinds.contains(args.kind.as_str()) {
        return Err(format!("invalid kind: {} (allowed: {kinds:?})", args.kind));
    }
    if !domains.contains(args.domain.as_str()) {
        return Err(format!(
            "invalid domain: {} (allowed: {domains:?})",
            args.domain
        ));
    }

    let summary = args.summary.trim().to_string();
    if summary.is_empty() {
        return Err("--summary must be non-empty".to_string());
    }

    for rid in &args.related_ids {
        if !is_valid_id(rid) {
            return Err(format!("invalid related ULID: {rid}"));
        }
    }

    let scope = args
        .scope
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "cross".to_string());
    if !scope_values.contains(&scope) {
        return Err(format!(
            "invalid scope: {scope} (allowed: {scope_values:?})"
        ));
    }

    let created_by = detect_created_by();
    let created_os = detect_created_os();
    if !created_os_values.contains(&created_os) {
        return Err(format!(
            "invalid detected created_os: {created_os} (allowed: {created_os_values:?})"
        ));
    }

    let note_id = new_id();
    let ts = iso_jst_minute(now_jst());

    let tags: Vec<String> = args
        .tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    let related: Vec<String> = args
        .related_ids
        .iter()
        .map(|r| r.to_ascii_uppercase())
        .collect();

    let meta = NoteMeta {
        id: Some(note_id.clone()),
        kind: Some(args.kind.clone()),
        domain: Some(args.domain.clone()),
        scope: Some(scope),
        created_by: Some(created_by),
        created_os: Some(created_os),
        title: args
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from),
        summary: Some(summary),
        tags: (!tags.is_empty()).then_some(tags),
        related: (!related.is_empty()).then_some(related),
        created: Some(ts.clone()),
        updated: Some(ts),
        ..NoteMeta::default()
    };

    let out_dir = rules.placement_dir(&repo.root, &args.kind, &args.domain);
    fs::create_dir_all(&out_dir)
        .map_err(|e| format!("create {}: {e}", out_dir.display()))?;

    // Slug defaults to the kind: stable, not required to be human-semantic.
    let slug = args
        .slug
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&args.kind)
        .to_string();
    if !is_kebab_case(&slug) {
        return Err(format!("invalid slug: {slug} (expected lowercase kebab-case)"));
    }

    let filename = rules
        .naming
        .file_template
        .replace("{id}", &note_id)
        .replace("{slug}", &slug);
    let out_path = out_dir.join(filename);

    let text =
        dump_frontmatter(&meta, note_template(&args.kind)).map_err(|e| e.to_string())?;
    fs::write(&out_path, text).map_err(|e| format!("write {}: {e}", out_path.display()))?;

    vcs.commit_and_push(&format!("ナレッジを追加: {note_id}"))
        .map_err(|e| e.to_string())?;

    println!(
        "{}",
        out_path
            .strip_prefix(&repo.root)
            .unwrap_or(&out_path)
            .display()
    );
    Ok(())
}
