use kb_core::{is_valid_id, iter_note_paths, open_repo, read_doc};

use crate::ResolveArgs;

pub fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let note_id = args.note_id.trim().to_ascii_uppercase();
    if !is_valid_id(&note_id) {
        return Err(format!("invalid ULID: {note_id}"));
    }

    let repo = open_repo().map_err(|e| e.to_string())?;
    for path in iter_note_paths(&repo.root, &repo.rules.note_dirs) {
        let Ok(doc) = read_doc(&path) else {
            continue;
        };
        let matches = doc
            .meta
            .id
            .as_deref()
            .map(|id| id.eq_ignore_ascii_case(&note_id))
            .unwrap_or(false);
        if matches {
            println!(
                "{}",
                path.strip_prefix(&repo.root).unwrap_or(&path).display()
            );
            return Ok(());
        }
    }

    Err(format!("Note not found: {note_id}"))
}
