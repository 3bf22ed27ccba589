use kb_core::{lint_repo, open_repo};

use crate::LintArgs;

pub fn run_lint(args: LintArgs) -> Result<(), String> {
    let repo = open_repo().map_err(|e| e.to_string())?;
    let problems = lint_repo(&repo).map_err(|e| e.to_string())?;

    if args.json {
        let payload = serde_json::json!({
            "problems": problems,
            "passed": problems.is_empty(),
        });
        println!(
            "{}",
            serde_json::to_string(&payload).map_err(|e| format!("json encode: {e}"))?
        );
        if !problems.is_empty() {
            return Err(format!("lint failed: {} problem(s)", problems.len()));
        }
        return Ok(());
    }

    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("{problem}");
        }
        return Err(format!("lint failed: {} problem(s)", problems.len()));
    }

    println!("OK");
    Ok(())
}
