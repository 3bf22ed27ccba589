//! `kb` — knowledge-base repository helper CLI.

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "kb", version, about = "Knowledge-base repository helper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note and synchronize it
    New(NewArgs),
    /// Print the path of the note with the given id
    Resolve(ResolveArgs),
    /// Full-text search over the note directories
    Search(SearchArgs),
    /// Validate every note against the rule set
    Lint(LintArgs),
    /// Normalize metadata, rebuild derived blocks, and relocate notes
    Organize(OrganizeArgs),
}

#[derive(Parser)]
struct NewArgs {
    /// Note kind (rule-defined enumeration)
    #[arg(long, default_value = "note")]
    kind: String,

    /// Note domain (rule-defined enumeration)
    #[arg(long, default_value = "cross")]
    domain: String,

    /// Optional human-readable title
    #[arg(long)]
    title: Option<String>,

    /// One-line summary (required, non-empty)
    #[arg(long)]
    summary: String,

    /// Tag, repeatable; lowercased on write
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Related note id, repeatable
    #[arg(long = "related", value_name = "ID")]
    related_ids: Vec<String>,

    /// Filename slug (kebab-case; defaults to the kind)
    #[arg(long)]
    slug: Option<String>,

    /// Scope (defaults to cross)
    #[arg(long)]
    scope: Option<String>,
}

#[derive(Parser)]
struct ResolveArgs {
    /// Note id to locate
    #[arg(value_name = "ID")]
    note_id: String,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query passed to the text-search tool
    #[arg(value_name = "QUERY")]
    query: String,
}

#[derive(Parser)]
struct LintArgs {
    /// Output JSON instead of plain problems
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct OrganizeArgs {
    /// Output JSON instead of plain relocation/rewrite lines
    #[arg(long)]
    json: bool,
}

fn init_logging() -> Option<flexi_logger::LoggerHandle> {
    let spec = std::env::var("KB_LOG").unwrap_or_else(|_| "warn".to_string());
    flexi_logger::Logger::try_with_str(spec)
        .ok()?
        .log_to_stderr()
        .start()
        .ok()
}

fn main() {
    let _logger = init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::New(args) => commands::new::run_new(args),
        Commands::Resolve(args) => commands::resolve::run_resolve(args),
        Commands::Search(args) => commands::search::run_search(args),
        Commands::Lint(args) => commands::lint::run_lint(args),
        Commands::Organize(args) => commands::organize::run_organize(args),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
