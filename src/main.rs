mod cli;

use clap::{Parser, Subcommand};
use cli::commands::auth::AuthAction;
use cli::commands::config_cmd::ConfigAction;
use cli::commands::deps::DepsAction;
use cli::commands::git_stub;
use cli::commands::git_stub::{
    AbsorbArgs, AddArgs, CheckoutArgs, CommitArgs, FetchArgs, MergeArgs, ReflogArgs, RemoteAction, StackAction,
    StashAction, TagArgs, UndoArgs,
};
use cli::commands::graph::GraphAction;
use cli::commands::pr::PrAction;
use cli::commands::release::ReleaseAction;
use cli::output::OutputMode;
use cv_core::CvError;

/// Git-aware code intelligence and repository assistant.
#[derive(Parser)]
#[command(name = "cv", version, about)]
struct Cli {
    /// Emits machine-readable JSON instead of human-formatted output
    #[arg(long, global = true)]
    json: bool,
    /// Enables debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Suppresses non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sets up `.cv/` in the current repository
    Init { path: Option<std::path::PathBuf> },
    /// Parses and embeds the repository into the graph and vector stores
    Sync {
        #[arg(long)]
        incremental: bool,
        #[arg(long)]
        force: bool,
    },
    /// Semantic search over code and documentation
    Find {
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: u64,
        #[arg(long, default_value_t = 0.0)]
        min_score: f32,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        file: Option<String>,
    },
    /// Explains a symbol via graph neighborhood, impact, and semantic context
    Explain { target: String },
    /// Graph queries: neighbors, paths, impact, callers/callees
    Graph {
        #[command(subcommand)]
        action: GraphAction,
    },
    /// Health checks for the repo, config, credentials, and AI backends
    Doctor {
        #[arg(long)]
        fix: bool,
    },
    /// Writes a diagnostic bundle for filing issues
    Bugreport {
        #[arg(long)]
        output: Option<std::path::PathBuf>,
        #[arg(long)]
        copy: bool,
        #[arg(long = "open-issue")]
        open_issue: bool,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        error: Option<String>,
    },
    /// Reads and writes `.cv/config.json`
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Credential setup, listing, and validation
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Dependency-manifest analysis (not implemented in this build)
    Deps {
        #[command(subcommand)]
        action: DepsAction,
    },
    /// Pull request operations against the detected git platform
    Pr {
        #[command(subcommand)]
        action: PrAction,
    },
    /// Release operations against the detected git platform
    Release {
        #[command(subcommand)]
        action: ReleaseAction,
    },
    /// Not implemented in this build
    Commit(CommitArgs),
    /// Not implemented in this build
    Push,
    /// Not implemented in this build
    Tag(TagArgs),
    /// Not implemented in this build
    Stash {
        #[command(subcommand)]
        action: StashAction,
    },
    /// Not implemented in this build
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
    /// Not implemented in this build
    Fetch(FetchArgs),
    /// Not implemented in this build
    Merge(MergeArgs),
    /// Not implemented in this build
    Checkout(CheckoutArgs),
    /// Not implemented in this build
    Switch(CheckoutArgs),
    /// Not implemented in this build
    Add(AddArgs),
    /// Not implemented in this build
    Absorb(AbsorbArgs),
    /// Not implemented in this build
    Stack {
        #[command(subcommand)]
        action: StackAction,
    },
    /// Not implemented in this build
    Undo(UndoArgs),
    /// Not implemented in this build
    Reflog(ReflogArgs),
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    cli::logging::init(cli.verbose, cli.quiet);

    let mode = OutputMode { json: cli.json, verbose: cli.verbose, quiet: cli.quiet };

    if let Err(err) = dispatch(cli.command, mode).await {
        let code = err.downcast_ref::<CvError>().map(CvError::exit_code).unwrap_or(1);

        if let Ok(cwd) = std::env::current_dir() {
            if let Some(root) = cli::repo::find_repo_root(&cwd) {
                cli::logging::log_to_error_file(&root, &err.to_string());
            }
        }

        eprintln!("error: {err}");
        std::process::exit(code);
    }
}

async fn dispatch(command: Commands, mode: OutputMode) -> anyhow::Result<()> {
    match command {
        Commands::Init { path } => cli::commands::init::run(path, mode),
        Commands::Sync { incremental, force } => cli::commands::sync::run(incremental, force, mode).await,
        Commands::Find { query, limit, min_score, language, file } => {
            cli::commands::find::run(query, limit, min_score, language, file, mode).await
        }
        Commands::Explain { target } => cli::commands::explain::run(target, mode).await,
        Commands::Graph { action } => cli::commands::graph::run(action, mode),
        Commands::Doctor { fix } => cli::commands::doctor::run(fix, mode),
        Commands::Bugreport { output, copy, open_issue, message, error } => {
            cli::commands::bugreport::run(output, copy, open_issue, message, error)
        }
        Commands::Config { action } => cli::commands::config_cmd::run(action, mode),
        Commands::Auth { action } => cli::commands::auth::run(action, mode),
        Commands::Deps { action } => cli::commands::deps::run(action),
        Commands::Pr { action } => cli::commands::pr::run(action, mode).await,
        Commands::Release { action } => cli::commands::release::run(action, mode).await,
        Commands::Commit(args) => git_stub::commit(args),
        Commands::Push => git_stub::push(),
        Commands::Tag(args) => git_stub::tag(args),
        Commands::Stash { action } => git_stub::stash(action),
        Commands::Remote { action } => git_stub::remote(action),
        Commands::Fetch(args) => git_stub::fetch(args),
        Commands::Merge(args) => git_stub::merge(args),
        Commands::Checkout(args) => git_stub::checkout(args),
        Commands::Switch(args) => git_stub::checkout(args),
        Commands::Add(args) => git_stub::add(args),
        Commands::Absorb(args) => git_stub::absorb(args),
        Commands::Stack { action } => git_stub::stack(action),
        Commands::Undo(args) => git_stub::undo(args),
        Commands::Reflog(args) => git_stub::reflog(args),
    }
}
