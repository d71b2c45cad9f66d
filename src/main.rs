use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codetutor::cli::commands::generate::GenerateOptions;

#[derive(Parser)]
#[command(name = "codetutor")]
#[command(
    version,
    about = "Generate beginner-friendly tutorials from a codebase"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a tutorial for a repository
    Generate {
        #[arg(long, short, help = "Path to the repository")]
        repo: PathBuf,
        #[arg(long, short, help = "Output directory for chapters")]
        output: Option<PathBuf>,
        #[arg(long, help = "Project name (default: repository directory name)")]
        project: Option<String>,
        #[arg(long, help = "Maximum number of files to collect")]
        max_files: Option<usize>,
        #[arg(long, help = "Maximum number of abstractions to keep")]
        max_abstractions: Option<usize>,
        #[arg(long = "include", help = "Include glob pattern (repeatable)")]
        include: Vec<String>,
        #[arg(long = "exclude", help = "Exclude glob pattern (repeatable)")]
        exclude: Vec<String>,
        #[arg(long, help = "LLM provider (openrouter, openai, ollama)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Checkpoint file to resume from and save to")]
        checkpoint: Option<PathBuf>,
        #[arg(long = "dry-run", help = "Show configuration only, don't run")]
        dry_run: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(long, help = "Output as JSON instead of TOML")]
        json: bool,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mcodetutor encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            codetutor::cli::Output::new().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            repo,
            output,
            project,
            max_files,
            max_abstractions,
            include,
            exclude,
            provider,
            model,
            checkpoint,
            dry_run,
        } => {
            codetutor::cli::commands::generate::run(GenerateOptions {
                repo,
                output,
                project,
                max_files,
                max_abstractions,
                include,
                exclude,
                provider,
                model,
                checkpoint,
                dry_run,
            })?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                codetutor::cli::commands::config::show(json)?;
            }
            ConfigAction::Path => {
                codetutor::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                codetutor::cli::commands::config::init(global, force)?;
            }
        },
    }

    Ok(())
}
