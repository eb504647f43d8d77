use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seoplan::ai::provider::Backend;
use seoplan::cli::AiOverrides;
use seoplan::cli::commands::{audit::AuditOptions, plan::PlanOptions};
use seoplan::types::AnalysisType;

/// Parse backend from string
fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse::<Backend>().map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "seoplan")]
#[command(
    version,
    about = "Turn multi-provider AI analysis into a validated SEO action plan"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

/// AI flags shared by every command that calls a backend
#[derive(clap::Args, Clone, Default)]
struct AiArgs {
    #[arg(long, value_parser = parse_backend, help = "AI backend: gemini, openai, openrouter, anthropic")]
    provider: Option<Backend>,
    #[arg(long = "model", help = "Model to use; repeat to race several")]
    models: Vec<String>,
    #[arg(long, env = "SEOPLAN_API_KEY", hide_env_values = true, help = "API key for the backend")]
    api_key: Option<String>,
}

impl From<AiArgs> for AiOverrides {
    fn from(args: AiArgs) -> Self {
        Self {
            backend: args.provider,
            models: args.models,
            api_key: args.api_key,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full audit over a ranked URL list and save the report
    Audit {
        #[arg(help = "File with one URL per line, most important first")]
        urls: PathBuf,
        #[arg(long = "competitor", help = "Competitor URL or sitemap (repeatable)")]
        competitors: Vec<String>,
        #[arg(long, help = "Discover competitor sitemaps for the first URL (gemini only)")]
        discover_competitors: bool,
        #[arg(long = "type", default_value = "global", help = "Analysis type: global, local")]
        analysis_type: AnalysisType,
        #[arg(long, help = "Target location for local audits")]
        location: Option<String>,
        #[arg(long, short, help = "Report directory")]
        output: Option<PathBuf>,
        #[command(flatten)]
        ai: AiArgs,
    },

    /// Generate an action plan from an analysis or saved report
    Plan {
        #[arg(help = "Analysis JSON file")]
        input: PathBuf,
        #[arg(long, short, help = "Write the plan here instead of stdout")]
        output: Option<PathBuf>,
        #[command(flatten)]
        ai: AiArgs,
    },

    /// Check that the API key works
    CheckKey {
        #[command(flatten)]
        ai: AiArgs,
    },

    /// List saved reports, or print one by id prefix
    History {
        #[arg(help = "Report id or unique prefix")]
        id: Option<String>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(long, help = "Report directory")]
        dir: Option<PathBuf>,
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
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, toml, json, yaml"
        )]
        format: String,
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
        eprintln!("\x1b[31mseoplan encountered an unexpected error:\x1b[0m");
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
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
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
        Commands::Audit {
            urls,
            competitors,
            discover_competitors,
            analysis_type,
            location,
            output,
            ai,
        } => {
            seoplan::cli::commands::audit::run(AuditOptions {
                urls_file: urls,
                competitors,
                discover_competitors,
                analysis_type,
                location,
                output,
                ai: ai.into(),
                quiet: cli.quiet,
            })?;
        }
        Commands::Plan { input, output, ai } => {
            seoplan::cli::commands::plan::run(PlanOptions {
                input,
                output,
                ai: ai.into(),
                quiet: cli.quiet,
            })?;
        }
        Commands::CheckKey { ai } => {
            seoplan::cli::commands::check_key::run(&ai.into(), cli.quiet)?;
        }
        Commands::History { id, format, dir } => {
            seoplan::cli::commands::history::run(id.as_deref(), &format, dir)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                seoplan::cli::commands::config::show(global, &format)?;
            }
            ConfigAction::Path => {
                seoplan::cli::commands::config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    seoplan::cli::commands::config::init_global(force)?;
                } else {
                    seoplan::cli::commands::config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
