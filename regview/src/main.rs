use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod context;
mod format;
mod logging;

/// regview - Registry Catalog Viewer
///
/// Lists every repository of a container registry with its tags, grouped by
/// top-level namespace.
#[derive(Parser, Debug)]
#[command(name = "regview")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Control colored output: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    color: String,

    /// Path to a YAML configuration file
    #[arg(long, global = true, env = "REGVIEW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the registry catalog grouped by namespace
    Catalog {
        /// Registry host or URL (overrides REGISTRYUI_HUB_URI)
        #[arg(short, long)]
        registry: Option<String>,
        /// Output format: pretty, json, yaml
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Display version information
    Version,
    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let verbosity = context::VerbosityLevel::from_count(cli.verbose);
    let color = format::ColorChoice::from(cli.color.as_str());
    logging::init(verbosity);

    match cli.command {
        Commands::Catalog { registry, format } => {
            let ctx = match context::AppContext::build(
                cli.config.as_deref(),
                registry.as_deref(),
                color,
                verbosity,
            ) {
                Ok(ctx) => ctx,
                Err(e) => {
                    format::error(color, &e.to_string());
                    std::process::exit(1);
                }
            };
            let fmt = format::OutputFormat::from(format.as_str());
            commands::catalog::handle_catalog(&ctx, fmt);
        }
        Commands::Version => {
            commands::version::print_version();
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }
    }
}
