use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;
mod table;

use table::Mode;

#[derive(Parser)]
#[command(name = "pacelab-cli", version, about = "Pacelab CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session
    Run {
        /// Trial table (CSV); defaults to the settings file's trial_table
        #[arg(long)]
        config: Option<PathBuf>,
        /// Instrument mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,
        /// Directory for the exported result table
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Print events as JSON lines instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Validate a trial table and print its contents
    Check {
        /// Trial table (CSV)
        #[arg(long)]
        config: PathBuf,
        /// Instrument mode
        #[arg(long, value_enum)]
        mode: Mode,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("PACELAB_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            mode,
            output_dir,
            json,
        } => commands::run::run(commands::run::RunArgs {
            config,
            mode,
            output_dir,
            json,
        }),
        Commands::Check { config, mode } => commands::check::run(config, mode),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "pacelab-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
