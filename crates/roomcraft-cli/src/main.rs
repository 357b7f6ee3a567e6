use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use roomcraft_execution::LogFormat;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "roomcraft")]
#[command(about = "Roomcraft - turn a floorplan into photorealistic multi-room renders", long_about = None)]
struct Cli {
    /// Directory holding config.toml and secret.json (defaults to ~/.config/roomcraft)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a secret.json template for the API key
    InitSecret,
    /// Print the effective configuration
    Config,
    /// Analyse a floorplan and list the rooms it contains
    Analyze {
        /// Floorplan image (PNG, JPEG or WebP)
        floorplan: PathBuf,
    },
    /// Render every room of a floorplan and write the images to a directory
    Render(commands::render::RenderArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    roomcraft_execution::init_logging(cli.log_format.into(), None)?;
    let config_dir = cli.config_dir.as_deref();

    match cli.command {
        Commands::InitSecret => commands::setup::init_secret(config_dir)?,
        Commands::Config => commands::setup::print_config(config_dir)?,
        Commands::Analyze { floorplan } => commands::analyze::run(config_dir, &floorplan).await?,
        Commands::Render(args) => commands::render::run(config_dir, args).await?,
    }

    Ok(())
}
