// Daybook Task Extraction Engine
// Main entry point for the daybook binary

use clap::Parser;
use daybook_engine::cli::{Cli, Command, ConfigAction};
use daybook_engine::config::Config;
use daybook_engine::handlers::{
    handle_config_show, handle_config_validate, handle_doctor, handle_extract, handle_status,
    OutputFormat,
};
use daybook_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize basic telemetry first (before config is loaded)
    init_telemetry();

    tracing::debug!("Daybook Engine v{}", env!("CARGO_PKG_VERSION"));

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // Re-initialize telemetry with the requested log level
    // (only takes effect if RUST_LOG env var is not set)
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    match cli.command {
        Command::Extract {
            file,
            source,
            publish,
            simulate,
        } => {
            tracing::info!("Extracting tasks from {:?}", file);
            handle_extract(file, source, publish, simulate, &config, format).await
        }

        Command::Status => handle_status(&config, format).await,

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Validate => handle_config_validate(&config, format),
        },
    }
}
