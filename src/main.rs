use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

use fishery_stats_server::cli::CommonArgs;
use fishery_stats_server::config::AppConfig;
use fishery_stats_server::logging::init_logging;
use fishery_stats_server::{run_server, QueryService, RequestsLoggingLevel, ServerConfig};

#[derive(Parser, Debug)]
struct CliArgs {
    #[clap(flatten)]
    pub common: CommonArgs,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let mut cli_config = cli_args.common.to_cli_config();
    cli_config.port = cli_args.port;
    cli_config.logging_level = cli_args.logging_level;
    let config = AppConfig::load(&cli_config, cli_args.common.config.as_deref())?;

    let _log_guard = init_logging(config.log_dir.as_deref())?;

    if !config.db_path.exists() {
        warn!(
            "Database {:?} does not exist yet, requests will answer 404 until the import runs",
            config.db_path
        );
    }

    let query = QueryService::new(&config.db_path, Arc::new(config.dataset.clone()));
    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
    };

    info!("Starting server on port {}...", config.port);
    run_server(server_config, query).await
}
