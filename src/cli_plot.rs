use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use fishery_stats_server::chart::{render_line_chart, ChartSpec};
use fishery_stats_server::cli::{parse_path, CommonArgs};
use fishery_stats_server::config::{AppConfig, DerivedSeries};
use fishery_stats_server::logging::init_logging;
use fishery_stats_server::QueryService;

#[derive(Parser, Debug)]
#[clap(about = "Renders the derived series as SVG line charts")]
struct CliArgs {
    #[clap(flatten)]
    pub common: CommonArgs,

    /// Directory the SVG files are written to.
    #[clap(long, value_parser = parse_path)]
    pub chart_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    let mut cli_config = cli_args.common.to_cli_config();
    cli_config.chart_dir = cli_args.chart_dir.clone();
    let config = AppConfig::load(&cli_config, cli_args.common.config.as_deref())?;

    let _log_guard = init_logging(config.log_dir.as_deref())?;

    std::fs::create_dir_all(&config.chart_dir)
        .with_context(|| format!("Failed to create chart directory {:?}", config.chart_dir))?;
    let dataset = Arc::new(config.dataset.clone());
    let query = QueryService::new(&config.db_path, dataset.clone());

    let mut written = 0;
    for series in DerivedSeries::ALL {
        let table = dataset.derived_table(series);
        let rows = match query.fetch_derived(series, None, None) {
            Ok(rows) => rows,
            Err(err) => {
                error!("Cannot read '{}': {}", table, err);
                continue;
            }
        };
        if rows.is_empty() {
            warn!("No data found for table '{}'", table);
            continue;
        }

        let spec = ChartSpec::for_series(series, &dataset);
        match render_line_chart(&spec, &rows) {
            Ok(svg) => {
                let path = config.chart_dir.join(format!("{}.svg", table));
                std::fs::write(&path, svg)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                info!("Wrote chart '{}' to {:?}", spec.title, path);
                written += 1;
            }
            Err(err) => error!("Failed to render chart for '{}': {}", table, err),
        }
    }

    info!("{} of {} charts written", written, DerivedSeries::ALL.len());
    Ok(())
}
