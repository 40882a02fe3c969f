//! `panel-grid`: run a Monte Carlo grid from a TOML configuration file and
//! write the result table as JSON.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use panel_shrinkage::{
    GridConfig, run_grid,
    optimization::loglik_optimizer::LineSearcher,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "panel-grid")]
#[command(version)]
#[command(about = "Compare pooled, partially pooled and shrinkage forecasts on simulated panels", long_about = None)]
struct Cli {
    /// Grid configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Write the JSON result table here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Override the master seed from the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of replications per cell
    #[arg(short = 'b', long)]
    replications: Option<usize>,

    /// Line search for the REML fit (MoreThuente or HagerZhang)
    #[arg(long, value_name = "NAME")]
    line_search: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let text = fs::read_to_string(&cli.config)
        .with_context(|| format!("reading {}", cli.config.display()))?;
    let mut config = GridConfig::from_toml_str(&text)
        .with_context(|| format!("parsing {}", cli.config.display()))?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(b) = cli.replications {
        config.replications = b;
    }
    if let Some(name) = &cli.line_search {
        let ls: LineSearcher = name.parse()?;
        config.mle_opts = config.mle_opts.with_line_searcher(ls);
    }

    let table = run_grid(&config).context("running grid")?;
    let json = table.to_json_pretty().context("serializing results")?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), cells = table.len(), "results written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
