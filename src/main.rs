// visiontune - Web control panel for the vision process
// Edits the cone/cube HSV threshold files and switches the process between run, tune and restart
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod httpd;
mod mode;
mod pages;
mod params;
mod types;

use config::{Args, PanelConfig};

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg_arg = args.cfg.as_deref();
    let config_path = PanelConfig::config_path(cfg_arg)?;
    let config_file_exists = config_path.exists();

    let mut config = if config_file_exists {
        match PanelConfig::load_from(config_path.clone()) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config file: {:#}", e);
                eprintln!("Please fix the config file or delete it to regenerate with defaults.");
                return Err(e);
            }
        }
    } else {
        PanelConfig {
            config_path: Some(config_path.clone()),
            ..PanelConfig::default()
        }
    };

    let args_provided = config.merge_with_args(&args);

    if args.print_config {
        print!("{}", config.to_toml());
        return Ok(());
    }

    init_logging(&config.log_level);

    // Persist on first run, or when the command line changed something
    if !config_file_exists || args_provided {
        config.save()?;
    }
    tracing::info!("Using config file: {}", config_path.display());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let state = httpd::AppState::open(config)?;
        httpd::run_http_server(state).await
    })
}
