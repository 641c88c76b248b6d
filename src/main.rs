mod cli;

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Cli, Commands};
use iv_core::config::Config;
use std::path::{Path, PathBuf};

fn start_server(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    db: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path);

    // CLI flags win over the config file.
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(db) = db {
        config.server.db_path = db;
    }

    tracing::info!(
        "Starting imagevault on {}:{}",
        config.server.host,
        config.server.port
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(iv_server::start(config))?;
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        bail!("no config file given; pass one as an argument or via --config");
    };

    let contents = std::fs::read_to_string(path)?;
    let config = Config::from_json(&contents)?;

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("{}: OK", path.display());
    } else {
        for warning in &warnings {
            println!("warning: {warning}");
        }
        println!("{}: valid with {} warning(s)", path.display(), warnings.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "imagevault=trace,iv_server=trace,iv_db=debug,iv_core=debug,tower_http=debug".to_string()
        } else {
            "imagevault=info,iv_server=info,iv_db=info,iv_core=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt().with_env_filter(&env_filter).init();

    match cli.command {
        Commands::Start { host, port, db } => start_server(cli.config.as_deref(), host, port, db),
        Commands::Validate { config } => {
            let path = config.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("imagevault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
