mod cli;

use gallery::config::{self, StoreBackend};
use gallery::server;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    memory_store: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;
    config::apply_env_overrides(&mut config);

    // CLI flags win over file and environment
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if memory_store {
        config.media_store.backend = StoreBackend::Memory;
        tracing::warn!("Using in-memory media store; uploads are lost on exit");
    }

    config::validate_config(&config)?;

    tracing::info!("Starting gallery server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "gallery=trace,gallery_db=debug,tower_http=debug".to_string()
        } else {
            "gallery=debug,gallery_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start {
            host,
            port,
            memory_store,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, memory_store, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("gallery {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let mut config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };
    config::apply_env_overrides(&mut config);
    config::validate_config(&config)?;

    let store = &config.media_store;
    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Upload limit: {} bytes", config.server.max_upload_bytes);
    println!("  Media store: {:?} (folder {})", store.backend, store.folder);
    if store.backend == StoreBackend::Cloudinary {
        println!("  Cloud name: {}", store.cloud_name);
    }

    Ok(())
}
