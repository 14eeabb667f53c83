// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use sphere_stream::config;
use sphere_stream::openai::{self, OpenAiCompatSource};
use sphere_stream::server;
use sphere_stream::upstream::GenerationSource;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sphere-stream", about = "Streaming artifact relay for multi-agent chat")]
struct Cli {
    /// Path to the sphere.yaml config file
    #[arg(long, default_value = "sphere.yaml", env = "SPHERE_CONFIG")]
    config: String,

    /// Port to listen on (overrides server.port)
    #[arg(long, env = "SPHERE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let source = config::ConfigSource::File(std::path::PathBuf::from(&cli.config));
    let config = match config::load_config(&source) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(path = %cli.config, "failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        version = %config.version,
        base_url = %config.upstream.base_url,
        model = %config.upstream.model,
        default_role = %config.roles.default,
        api_key_set = config.upstream.api_key.is_some(),
        config_hash = %config.config_hash,
        "config loaded"
    );

    let port = cli.port.unwrap_or(config.server.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let client = match openai::build_client(&config.upstream) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("failed to build upstream client: {e}");
            std::process::exit(1);
        }
    };
    let generation: Arc<dyn GenerationSource> = Arc::new(OpenAiCompatSource::new(
        client,
        config.upstream.clone(),
        config.roles.clone(),
    ));

    let app = server::build_router(generation, &config.server);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(%addr, "failed to bind: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "sphere-stream listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
