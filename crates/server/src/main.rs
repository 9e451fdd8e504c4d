mod api;
mod cli;
mod duration;
mod router;
mod sources;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use cli::{Cli, Command};

fn load_config() -> oncall_core::Config {
    oncall_core::config::load_dotenv();
    oncall_core::Config::from_env()
}

async fn serve(config: oncall_core::Config) -> anyhow::Result<()> {
    config.log_summary();

    let state = Arc::new(state::AppState::new(config)?);
    match state.sources() {
        Ok(sources) => info!("Serving {} rotation sources", sources.len()),
        Err(e) => tracing::warn!("Rotation sources unavailable: {}; /now will fail until fixed", e),
    }

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(load_config()).await?,
        Command::Check { file, at } => print!("{}", cli::check(&file, at)?),
    }

    Ok(())
}
