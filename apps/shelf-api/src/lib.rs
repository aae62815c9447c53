pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = shelf_cli::VERSION,
	rename_all = "kebab",
	styles = shelf_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = shelf_config::load(&args.config)?;

	init_tracing(&config);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(&config)?;
	let shutdown = state.shutdown.clone();
	let app = routes::router(state);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	tokio::spawn({
		let shutdown = shutdown.clone();

		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::info!("Shutdown requested.");
			}

			shutdown.cancel();
		}
	});

	axum::serve(listener, app).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

	Ok(())
}

fn init_tracing(config: &shelf_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
