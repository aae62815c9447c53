use std::{io::Write, path::PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shelf_service::{CancellationToken, RerankPipeline, SearchRequest};

/// Prints the reranked shortlist for one query as JSON.
#[derive(Debug, Parser)]
#[command(
	version = shelf_cli::VERSION,
	rename_all = "kebab",
	styles = shelf_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Candidates to recall before reranking. Defaults to `search.top_k`.
	#[arg(long, value_name = "N", allow_negative_numbers = true)]
	pub top_k: Option<i64>,
	pub query: String,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = shelf_config::load(&args.config)?;

	init_tracing(&config);

	let pipeline = RerankPipeline::from_config(&config)?;
	let request = SearchRequest { query: args.query, top_k: args.top_k };
	let cancel = CancellationToken::new();

	tokio::spawn({
		let cancel = cancel.clone();

		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				cancel.cancel();
			}
		}
	});

	let result = pipeline.run(&request, &cancel).await.outcome?;
	let rendered = serde_json::to_string_pretty(&result)?;
	let mut stdout = std::io::stdout().lock();

	writeln!(stdout, "{rendered}")?;

	Ok(())
}

fn init_tracing(config: &shelf_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_query_and_top_k() {
		let args =
			Args::try_parse_from(["shelf-search", "-c", "shelf.toml", "--top-k", "40", "oat milk"])
				.expect("Failed to parse args.");

		assert_eq!(args.config, PathBuf::from("shelf.toml"));
		assert_eq!(args.top_k, Some(40));
		assert_eq!(args.query, "oat milk");
	}

	#[test]
	fn negative_top_k_reaches_validation() {
		let args = Args::try_parse_from(["shelf-search", "-c", "shelf.toml", "--top-k", "-5", "tea"])
			.expect("Failed to parse args.");

		assert_eq!(args.top_k, Some(-5));
	}

	#[test]
	fn query_is_required() {
		assert!(Args::try_parse_from(["shelf-search", "-c", "shelf.toml"]).is_err());
	}
}
