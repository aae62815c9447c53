use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = shelf_search::Args::parse();

	shelf_search::run(args).await
}
