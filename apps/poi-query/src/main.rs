use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = poi_query::Args::parse();

	poi_query::run(args).await
}
