use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use time::OffsetDateTime;

use poi_config::Config;
use poi_providers::HttpEmbedding;
use poi_service::{LoadReport, PoiService, RenameRequest, SearchRequest, dates, source};
use poi_storage::QdrantRecordStore;

#[derive(Debug, Parser)]
#[command(
	version = poi_cli::VERSION,
	rename_all = "kebab",
	styles = poi_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Load the configured CSV unless the collection already holds records.
	Load,
	/// Search within a creation window, printing one name per line.
	Search(SearchArgs),
	/// Alias the first record with an exact name, then search without a creation window.
	Rename(RenameArgs),
}

#[derive(Debug, clap::Args)]
pub struct Facets {
	#[arg(long = "city", value_name = "CITY")]
	pub cities: Vec<String>,
	#[arg(long = "category", value_name = "CATEGORY")]
	pub categories: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
	#[arg(long)]
	pub query: String,
	#[command(flatten)]
	pub facets: Facets,
	#[arg(long, value_parser = parse_date)]
	pub start: OffsetDateTime,
	#[arg(long, value_parser = parse_date)]
	pub end: Option<OffsetDateTime>,
}

#[derive(Debug, clap::Args)]
pub struct RenameArgs {
	#[arg(long)]
	pub query: String,
	#[arg(long = "target", value_name = "NAME")]
	pub target_name: String,
	#[arg(long, value_name = "NAME")]
	pub new_name: String,
	#[command(flatten)]
	pub facets: Facets,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = poi_config::load(&args.config)?;

	poi_cli::init_tracing(&config.service.log_level);

	let service = connect(&config).await?;
	let report = service
		.ensure_loaded(|| source::read_csv(&config.ingest.csv_path, &config.ingest.text_column))
		.await?;

	match args.command {
		Command::Load => println!("{}", describe(report)),
		Command::Search(search) => {
			let names = service
				.search(SearchRequest {
					query: search.query,
					cities: search.facets.cities,
					categories: search.facets.categories,
					start: search.start,
					end: search.end,
				})
				.await?;

			print_lines(&names);
		},
		Command::Rename(rename) => {
			let names = service
				.rename_and_search(RenameRequest {
					query: rename.query,
					target_name: rename.target_name,
					new_name: rename.new_name,
					cities: rename.facets.cities,
					categories: rename.facets.categories,
				})
				.await?;

			print_lines(&names);
		},
	}

	Ok(())
}

async fn connect(config: &Config) -> color_eyre::Result<PoiService> {
	let embedding = HttpEmbedding::new(config.providers.embedding.clone())?;
	let store = QdrantRecordStore::new(&config.storage.qdrant, Arc::new(embedding))?;

	store.ensure_collection().await?;

	tracing::info!(
		collection = %config.storage.qdrant.collection,
		url = %config.storage.qdrant.url,
		"Record store ready."
	);

	Ok(PoiService::from_config(config, Arc::new(store)))
}

fn parse_date(raw: &str) -> Result<OffsetDateTime, String> {
	dates::parse_timestamp(raw).ok_or_else(|| format!("unrecognized date {raw:?}"))
}

fn describe(report: LoadReport) -> String {
	if report.skipped {
		"Collection already populated. Nothing loaded.".to_string()
	} else {
		format!("Loaded {} records.", report.inserted)
	}
}

fn print_lines(lines: &[String]) {
	for line in lines {
		println!("{line}");
	}
}

#[cfg(test)]
mod tests {
	use clap::{CommandFactory, Parser};
	use time::macros::datetime;

	use super::*;

	#[test]
	fn cli_definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn search_collects_repeated_facets() {
		let args = Args::try_parse_from([
			"poi-query",
			"-c",
			"poi.toml",
			"search",
			"--query",
			"quiet cafe",
			"--city",
			"Taipei",
			"--city",
			"Tainan",
			"--category",
			"Cafe",
			"--start",
			"2019-01-01",
		])
		.expect("Arguments should parse.");
		let Command::Search(search) = args.command else {
			panic!("Expected the search subcommand.");
		};

		assert_eq!(search.facets.cities, vec!["Taipei".to_string(), "Tainan".to_string()]);
		assert_eq!(search.facets.categories, vec!["Cafe".to_string()]);
		assert_eq!(search.start, datetime!(2019-01-01 0:00 UTC));
		assert_eq!(search.end, None);
	}

	#[test]
	fn rename_takes_target_and_new_name() {
		let args = Args::try_parse_from([
			"poi-query",
			"-c",
			"poi.toml",
			"rename",
			"--query",
			"quiet cafe",
			"--target",
			"Old Cafe",
			"--new-name",
			"New Cafe Name",
		])
		.expect("Arguments should parse.");
		let Command::Rename(rename) = args.command else {
			panic!("Expected the rename subcommand.");
		};

		assert_eq!(rename.target_name, "Old Cafe");
		assert_eq!(rename.new_name, "New Cafe Name");
		assert!(rename.facets.cities.is_empty());
	}

	#[test]
	fn malformed_start_is_rejected() {
		let result = Args::try_parse_from([
			"poi-query", "-c", "poi.toml", "search", "--query", "q", "--start", "soon",
		]);

		assert!(result.is_err());
	}

	#[test]
	fn load_report_is_described() {
		assert_eq!(describe(LoadReport { inserted: 3, skipped: false }), "Loaded 3 records.");
		assert!(describe(LoadReport { inserted: 0, skipped: true }).contains("already populated"));
	}
}
