use std::{io::Read, path::Path};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{Error, Result};

pub const COLUMN_NAME: &str = "Name";
pub const COLUMN_CATEGORY: &str = "Type";
pub const COLUMN_ADDRESS: &str = "Address";
pub const COLUMN_PHONE: &str = "Tel";
pub const COLUMN_CITY: &str = "City";
pub const COLUMN_TOWN: &str = "Town";
pub const COLUMN_CREATED_AT: &str = "CreateDate";

/// One source row with every field still in its textual form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
	pub name: String,
	pub category: String,
	pub address: String,
	pub phone: String,
	pub city: String,
	pub town: String,
	pub created_at: String,
	/// Content that gets embedded.
	pub text: String,
	pub file_name: Option<String>,
}

struct Columns {
	name: usize,
	category: usize,
	address: usize,
	phone: usize,
	city: usize,
	town: usize,
	created_at: usize,
	text: usize,
}
impl Columns {
	fn locate(headers: &StringRecord, text_column: &str) -> Result<Self> {
		let find = |column: &str| {
			headers
				.iter()
				.position(|header| header.trim_start_matches('\u{feff}') == column)
				.ok_or_else(|| Error::MissingColumn { column: column.to_string() })
		};

		Ok(Self {
			name: find(COLUMN_NAME)?,
			category: find(COLUMN_CATEGORY)?,
			address: find(COLUMN_ADDRESS)?,
			phone: find(COLUMN_PHONE)?,
			city: find(COLUMN_CITY)?,
			town: find(COLUMN_TOWN)?,
			created_at: find(COLUMN_CREATED_AT)?,
			text: find(text_column)?,
		})
	}

	fn row(&self, record: &StringRecord, file_name: Option<&str>) -> RawRow {
		let field = |index: usize| record.get(index).unwrap_or_default().to_string();

		RawRow {
			name: field(self.name),
			category: field(self.category),
			address: field(self.address),
			phone: field(self.phone),
			city: field(self.city),
			town: field(self.town),
			created_at: field(self.created_at),
			text: field(self.text),
			file_name: file_name.map(str::to_string),
		}
	}
}

/// Reads every row of the CSV file at `path`. The file name is kept on each row as provenance.
pub fn read_csv(path: &Path, text_column: &str) -> Result<Vec<RawRow>> {
	let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned());
	let file = std::fs::File::open(path).map_err(csv::Error::from)?;

	read_csv_from(file, text_column, file_name.as_deref())
}

pub fn read_csv_from<R>(
	reader: R,
	text_column: &str,
	file_name: Option<&str>,
) -> Result<Vec<RawRow>>
where
	R: Read,
{
	let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
	let columns = Columns::locate(reader.headers()?, text_column)?;
	let mut rows = Vec::new();

	for record in reader.records() {
		rows.push(columns.row(&record?, file_name));
	}

	tracing::debug!(rows = rows.len(), file_name, "Source rows read.");

	Ok(rows)
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE: &str = "\u{feff}ID,Name,Type,Address,Tel,City,Town,CreateDate,HostWords\n\
		1, Old Cafe ,Cafe,1 Road,02-0000,Taipei,Daan,2020-01-01,quiet coffee\n\
		2,Tea Shop,Tea,2 Road,02-1111,Tainan,East,2021/3/4,oolong tea\n";

	#[test]
	fn maps_columns_by_header() {
		let rows = read_csv_from(SAMPLE.as_bytes(), "HostWords", Some("sample.csv"))
			.expect("Sample should parse.");

		assert_eq!(rows.len(), 2);
		assert_eq!(rows[0].name, "Old Cafe");
		assert_eq!(rows[0].category, "Cafe");
		assert_eq!(rows[0].phone, "02-0000");
		assert_eq!(rows[0].text, "quiet coffee");
		assert_eq!(rows[0].file_name.as_deref(), Some("sample.csv"));
		assert_eq!(rows[1].created_at, "2021/3/4");
		assert_eq!(rows[1].town, "East");
	}

	#[test]
	fn custom_text_column_must_exist() {
		let err = read_csv_from(SAMPLE.as_bytes(), "Description", None)
			.expect_err("Missing column should fail.");

		assert!(matches!(err, Error::MissingColumn { column } if column == "Description"));
	}

	#[test]
	fn header_only_source_yields_no_rows() {
		let header = "Name,Type,Address,Tel,City,Town,CreateDate,HostWords\n";
		let rows = read_csv_from(header.as_bytes(), "HostWords", None)
			.expect("Header-only source should parse.");

		assert!(rows.is_empty());
	}
}
