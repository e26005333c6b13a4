use chrono::NaiveDate;
use serde::Deserialize;

pub type Bid = i64;

/// Lowest and highest publication year the add-book form accepts.
pub const YEAR_RANGE: std::ops::RangeInclusive<i64> = 0..=2100;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Book {
	pub id: Bid,
	pub title: String,
	pub author: String,
	pub genre: String,
	pub year: i64,
}

/// Row of `checked_out_books`: a copy of the book as it was when checked out.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CheckedOutBook {
	pub id: Bid,
	pub title: String,
	pub author: String,
	pub genre: String,
	pub year: i64,
	pub return_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOut {
	CheckedOut(NaiveDate),
	AlreadyCheckedOut(NaiveDate),
	NotFound,
}

/// A catalog line: the book and, while it is checked out, its due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
	pub book: Book,
	pub due: Option<NaiveDate>,
}

#[derive(Deserialize, Debug)]
pub struct FormLogin {
	pub username: String,
	pub password: String,
}

// year stays text so a blank or garbled field reaches the handler
#[derive(Deserialize, Debug)]
pub struct NewBookForm {
	pub title: String,
	pub author: String,
	pub genre: String,
	#[serde(default)]
	pub year: String,
}

impl NewBookForm {
	/// The year as a number within [`YEAR_RANGE`], or the message to show.
	pub fn year(&self) -> Result<i64, String> {
		let out_of_range = || format!(
			"Year must be between {} and {}, got {:?}.",
			YEAR_RANGE.start(), YEAR_RANGE.end(), self.year,
		);
		let year: i64 = self.year.trim().parse().map_err(|_| out_of_range())?;
		if !YEAR_RANGE.contains(&year) {
			return Err(out_of_range());
		}
		Ok(year)
	}
}

#[derive(Deserialize, Debug, Default)]
pub struct DashboardParams {
	pub view: Option<String>,
}

impl DashboardParams {
	pub fn wants_catalog(&self) -> bool {
		self.view.as_deref() == Some("catalog")
	}
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchParams {
	#[serde(default)]
	pub q: String,
}

#[derive(Deserialize, Debug)]
pub struct AssistantForm {
	pub title: String,
}
