use chrono::{Duration, Local, NaiveDate};

/// Days a book stays checked out before it is auto-returned.
pub const LOAN_DAYS: i64 = 14;

/// Format of `return_date` in `checked_out_books`.
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d";

pub fn today() -> NaiveDate {
	Local::now().date_naive()
}

pub fn return_date_from(day: NaiveDate) -> NaiveDate {
	day + Duration::days(LOAN_DAYS)
}

pub fn to_sql(date: NaiveDate) -> String {
	date.format(SQL_DATE_FORMAT).to_string()
}

pub fn to_str_long(date: NaiveDate) -> String {
	date.format("%-d %b %Y").to_string()
}

// negative once the loan is overdue
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
	(date - today).num_days()
}
