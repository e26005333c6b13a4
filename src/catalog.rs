//! Catalog operations over the `books` and `checked_out_books` tables.
//!
//! Each function opens its own connection and commits statement by
//! statement; there is no surrounding transaction.

use chrono::NaiveDate;
use sqlx::Connection;
use tracing::{debug, info};

use crate::sql::DB;
use crate::time;
use crate::types::{Bid, Book, CheckOut, CheckedOutBook};

pub async fn add_book(
	db: &DB,
	title: &str, author: &str, genre: &str, year: i64,
) -> Result<Bid, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;
	let id = sqlx::query("INSERT INTO books (title, author, genre, year) VALUES (?, ?, ?, ?)")
		.bind(title)
		.bind(author)
		.bind(genre)
		.bind(year)
		.execute(&mut conn).await?
		.last_insert_rowid();
	conn.close().await?;

	info!(id, title, "book added");
	Ok(id)
}

// on Ok returns whether the book existed
pub async fn delete_book(db: &DB, id: Bid) -> Result<bool, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;
	let removed = sqlx::query("DELETE FROM books WHERE id = ?")
		.bind(id)
		.execute(&mut conn).await?
		.rows_affected();
	sqlx::query("DELETE FROM checked_out_books WHERE id = ?")
		.bind(id)
		.execute(&mut conn).await?;
	conn.close().await?;

	if removed > 0 {
		info!(id, "book deleted");
	} else {
		debug!(id, "delete of unknown book ignored");
	}
	Ok(removed > 0)
}

pub async fn get_books(db: &DB) -> Result<Vec<Book>, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;
	let books = sqlx::query_as::<_, Book>("SELECT id, title, author, genre, year FROM books ORDER BY id")
		.fetch_all(&mut conn).await?;
	conn.close().await?;
	Ok(books)
}

/// Books whose title, author or genre contains `query`, ignoring ASCII case.
///
/// `%`, `_` and `\` in the query match themselves. An empty query matches
/// every book.
pub async fn search_books(db: &DB, query: &str) -> Result<Vec<Book>, sqlx::Error> {
	let pattern = like_pattern(query);
	let mut conn = db.get_db_connection().await?;
	let books = sqlx::query_as::<_, Book>(r#"
SELECT id, title, author, genre, year
FROM books
WHERE
	title LIKE ? ESCAPE '\'
	OR author LIKE ? ESCAPE '\'
	OR genre LIKE ? ESCAPE '\'
ORDER BY id
	"#)
		.bind(&pattern)
		.bind(&pattern)
		.bind(&pattern)
		.fetch_all(&mut conn).await?;
	conn.close().await?;

	debug!(query, hits = books.len(), "catalog searched");
	Ok(books)
}

fn like_pattern(query: &str) -> String {
	let mut pattern = String::with_capacity(query.len() + 2);
	pattern.push('%');
	for chr in query.chars() {
		if matches!(chr, '%' | '_' | '\\') {
			pattern.push('\\');
		}
		pattern.push(chr);
	}
	pattern.push('%');
	pattern
}

pub async fn check_out_book(db: &DB, id: Bid) -> Result<CheckOut, sqlx::Error> {
	check_out_book_on(db, id, time::today()).await
}

/// Copies the book into `checked_out_books`, due [`time::LOAN_DAYS`] after `today`.
///
/// An active loan is left untouched and reported as
/// [`CheckOut::AlreadyCheckedOut`].
pub async fn check_out_book_on(db: &DB, id: Bid, today: NaiveDate) -> Result<CheckOut, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;

	let book = sqlx::query_as::<_, Book>("SELECT id, title, author, genre, year FROM books WHERE id = ?")
		.bind(id)
		.fetch_optional(&mut conn).await?;
	let Some(book) = book else {
		conn.close().await?;
		debug!(id, "check out of unknown book ignored");
		return Ok(CheckOut::NotFound);
	};

	let active: Option<NaiveDate> = sqlx::query_scalar("SELECT return_date FROM checked_out_books WHERE id = ?")
		.bind(id)
		.fetch_optional(&mut conn).await?;
	if let Some(return_date) = active {
		conn.close().await?;
		debug!(id, %return_date, "book already checked out");
		return Ok(CheckOut::AlreadyCheckedOut(return_date));
	}

	let return_date = time::return_date_from(today);
	sqlx::query(r#"
INSERT INTO checked_out_books
	(id, title, author, genre, year, return_date)
VALUES
	(?, ?, ?, ?, ?, ?)
	"#)
		.bind(book.id)
		.bind(&book.title)
		.bind(&book.author)
		.bind(&book.genre)
		.bind(book.year)
		.bind(time::to_sql(return_date))
		.execute(&mut conn).await?;
	conn.close().await?;

	info!(id, title = %book.title, %return_date, "book checked out");
	Ok(CheckOut::CheckedOut(return_date))
}

// on Ok returns whether a loan was closed
pub async fn check_in_book(db: &DB, id: Bid) -> Result<bool, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;
	let removed = sqlx::query("DELETE FROM checked_out_books WHERE id = ?")
		.bind(id)
		.execute(&mut conn).await?
		.rows_affected();
	conn.close().await?;

	if removed > 0 {
		info!(id, "book checked in");
	}
	Ok(removed > 0)
}

pub async fn auto_return_books(db: &DB) -> Result<u64, sqlx::Error> {
	auto_return_books_on(db, time::today()).await
}

/// Ends every loan whose return date is strictly before `today`.
pub async fn auto_return_books_on(db: &DB, today: NaiveDate) -> Result<u64, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;
	let returned = sqlx::query("DELETE FROM checked_out_books WHERE return_date < ?")
		.bind(time::to_sql(today))
		.execute(&mut conn).await?
		.rows_affected();
	conn.close().await?;

	if returned > 0 {
		info!(returned, "overdue books auto-returned");
	}
	Ok(returned)
}

pub async fn get_checked_out_books(db: &DB) -> Result<Vec<CheckedOutBook>, sqlx::Error> {
	let mut conn = db.get_db_connection().await?;
	let loans = sqlx::query_as::<_, CheckedOutBook>(
		"SELECT id, title, author, genre, year, return_date FROM checked_out_books ORDER BY return_date, id"
	).fetch_all(&mut conn).await?;
	conn.close().await?;
	Ok(loans)
}
