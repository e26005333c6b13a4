use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};

/// Handle on the catalog database file.
///
/// Holds no open connection: every operation asks for a fresh one with
/// [`DB::get_db_connection`] and closes it when done.
#[derive(Debug, Clone)]
pub struct DB {
	path: PathBuf,
	options: SqliteConnectOptions,
}

pub fn open(path: impl AsRef<Path>) -> DB {
	let path = path.as_ref().to_path_buf();
	let options = SqliteConnectOptions::new()
		.filename(&path)
		.create_if_missing(true);
	DB { path, options }
}

impl DB {
	pub fn path(&self) -> &Path {
		&self.path
	}

	pub async fn get_db_connection(&self) -> Result<SqliteConnection, sqlx::Error> {
		self.options.connect().await
	}

	// safe to call on every startup
	pub async fn create_database(&self) -> Result<(), sqlx::Error> {
		let mut conn = self.get_db_connection().await?;
		for statement in TABLE_SCHEMA {
			sqlx::query(statement).execute(&mut conn).await?;
		}
		conn.close().await?;
		tracing::debug!(path = %self.path.display(), "database schema ready");
		Ok(())
	}
}

pub const TABLE_SCHEMA: [&str; 2] = [
r#"
CREATE TABLE IF NOT EXISTS books (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL,
	author TEXT NOT NULL,
	genre TEXT NOT NULL,
	year INTEGER NOT NULL
);
"#,
r#"
CREATE TABLE IF NOT EXISTS checked_out_books (
	id INTEGER PRIMARY KEY,
	title TEXT NOT NULL,
	author TEXT NOT NULL,
	genre TEXT NOT NULL,
	year INTEGER NOT NULL,
	return_date TEXT NOT NULL
);
"#,
];

/*

[sidebar] add book
INSERT INTO books
	(title, author, genre, year)
VALUES
	(?, ?, ?, ?);

[catalog] check out -- copy of the books row, due in 14 days
INSERT INTO checked_out_books
	(id, title, author, genre, year, return_date)
VALUES
	(?, ?, ?, ?, ?, ?);

[render] auto return -- dates are YYYY-MM-DD so text order is date order
DELETE FROM checked_out_books
WHERE
	return_date < ?;

*/

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn create_database_is_idempotent() {
		let dir = tempfile::tempdir().unwrap();
		let db = open(dir.path().join("library.db"));

		db.create_database().await.unwrap();
		db.create_database().await.unwrap();

		let mut conn = db.get_db_connection().await.unwrap();
		let tables: Vec<String> = sqlx::query_scalar(
			"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
		).fetch_all(&mut conn).await.unwrap();
		assert_eq!(tables, vec!["books", "checked_out_books"]);
	}

	#[tokio::test]
	async fn database_file_is_created_when_absent() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("fresh.db");
		assert!(!path.exists());

		open(&path).create_database().await.unwrap();
		assert!(path.exists());
	}
}
