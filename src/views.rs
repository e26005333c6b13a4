use axum::http::StatusCode;
use maud::{html, Markup, DOCTYPE};

use crate::session::Notice;
use crate::time;
use crate::types::{Book, CatalogEntry, YEAR_RANGE};

pub const APP_TITLE: &str = "Library Management System";

/// Everything the logged-in page may show besides the forms.
#[derive(Debug, Default)]
pub struct Dashboard<'a> {
	pub notice: Option<&'a Notice>,
	pub catalog: Option<Vec<CatalogEntry>>,
	pub search: Option<SearchResults>,
	pub answer: Option<Answer>,
}

#[derive(Debug)]
pub struct SearchResults {
	pub query: String,
	pub books: Vec<Book>,
}

#[derive(Debug)]
pub struct Answer {
	pub question: String,
	pub text: String,
}

fn layout(sidebar: Markup, main: Markup) -> Markup {
	html! {
		(DOCTYPE)
		html lang="en" {
			head {
				meta charset="utf-8";
				title { (APP_TITLE) }
				link rel="stylesheet" href="/static/style.css";
			}
			body {
				aside.sidebar { (sidebar) }
				main { (main) }
			}
		}
	}
}

fn notice(notice: Option<&Notice>) -> Markup {
	html! {
		@if let Some(notice) = notice {
			div class=(notice.level.css_class()) { (notice.text) }
		}
	}
}

fn login_form() -> Markup {
	html! {
		h2 { "Login" }
		form method="POST" action="/login" {
			label { "Username" input name="username" type="text" autocomplete="username"; }
			label { "Password" input name="password" type="password" autocomplete="current-password"; }
			button { "Login" }
		}
	}
}

fn add_book_form() -> Markup {
	html! {
		h2 { "Manage Books" }
		form method="POST" action="/books" {
			label { "Title" input name="title" type="text"; }
			label { "Author" input name="author" type="text"; }
			label { "Genre" input name="genre" type="text"; }
			label {
				"Year"
				input name="year" type="number" value="0" step="1" required
					min=(YEAR_RANGE.start()) max=(YEAR_RANGE.end());
			}
			button { "Add Book" }
		}
	}
}

pub fn login_page(pending: Option<&Notice>) -> Markup {
	layout(
		html! {
			(login_form())
			(notice(pending))
		},
		html! {
			h1 { (APP_TITLE) }
			div class="notice warning" { "Please log in to access the system." }
		},
	)
}

pub fn dashboard(view: &Dashboard) -> Markup {
	layout(
		html! {
			(login_form())
			(notice(view.notice))
			(add_book_form())
		},
		html! {
			h1 { (APP_TITLE) }

			section.search {
				h2 { "Search Books" }
				form method="GET" action="/search" {
					input name="q" type="search" placeholder="Enter book title, author, or genre"
						value=[view.search.as_ref().map(|s| s.query.as_str())];
					button { "Search" }
				}
				@if let Some(search) = &view.search {
					(search_results(search))
				}
			}

			section.catalog {
				form method="GET" action="/" {
					input type="hidden" name="view" value="catalog";
					button { "View Books" }
				}
				@if let Some(catalog) = &view.catalog {
					(catalog_list(catalog))
				}
			}

			section.assistant {
				h2 { "Ask the Library Assistant" }
				form method="POST" action="/assistant" {
					input name="title" type="text" placeholder="Ask me about a book";
					button { "Get Answer" }
				}
				@if let Some(answer) = &view.answer {
					article.answer {
						h3 { (answer.question) }
						@for paragraph in answer.text.split("\n\n") {
							p { (paragraph) }
						}
					}
				}
			}
		},
	)
}

fn search_results(search: &SearchResults) -> Markup {
	html! {
		@if search.books.is_empty() {
			div class="notice warning" { "No books found." }
		} @else {
			ul.books {
				@for book in &search.books {
					li {
						h3 { (book.title) " by " (book.author) }
						p { "Genre: " (book.genre) ", Year: " (book.year) }
					}
				}
			}
		}
	}
}

fn catalog_list(catalog: &[CatalogEntry]) -> Markup {
	let today = time::today();
	html! {
		h2 { "Book Catalog" }
		@if catalog.is_empty() {
			p { "The catalog is empty." }
		}
		ul.books {
			@for entry in catalog {
				@let book = &entry.book;
				li id={ "book-" (book.id) } {
					h3 { (book.title) " by " (book.author) }
					p { "Genre: " (book.genre) ", Year: " (book.year) }
					@if let Some(due) = entry.due {
						p.due {
							"Checked out, due " (time::to_str_long(due))
							" (" (days_left(time::days_until(due, today))) ")"
						}
					}
					div.actions {
						form method="POST" action={ "/books/" (book.id) "/checkout" } {
							button { "Check Out " (book.title) }
						}
						form method="POST" action={ "/books/" (book.id) "/checkin" } {
							button { "Check In " (book.title) }
						}
						form method="POST" action={ "/books/" (book.id) "/delete" } {
							button.danger { "Delete " (book.title) }
						}
					}
				}
			}
		}
	}
}

fn days_left(days: i64) -> String {
	match days {
		0 => "due today".to_string(),
		1 => "1 day left".to_string(),
		n if n < 0 => "overdue".to_string(),
		n => format!("{n} days left"),
	}
}

pub fn error_page(status: StatusCode, message: &str) -> Markup {
	layout(
		html! {
			a href="/" { "Back to the catalog" }
		},
		html! {
			h1 { (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error")) }
			div class="notice error" { (message) }
		},
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn days_left_wording() {
		assert_eq!(days_left(14), "14 days left");
		assert_eq!(days_left(1), "1 day left");
		assert_eq!(days_left(0), "due today");
		assert_eq!(days_left(-2), "overdue");
	}

	#[test]
	fn year_input_is_required() {
		let page = dashboard(&Dashboard::default()).into_string();
		assert!(page.contains(r#"name="year" type="number" value="0" step="1" required"#));
	}
}
