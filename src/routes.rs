use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use axum::{
	Form, Router,
	extract::{Path as UrlPath, Query, State},
	response::{IntoResponse, Redirect, Response},
	routing::{get, post},
};
use maud::Markup;
use tower_cookies::{CookieManagerLayer, Cookies};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::assistant::AssistantClient;
use crate::catalog;
use crate::error::{AppError, AppResult};
use crate::session::{Credentials, LoginOutcome, Notice, SessionStore};
use crate::sql::DB;
use crate::types::{
	AssistantForm, Bid, CatalogEntry, CheckOut, DashboardParams, FormLogin, NewBookForm,
	SearchParams,
};
use crate::views::{self, Answer, Dashboard, SearchResults};

#[derive(Clone)]
pub struct AppState {
	pub db: DB,
	pub assistant: AssistantClient,
	pub sessions: SessionStore,
	credentials: Arc<Credentials>,
}

impl AppState {
	pub fn new(db: DB, assistant: AssistantClient, credentials: Credentials) -> Self {
		AppState {
			db,
			assistant,
			sessions: SessionStore::default(),
			credentials: Arc::new(credentials),
		}
	}
}

pub fn app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
	Router::new()
		.route("/", get(display_dashboard))
		.route("/login", post(perform_login))
		.route("/books", post(add_book))
		.route("/books/:id/checkout", post(check_out_book))
		.route("/books/:id/checkin", post(check_in_book))
		.route("/books/:id/delete", post(delete_book))
		.route("/search", get(perform_search))
		.route("/assistant", post(ask_assistant))
		.nest_service("/static", ServeDir::new(static_dir.as_ref()))
		.layer(CookieManagerLayer::new())
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn require_login(state: &AppState, cookies: &Cookies) -> AppResult<Uuid> {
	let (id, session) = state.sessions.load(cookies).await;
	if !session.authenticated {
		return Err(AppError::Unauthenticated);
	}
	Ok(id)
}

async fn refresh_with(state: &AppState, id: Uuid, notice: Option<Notice>) {
	state.sessions.update(id, |session| (session.mark_refresh(notice), ())).await;
}

// every logged-in render starts here, before any catalog read
async fn start_render(state: &AppState) -> AppResult<()> {
	catalog::auto_return_books(&state.db).await?;
	Ok(())
}

async fn load_catalog(db: &DB) -> AppResult<Vec<CatalogEntry>> {
	let books = catalog::get_books(db).await?;
	let due: HashMap<Bid, _> = catalog::get_checked_out_books(db).await?
		.into_iter()
		.map(|loan| (loan.id, loan.return_date))
		.collect();

	Ok(books.into_iter()
		.map(|book| {
			let due = due.get(&book.id).copied();
			CatalogEntry { book, due }
		})
		.collect())
}

async fn display_dashboard(
	State(state): State<AppState>,
	cookies: Cookies,
	Query(params): Query<DashboardParams>,
) -> AppResult<Markup> {
	let (id, _) = state.sessions.load(&cookies).await;
	let (authenticated, refresh) = state.sessions.update(id, |session| {
		let (session, refresh) = session.take_refresh();
		let authenticated = session.authenticated;
		(session, (authenticated, refresh))
	}).await;

	if !authenticated {
		return Ok(views::login_page(refresh.notice.as_ref()));
	}
	if refresh.requested {
		debug!(%id, "redrawing catalog after change");
	}

	start_render(&state).await?;
	let catalog = if params.wants_catalog() || refresh.requested {
		Some(load_catalog(&state.db).await?)
	} else {
		None
	};
	Ok(views::dashboard(&Dashboard {
		notice: refresh.notice.as_ref(),
		catalog,
		..Dashboard::default()
	}))
}

async fn perform_login(
	State(state): State<AppState>,
	cookies: Cookies,
	Form(login): Form<FormLogin>,
) -> AppResult<Response> {
	let (id, _) = state.sessions.load(&cookies).await;
	let (outcome, authenticated) = state.sessions.update(id, |session| {
		let (session, outcome) = session.login(&state.credentials, &login.username, &login.password);
		let authenticated = session.authenticated;
		(session, (outcome, authenticated))
	}).await;

	match outcome {
		LoginOutcome::Accepted => {
			info!(%id, username = %login.username, "login");
			Ok(Redirect::to("/").into_response())
		}
		LoginOutcome::Rejected => {
			warn!(%id, username = %login.username, "invalid login");
			let failure = Notice::error("Invalid username or password");
			if authenticated {
				start_render(&state).await?;
				Ok(views::dashboard(&Dashboard {
					notice: Some(&failure),
					..Dashboard::default()
				}).into_response())
			} else {
				Ok(views::login_page(Some(&failure)).into_response())
			}
		}
	}
}

async fn add_book(
	State(state): State<AppState>,
	cookies: Cookies,
	Form(book): Form<NewBookForm>,
) -> AppResult<Redirect> {
	let id = require_login(&state, &cookies).await?;
	let year = book.year().map_err(AppError::Validation)?;

	catalog::add_book(&state.db, &book.title, &book.author, &book.genre, year).await?;
	refresh_with(&state, id, Some(Notice::success("Book added successfully!"))).await;
	Ok(Redirect::to("/"))
}

async fn check_out_book(
	State(state): State<AppState>,
	cookies: Cookies,
	UrlPath(bid): UrlPath<Bid>,
) -> AppResult<Redirect> {
	let id = require_login(&state, &cookies).await?;

	let notice = match catalog::check_out_book(&state.db, bid).await? {
		CheckOut::CheckedOut(due) => Notice::success(format!("Checked out until {due}.")),
		CheckOut::AlreadyCheckedOut(due) => Notice::warning(format!("Already checked out until {due}.")),
		CheckOut::NotFound => Notice::warning("No such book."),
	};
	refresh_with(&state, id, Some(notice)).await;
	Ok(Redirect::to("/"))
}

async fn check_in_book(
	State(state): State<AppState>,
	cookies: Cookies,
	UrlPath(bid): UrlPath<Bid>,
) -> AppResult<Redirect> {
	let id = require_login(&state, &cookies).await?;

	let notice = catalog::check_in_book(&state.db, bid).await?
		.then(|| Notice::success("Book checked in."));
	refresh_with(&state, id, notice).await;
	Ok(Redirect::to("/"))
}

async fn delete_book(
	State(state): State<AppState>,
	cookies: Cookies,
	UrlPath(bid): UrlPath<Bid>,
) -> AppResult<Redirect> {
	let id = require_login(&state, &cookies).await?;

	let notice = catalog::delete_book(&state.db, bid).await?
		.then(|| Notice::success("Book deleted."));
	refresh_with(&state, id, notice).await;
	Ok(Redirect::to("/"))
}

async fn perform_search(
	State(state): State<AppState>,
	cookies: Cookies,
	Query(search): Query<SearchParams>,
) -> AppResult<Markup> {
	require_login(&state, &cookies).await?;

	start_render(&state).await?;
	let books = catalog::search_books(&state.db, &search.q).await?;
	Ok(views::dashboard(&Dashboard {
		search: Some(SearchResults { query: search.q, books }),
		..Dashboard::default()
	}))
}

async fn ask_assistant(
	State(state): State<AppState>,
	cookies: Cookies,
	Form(question): Form<AssistantForm>,
) -> AppResult<Markup> {
	require_login(&state, &cookies).await?;

	start_render(&state).await?;
	let text = state.assistant.get_book_description(&question.title).await?;
	Ok(views::dashboard(&Dashboard {
		answer: Some(Answer { question: question.title, text }),
		..Dashboard::default()
	}))
}
