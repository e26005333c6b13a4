//! Per-browser session context.
//!
//! Handlers find their session id by cookie and run one of the
//! transitions below through [`SessionStore::update`]. Nothing else
//! mutates a session.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "lsys_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
	Success,
	Warning,
	Error,
}

impl NoticeLevel {
	pub fn css_class(self) -> &'static str {
		match self {
			NoticeLevel::Success => "notice success",
			NoticeLevel::Warning => "notice warning",
			NoticeLevel::Error => "notice error",
		}
	}
}

/// One-shot message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: NoticeLevel,
	pub text: String,
}

impl Notice {
	pub fn success(text: impl Into<String>) -> Self {
		Notice { level: NoticeLevel::Success, text: text.into() }
	}
	pub fn warning(text: impl Into<String>) -> Self {
		Notice { level: NoticeLevel::Warning, text: text.into() }
	}
	pub fn error(text: impl Into<String>) -> Self {
		Notice { level: NoticeLevel::Error, text: text.into() }
	}
}

#[derive(Debug, Clone)]
pub struct Credentials {
	pub username: String,
	pub password: String,
}

impl Credentials {
	pub fn matches(&self, username: &str, password: &str) -> bool {
		self.username == username && self.password == password
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
	Accepted,
	Rejected,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
	pub authenticated: bool,
	pub pending_refresh: bool,
	pub notice: Option<Notice>,
}

/// What [`Session::take_refresh`] consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refresh {
	pub requested: bool,
	pub notice: Option<Notice>,
}

impl Session {
	/// There is no way back to logged out; a rejected attempt changes nothing.
	pub fn login(self, credentials: &Credentials, username: &str, password: &str) -> (Self, LoginOutcome) {
		if !credentials.matches(username, password) {
			return (self, LoginOutcome::Rejected);
		}
		let session = Session {
			authenticated: true,
			notice: Some(Notice::success("Login Successful!")),
			..self
		};
		(session, LoginOutcome::Accepted)
	}

	/// Set after a change to the catalog. The next dashboard render
	/// consumes it and opens the catalog so the change is visible.
	pub fn mark_refresh(self, notice: Option<Notice>) -> Self {
		Session {
			pending_refresh: true,
			notice: notice.or(self.notice),
			..self
		}
	}

	pub fn take_refresh(self) -> (Self, Refresh) {
		let refresh = Refresh {
			requested: self.pending_refresh,
			notice: self.notice,
		};
		let session = Session {
			authenticated: self.authenticated,
			pending_refresh: false,
			notice: None,
		};
		(session, refresh)
	}
}

/// Sessions by cookie id. Lives for the life of the process.
///
/// Only sessions that differ from `Session::default()` are kept, so
/// anonymous traffic leaves nothing behind.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
	sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionStore {
	/// Returns the caller's session id and a snapshot of its state.
	///
	/// A request without a known id gets a fresh id in its cookie and the
	/// default session; nothing is stored until [`SessionStore::update`]
	/// produces a session worth keeping.
	pub async fn load(&self, cookies: &Cookies) -> (Uuid, Session) {
		let known = cookies.get(SESSION_COOKIE)
			.and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

		if let Some(id) = known {
			if let Some(session) = self.sessions.lock().await.get(&id) {
				return (id, session.clone());
			}
		}

		let id = Uuid::new_v4();
		cookies.add(
			Cookie::build((SESSION_COOKIE, id.to_string()))
				.path("/")
				.http_only(true)
				.same_site(SameSite::Lax)
				.build()
		);
		debug!(%id, "new session id");
		(id, Session::default())
	}

	/// Runs one transition on the stored session under a single lock.
	pub async fn update<T>(&self, id: Uuid, change: impl FnOnce(Session) -> (Session, T)) -> T {
		let mut sessions = self.sessions.lock().await;
		let current = sessions.remove(&id).unwrap_or_default();
		let (next, out) = change(current);
		if next != Session::default() {
			sessions.insert(id, next);
		}
		out
	}

	pub async fn get(&self, id: &Uuid) -> Option<Session> {
		self.sessions.lock().await.get(id).cloned()
	}

	pub async fn len(&self) -> usize {
		self.sessions.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.len().await == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn credentials() -> Credentials {
		Credentials { username: "librarian".to_string(), password: "hunter2".to_string() }
	}

	#[test]
	fn wrong_password_changes_nothing() {
		let (session, outcome) = Session::default().login(&credentials(), "librarian", "hunter3");
		assert_eq!(outcome, LoginOutcome::Rejected);
		assert_eq!(session, Session::default());

		let (session, outcome) = Session::default().login(&credentials(), "Librarian", "hunter2");
		assert_eq!(outcome, LoginOutcome::Rejected);
		assert!(!session.authenticated);
	}

	#[test]
	fn login_sticks_across_renders() {
		let (session, outcome) = Session::default().login(&credentials(), "librarian", "hunter2");
		assert_eq!(outcome, LoginOutcome::Accepted);
		assert!(session.authenticated);

		let (session, refresh) = session.take_refresh();
		assert!(!refresh.requested);
		assert_eq!(refresh.notice, Some(Notice::success("Login Successful!")));

		let (session, refresh) = session.take_refresh();
		assert!(session.authenticated);
		assert_eq!(refresh, Refresh::default());
	}

	#[test]
	fn failed_login_keeps_existing_login() {
		let (session, _) = Session::default().login(&credentials(), "librarian", "hunter2");
		let (session, outcome) = session.login(&credentials(), "librarian", "nope");
		assert_eq!(outcome, LoginOutcome::Rejected);
		assert!(session.authenticated);
	}

	#[test]
	fn refresh_is_consumed_once() {
		let session = Session { authenticated: true, ..Session::default() }
			.mark_refresh(Some(Notice::success("Book added successfully!")));
		assert!(session.pending_refresh);

		let (session, refresh) = session.take_refresh();
		assert!(refresh.requested);
		assert_eq!(refresh.notice.map(|n| n.level), Some(NoticeLevel::Success));
		assert!(!session.pending_refresh);
		assert!(session.notice.is_none());
	}

	#[test]
	fn mark_refresh_without_notice_keeps_pending_one() {
		let session = Session::default()
			.mark_refresh(Some(Notice::warning("No such book.")))
			.mark_refresh(None);
		assert_eq!(session.notice, Some(Notice::warning("No such book.")));
	}

	fn cookie_for(id: Uuid) -> Cookies {
		let cookies = Cookies::default();
		cookies.add(Cookie::new(SESSION_COOKIE, id.to_string()));
		cookies
	}

	#[tokio::test]
	async fn anonymous_loads_store_nothing() {
		let store = SessionStore::default();
		for _ in 0..1000 {
			let (_, session) = store.load(&Cookies::default()).await;
			assert_eq!(session, Session::default());
		}
		assert!(store.is_empty().await);
	}

	#[tokio::test]
	async fn unknown_cookie_gets_a_fresh_id() {
		let store = SessionStore::default();
		let planted = Uuid::new_v4();
		let (id, _) = store.load(&cookie_for(planted)).await;
		assert_ne!(id, planted);
		assert!(store.is_empty().await);
	}

	#[tokio::test]
	async fn update_keeps_only_sessions_worth_keeping() {
		let store = SessionStore::default();
		let (id, _) = store.load(&Cookies::default()).await;

		let outcome = store.update(id, |s| s.login(&credentials(), "librarian", "nope")).await;
		assert_eq!(outcome, LoginOutcome::Rejected);
		assert!(store.is_empty().await);

		store.update(id, |s| s.login(&credentials(), "librarian", "hunter2")).await;
		let (loaded, session) = store.load(&cookie_for(id)).await;
		assert_eq!(loaded, id);
		assert!(session.authenticated);
		assert_eq!(store.len().await, 1);
	}

	#[tokio::test]
	async fn refresh_survives_until_taken() {
		let store = SessionStore::default();
		let id = Uuid::new_v4();
		store.update(id, |s| (Session { authenticated: true, ..s }, ())).await;

		store.update(id, |s| (s.mark_refresh(Some(Notice::success("Book deleted."))), ())).await;
		let refresh = store.update(id, Session::take_refresh).await;
		assert!(refresh.requested);
		assert_eq!(refresh.notice, Some(Notice::success("Book deleted.")));

		let session = store.get(&id).await.unwrap();
		assert!(!session.pending_refresh);
		assert!(session.authenticated);
	}
}
