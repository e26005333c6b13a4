#![allow(dead_code)]

use std::time::Duration;

use axum::{
	Router,
	body::{Body, to_bytes},
	http::{Request, Response, header},
};
use lsys::assistant::AssistantClient;
use lsys::session::Credentials;
use lsys::AppState;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

pub const USERNAME: &str = "librarian";
pub const PASSWORD: &str = "hunter2";
pub const API_KEY: &str = "test-key";

pub struct TestApp {
	_dir: TempDir,
	pub app: Router,
	pub state: AppState,
}

// `api_url` only matters to tests that ask the assistant
pub async fn setup(api_url: &str) -> TestApp {
	let dir = tempfile::tempdir().expect("Failed to create temp dir");
	let db = lsys::sql::open(dir.path().join("library.db"));
	db.create_database().await.expect("Failed to init DB");

	let assistant = AssistantClient::new(
		api_url.to_string(),
		"gpt-4".to_string(),
		API_KEY.to_string(),
		Duration::from_secs(5),
	).expect("Failed to build assistant");
	let credentials = Credentials {
		username: USERNAME.to_string(),
		password: PASSWORD.to_string(),
	};

	let state = AppState::new(db, assistant, credentials);
	let app = lsys::app(state.clone(), "static");
	TestApp { _dir: dir, app, state }
}

impl TestApp {
	pub async fn send(&self, req: Request<Body>) -> Response<Body> {
		self.app.clone().oneshot(req).await.unwrap()
	}

	/// Logs in and returns the session cookie.
	pub async fn login(&self) -> String {
		let body = format!("username={USERNAME}&password={PASSWORD}");
		let response = self.send(post_form("/login", &body, None)).await;
		assert_eq!(response.status(), 303);
		session_cookie(&response).expect("login should start a session")
	}
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
	let mut req = Request::builder().uri(uri).method("GET");
	if let Some(cookie) = cookie {
		req = req.header(header::COOKIE, cookie);
	}
	req.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
	let mut req = Request::builder()
		.uri(uri)
		.method("POST")
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
	if let Some(cookie) = cookie {
		req = req.header(header::COOKIE, cookie);
	}
	req.body(Body::from(body.to_string())).unwrap()
}

pub fn session_cookie(response: &Response<Body>) -> Option<String> {
	response.headers()
		.get(header::SET_COOKIE)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.split(';').next())
		.map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
	response.headers()
		.get(header::LOCATION)
		.and_then(|value| value.to_str().ok())
}

pub async fn body_text(response: Response<Body>) -> String {
	let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
	String::from_utf8(bytes.to_vec()).unwrap()
}
