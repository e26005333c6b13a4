use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::assistant::AssistantError;
use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),
	#[error(transparent)]
	Assistant(#[from] AssistantError),
	#[error("Please log in to access the system.")]
	Unauthenticated,
	#[error("{0}")]
	Validation(String),
}

impl AppError {
	pub fn status(&self) -> StatusCode {
		match self {
			AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
			AppError::Assistant(_) => StatusCode::BAD_GATEWAY,
			AppError::Unauthenticated => StatusCode::FORBIDDEN,
			AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
		}
	}
}

impl IntoResponse for AppError {
	fn into_response(self) -> Response {
		let status = self.status();
		if status.is_server_error() {
			tracing::error!(
				error.cause_chain = ?self,
				error.message = %self,
				"request failed"
			);
		} else {
			tracing::debug!(%status, error = %self, "request refused");
		}
		(status, views::error_page(status, &self.to_string())).into_response()
	}
}

pub type AppResult<T> = Result<T, AppError>;
