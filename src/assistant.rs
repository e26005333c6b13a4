//! Client for the hosted chat-completion service behind "Ask the Library Assistant".
//!
//! One request per question; no retry and no caching. Wire types stay
//! private to this module.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::Config;

pub const SYSTEM_PROMPT: &str = "You are a library assistant. You are asked to provide a description of a book, a recommendation and a summary.";

#[derive(Debug, Error)]
pub enum AssistantError {
	#[error("failed to build HTTP client: {0}")]
	Client(#[source] reqwest::Error),
	#[error("assistant request failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("assistant service answered {status}: {body}")]
	Status { status: StatusCode, body: String },
	#[error("malformed assistant response: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("assistant response contained no answer")]
	Empty,
}

#[derive(Debug, Clone)]
pub struct AssistantClient {
	client: Client,
	api_url: String,
	model: String,
	api_key: String,
}

impl AssistantClient {
	pub fn new(api_url: String, model: String, api_key: String, timeout: Duration) -> Result<Self, AssistantError> {
		let client = Client::builder()
			.timeout(timeout)
			.build()
			.map_err(AssistantError::Client)?;
		Ok(AssistantClient { client, api_url, model, api_key })
	}

	pub fn from_config(config: &Config) -> Result<Self, AssistantError> {
		Self::new(
			config.openai_api_url.clone(),
			config.openai_model.clone(),
			config.openai_api_key.clone(),
			config.assistant_timeout,
		)
	}

	/// Asks the model about `title` and returns the first choice's text.
	pub async fn get_book_description(&self, title: &str) -> Result<String, AssistantError> {
		let question = format!("Tell me about the following: {title}");
		let payload = ChatCompletionRequest {
			model: &self.model,
			messages: [
				Message { role: "system", content: SYSTEM_PROMPT },
				Message { role: "user", content: &question },
			],
		};
		debug!(model = %self.model, title, "asking assistant");

		let response = self.client.post(&self.api_url)
			.bearer_auth(&self.api_key)
			.json(&payload)
			.send().await
			.inspect_err(|e| error!(url = %self.api_url, error = %e, "assistant request failed"))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			error!(%status, "assistant service returned an error");
			return Err(AssistantError::Status { status, body });
		}

		let body = response.text().await?;
		let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
		let answer = parsed.choices
			.into_iter()
			.next()
			.and_then(|choice| choice.message.content)
			.map(|content| content.trim().to_string())
			.filter(|content| !content.is_empty())
			.ok_or(AssistantError::Empty)?;

		debug!(len = answer.len(), "assistant answered");
		Ok(answer)
	}
}

#[derive(Debug, Serialize)]
struct Message<'a> {
	role: &'a str,
	content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
	model: &'a str,
	messages: [Message<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
	choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
	message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
	#[serde(default)]
	content: Option<String>,
}
