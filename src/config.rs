use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::session::Credentials;

pub const DEFAULT_DATABASE_PATH: &str = "library.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ASSISTANT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("missing required setting {0}, please check your .env file")]
	Missing(&'static str),
	#[error("invalid value {value:?} for {key}")]
	Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
	pub openai_api_key: String,
	pub username: String,
	pub password: String,
	pub database_path: PathBuf,
	pub bind_addr: String,
	pub openai_model: String,
	pub openai_api_url: String,
	pub assistant_timeout: Duration,
	pub static_dir: PathBuf,
}

impl Config {
	/// Reads the process environment; call `dotenvy::dotenv()` first to pick up `.env`.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let required = |key: &'static str| {
			lookup(key)
				.filter(|value| !value.trim().is_empty())
				.ok_or(ConfigError::Missing(key))
		};
		let optional = |key: &str, default: &str| {
			lookup(key).unwrap_or_else(|| default.to_string())
		};

		let openai_api_key = required("OPENAI_API_KEY")?;
		let username = required("USERNAME")?;
		let password = required("PASSWORD")?;

		let assistant_timeout = match lookup("ASSISTANT_TIMEOUT_SECS") {
			Some(raw) => raw.trim().parse::<u64>()
				.map_err(|_| ConfigError::Invalid { key: "ASSISTANT_TIMEOUT_SECS", value: raw })?,
			None => DEFAULT_ASSISTANT_TIMEOUT_SECS,
		};

		Ok(Config {
			openai_api_key,
			username,
			password,
			database_path: PathBuf::from(optional("DATABASE_PATH", DEFAULT_DATABASE_PATH)),
			bind_addr: optional("BIND_ADDR", DEFAULT_BIND_ADDR),
			openai_model: optional("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
			openai_api_url: optional("OPENAI_API_URL", DEFAULT_OPENAI_API_URL),
			assistant_timeout: Duration::from_secs(assistant_timeout),
			static_dir: PathBuf::from(optional("STATIC_DIR", DEFAULT_STATIC_DIR)),
		})
	}

	pub fn credentials(&self) -> Credentials {
		Credentials {
			username: self.username.clone(),
			password: self.password.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let vars: HashMap<String, String> = pairs.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| vars.get(key).cloned()
	}

	const REQUIRED: [(&str, &str); 3] = [
		("OPENAI_API_KEY", "sk-test"),
		("USERNAME", "librarian"),
		("PASSWORD", "hunter2"),
	];

	#[test]
	fn defaults_fill_optional_values() {
		let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
		assert_eq!(config.openai_api_key, "sk-test");
		assert_eq!(config.database_path, PathBuf::from("library.db"));
		assert_eq!(config.bind_addr, "0.0.0.0:8080");
		assert_eq!(config.openai_model, "gpt-4");
		assert_eq!(config.assistant_timeout, Duration::from_secs(60));
		assert!(config.credentials().matches("librarian", "hunter2"));
	}

	#[test]
	fn each_required_value_is_enforced() {
		for (missing, _) in REQUIRED {
			let present: Vec<(&str, &str)> = REQUIRED.iter()
				.copied()
				.filter(|(key, _)| *key != missing)
				.collect();
			match Config::from_lookup(lookup(&present)) {
				Err(ConfigError::Missing(key)) => assert_eq!(key, missing),
				other => panic!("expected {missing} to be reported, got {other:?}"),
			}
		}
	}

	#[test]
	fn blank_api_key_counts_as_missing() {
		let vars = [("OPENAI_API_KEY", "  "), ("USERNAME", "a"), ("PASSWORD", "b")];
		let err = Config::from_lookup(lookup(&vars)).unwrap_err();
		assert!(err.to_string().contains("OPENAI_API_KEY"));
	}

	#[test]
	fn bad_timeout_is_rejected() {
		let mut vars = REQUIRED.to_vec();
		vars.push(("ASSISTANT_TIMEOUT_SECS", "soon"));
		assert!(matches!(
			Config::from_lookup(lookup(&vars)),
			Err(ConfigError::Invalid { key: "ASSISTANT_TIMEOUT_SECS", .. })
		));
	}
}
