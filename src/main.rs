// library system

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lsys::assistant::AssistantClient;
use lsys::config::Config;
use lsys::{sql, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "lsys=debug,lsys_catalog=debug,tower_http=debug".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	dotenvy::dotenv().ok();
	let config = Config::from_env()
		.inspect_err(|e| tracing::error!("{e}"))
		.context("can't start without configuration")?;

	let db = sql::open(&config.database_path);
	db.create_database().await
		.with_context(|| format!("can't create database at {}", config.database_path.display()))?;

	let assistant = AssistantClient::from_config(&config)?;
	let state = AppState::new(db, assistant, config.credentials());
	let app = lsys::app(state, &config.static_dir);

	let listener = tokio::net::TcpListener::bind(&config.bind_addr).await
		.with_context(|| format!("can't bind {}", config.bind_addr))?;
	tracing::info!(addr = %config.bind_addr, "library catalog listening");
	axum::serve(listener, app).await?;
	Ok(())
}
