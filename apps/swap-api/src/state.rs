use std::sync::Arc;

use swap_service::{Store, SwapService};
use swap_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SwapService>,
}
impl AppState {
	pub async fn new(config: swap_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = SwapService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}

	/// State over an arbitrary store, without touching Postgres.
	pub fn with_store(config: swap_config::Config, store: Arc<dyn Store>) -> Self {
		Self { service: Arc::new(SwapService::with_store(config, store)) }
	}
}
