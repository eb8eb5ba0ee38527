//! Remove all seeded data, leaving the schema in place.

use wingz_admin::config::{self, Settings};
use wingz_admin::store::PostgresRideStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	config::init_tracing();
	let settings = Settings::from_env()?;
	let pool = sqlx::postgres::PgPoolOptions::new()
		.max_connections(2)
		.connect(&settings.database_url)
		.await?;
	let store = PostgresRideStore::new(pool);

	store.clear().await?;
	tracing::info!("all rides, events and users removed");
	Ok(())
}
