use std::sync::Arc;
use wingz_admin::auth::StaticTokenBackend;
use wingz_admin::config::{self, Settings};
use wingz_admin::http::MiddlewareChain;
use wingz_admin::middleware::{AuthenticationMiddleware, LoggingMiddleware};
use wingz_admin::routes::Router;
use wingz_admin::server::HttpServer;
use wingz_admin::store::PostgresRideStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	config::init_tracing();
	let settings = Settings::from_env()?;

	let pool = sqlx::postgres::PgPoolOptions::new()
		.max_connections(10)
		.connect(&settings.database_url)
		.await?;
	let store = Arc::new(PostgresRideStore::new(pool));

	let mut backend = StaticTokenBackend::new();
	match &settings.admin_token {
		Some(token) => {
			backend = backend.with_token(token.clone(), settings.admin_user());
		}
		None => {
			tracing::warn!("WINGZ_ADMIN_TOKEN is not set; only the health check is reachable");
		}
	}

	let chain = MiddlewareChain::new(Arc::new(Router::new(store)))
		.with_middleware(Arc::new(LoggingMiddleware))
		.with_middleware(Arc::new(AuthenticationMiddleware::new(Arc::new(backend))));

	HttpServer::new(chain).listen(settings.bind_addr).await
}
