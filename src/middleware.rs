//! Cross-cutting request middleware.
//!
//! `LoggingMiddleware` sits outermost: it converts handler errors into their
//! JSON responses, so everything below it can stay in `Result` land, and
//! emits one structured line per request. `AuthenticationMiddleware` resolves
//! credentials into `request.user` and skips the health check.

use crate::auth::AuthBackend;
use crate::error::Result;
use crate::http::{Handler, Middleware, Request, Response};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

pub struct AuthenticationMiddleware {
	backend: Arc<dyn AuthBackend>,
}

impl AuthenticationMiddleware {
	pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
		Self { backend }
	}
}

#[async_trait]
impl Middleware for AuthenticationMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		match self.backend.authenticate(&request).await? {
			Some(user) => next.handle(request.with_user(user)).await,
			None => next.handle(request).await,
		}
	}

	fn should_continue(&self, request: &Request) -> bool {
		request.path().trim_end_matches('/') != "/health-check"
	}
}

/// One `info!` line per request with method, path, status and duration.
/// Store failures additionally log at `error!` with the source message; their
/// body stays a generic 500.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		let start = Instant::now();
		let method = request.method.clone();
		let path = request.path().to_string();

		let response = match next.handle(request).await {
			Ok(response) => response,
			Err(error) => {
				if error.is_fault() {
					tracing::error!(%method, %path, error = %error, "request failed");
				}
				Response::from(&error)
			}
		};

		tracing::info!(
			%method,
			%path,
			status = response.status.as_u16(),
			duration_ms = start.elapsed().as_millis() as u64,
			"request"
		);
		Ok(response)
	}
}
