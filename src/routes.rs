//! URL dispatch.
//!
//! All endpoints are read-only. A known path with the wrong method is a 405
//! with a DRF-style detail body; anything else falls through to 404.

use crate::error::{Error, Result};
use crate::http::{Handler, Request, Response};
use crate::permissions::{check, IsAdmin};
use crate::store::RideStore;
use crate::views::{HealthCheckView, RideEventViewSet, RideViewSet, UserViewSet};
use async_trait::async_trait;
use hyper::{Method, StatusCode};
use std::sync::Arc;

pub struct Router {
	health: HealthCheckView,
	rides: RideViewSet,
	users: UserViewSet,
	events: RideEventViewSet,
}

impl Router {
	pub fn new(store: Arc<dyn RideStore>) -> Self {
		Self {
			health: HealthCheckView,
			rides: RideViewSet::new(store.clone()),
			users: UserViewSet::new(store.clone()),
			events: RideEventViewSet::new(store),
		}
	}

	fn method_not_allowed(method: &Method) -> Response {
		Response::json(
			StatusCode::METHOD_NOT_ALLOWED,
			&serde_json::json!({
				"detail": format!("Method \"{method}\" not allowed.")
			}),
		)
	}
}

#[async_trait]
impl Handler for Router {
	async fn handle(&self, mut request: Request) -> Result<Response> {
		let path = request.path().trim_matches('/').to_string();
		let segments: Vec<&str> = if path.is_empty() {
			Vec::new()
		} else {
			path.split('/').collect()
		};

		let is_get = request.method == Method::GET;
		match segments.as_slice() {
			["health-check"] if is_get => self.health.get(&request).await,
			["rides"] if is_get => self.rides.list(&request).await,
			["rides", id] if is_get => {
				let id = id.to_string();
				request.set_path_param("id", id);
				self.rides.retrieve(&request).await
			}
			["users"] if is_get => self.users.list(&request).await,
			["users", id] if is_get => {
				let id = id.to_string();
				request.set_path_param("id", id);
				self.users.retrieve(&request).await
			}
			["ride-events"] if is_get => self.events.list(&request).await,
			["ride-events", id] if is_get => {
				let id = id.to_string();
				request.set_path_param("id", id);
				self.events.retrieve(&request).await
			}
			["health-check"] => Ok(Self::method_not_allowed(&request.method)),
			["rides"] | ["rides", _] | ["users"] | ["users", _] | ["ride-events"]
			| ["ride-events", _] => {
				// Credentials are checked before method dispatch, so an
				// anonymous caller sees 401 rather than 405.
				check(&IsAdmin, &request)?;
				Ok(Self::method_not_allowed(&request.method))
			}
			_ => Err(Error::NotFound),
		}
	}
}
