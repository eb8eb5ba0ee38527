//! Credential resolution.
//!
//! An `AuthBackend` turns request credentials into a `User`, or `None` when
//! no credentials are present. Bad credentials are an error; missing ones are
//! not, so permission checks can distinguish 401 from 403.

use crate::error::{Error, Result};
use crate::http::Request;
use crate::models::User;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait AuthBackend: Send + Sync {
	/// Resolve the request's credentials.
	///
	/// `Ok(None)` means anonymous; `Err(NotAuthenticated)` means credentials
	/// were offered but do not resolve.
	async fn authenticate(&self, request: &Request) -> Result<Option<User>>;
}

/// Bearer-token backend over a fixed token table, populated at startup.
#[derive(Default)]
pub struct StaticTokenBackend {
	tokens: HashMap<String, User>,
}

impl StaticTokenBackend {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_token(mut self, token: impl Into<String>, user: User) -> Self {
		self.tokens.insert(token.into(), user);
		self
	}
}

#[async_trait]
impl AuthBackend for StaticTokenBackend {
	async fn authenticate(&self, request: &Request) -> Result<Option<User>> {
		match request.bearer_token() {
			None => Ok(None),
			Some(token) => self
				.tokens
				.get(token)
				.cloned()
				.map(Some)
				.ok_or(Error::NotAuthenticated),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::models::UserRole;
	use hyper::header::AUTHORIZATION;
	use hyper::Method;

	fn admin() -> User {
		User {
			id: 1,
			username: "admin".to_string(),
			email: "admin@example.com".to_string(),
			role: UserRole::Admin,
			phone_number: None,
			first_name: "Ada".to_string(),
			last_name: "Admin".to_string(),
		}
	}

	fn request(auth: Option<&str>) -> Request {
		let request = Request::new(Method::GET, "/rides".parse().unwrap());
		match auth {
			Some(value) => request.with_header(AUTHORIZATION, value),
			None => request,
		}
	}

	#[tokio::test]
	async fn test_known_token_resolves_the_user() {
		let backend = StaticTokenBackend::new().with_token("admin-token", admin());
		let user = backend
			.authenticate(&request(Some("Bearer admin-token")))
			.await
			.unwrap();
		assert_eq!(user.unwrap().username, "admin");
	}

	#[tokio::test]
	async fn test_missing_credentials_are_anonymous() {
		let backend = StaticTokenBackend::new().with_token("admin-token", admin());
		assert!(backend.authenticate(&request(None)).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_unknown_token_is_rejected() {
		let backend = StaticTokenBackend::new().with_token("admin-token", admin());
		let err = backend
			.authenticate(&request(Some("Bearer wrong")))
			.await
			.unwrap_err();
		assert!(matches!(err, Error::NotAuthenticated));
	}
}
