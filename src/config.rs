//! Process configuration from environment variables.

use crate::models::{User, UserRole};
use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Settings {
	pub bind_addr: SocketAddr,
	pub database_url: String,
	/// Bearer token granting the built-in admin principal. Without it the
	/// API only serves the health check.
	pub admin_token: Option<String>,
	pub admin_username: String,
	pub admin_email: String,
}

impl Settings {
	/// Read settings from the environment. `DATABASE_URL` is required; the
	/// rest have defaults.
	pub fn from_env() -> anyhow::Result<Self> {
		let bind_addr = env::var("WINGZ_BIND_ADDR")
			.unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
			.parse()
			.context("WINGZ_BIND_ADDR is not a valid socket address")?;
		let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
		let admin_token = env::var("WINGZ_ADMIN_TOKEN").ok().filter(|t| !t.is_empty());
		let admin_username =
			env::var("WINGZ_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
		let admin_email = env::var("WINGZ_ADMIN_EMAIL")
			.unwrap_or_else(|_| "admin@example.com".to_string());

		Ok(Self {
			bind_addr,
			database_url,
			admin_token,
			admin_username,
			admin_email,
		})
	}

	/// The principal the static token resolves to.
	pub fn admin_user(&self) -> User {
		User {
			id: 0,
			username: self.admin_username.clone(),
			email: self.admin_email.clone(),
			role: UserRole::Admin,
			phone_number: None,
			first_name: "Admin".to_string(),
			last_name: "User".to_string(),
		}
	}
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the `info`
/// default.
pub fn init_tracing() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_admin_user_is_an_admin() {
		let settings = Settings {
			bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
			database_url: "postgres://localhost/wingz".to_string(),
			admin_token: Some("admin-token".to_string()),
			admin_username: "root".to_string(),
			admin_email: "root@example.com".to_string(),
		};
		let user = settings.admin_user();
		assert!(user.is_admin());
		assert_eq!(user.email, "root@example.com");
	}
}
