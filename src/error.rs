//! Error taxonomy for the admin API.
//!
//! Four failure classes with distinct HTTP mappings: validation (400,
//! field-keyed body), authentication (401), permission (403), not-found (404)
//! and store faults (500). Validation and permission failures are caller
//! errors and are never logged as system faults; store faults are.

use hyper::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// Malformed or out-of-policy input. `field` keys the error body so
	/// clients can attribute the message to a query parameter.
	#[error("validation failed on `{field}`: {message}")]
	Validation { field: String, message: String },

	/// No credentials, or credentials that did not resolve to a user.
	#[error("authentication credentials were not provided")]
	NotAuthenticated,

	/// Authenticated, but not an admin.
	#[error("permission denied")]
	PermissionDenied,

	/// Referenced ride/user/event does not exist.
	#[error("not found")]
	NotFound,

	/// Transient infrastructure failure from the persistence collaborator.
	/// Propagated unmodified; never retried here.
	#[error("store error: {0}")]
	Store(#[from] sqlx::Error),
}

impl Error {
	/// Shorthand for a field-keyed validation error.
	///
	/// # Examples
	///
	/// ```
	/// use wingz_admin::error::Error;
	///
	/// let err = Error::validation("page", "Invalid page.");
	/// assert_eq!(err.status(), hyper::StatusCode::BAD_REQUEST);
	/// ```
	pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
		Error::Validation {
			field: field.into(),
			message: message.into(),
		}
	}

	/// HTTP status this error surfaces as.
	pub fn status(&self) -> StatusCode {
		match self {
			Error::Validation { .. } => StatusCode::BAD_REQUEST,
			Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// JSON error body. Validation errors use a `{field: message}` shape;
	/// everything else uses a DRF-style `{"detail": ...}` body.
	pub fn body(&self) -> Value {
		match self {
			Error::Validation { field, message } => {
				let mut body = serde_json::Map::new();
				body.insert(field.clone(), Value::String(message.clone()));
				Value::Object(body)
			}
			Error::NotAuthenticated => {
				json!({ "detail": "Authentication credentials were not provided." })
			}
			Error::PermissionDenied => {
				json!({ "detail": "You do not have permission to perform this action." })
			}
			Error::NotFound => json!({ "detail": "Not found." }),
			Error::Store(_) => json!({ "detail": "Internal server error." }),
		}
	}

	/// True for failures that indicate a broken system rather than a bad
	/// request; these are the ones worth paging on.
	pub fn is_fault(&self) -> bool {
		matches!(self, Error::Store(_))
	}
}
