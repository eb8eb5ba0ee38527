//! View-level permission classes.
//!
//! A denied check maps to 401 when the request is anonymous and 403 when it
//! is authenticated but not allowed, mirroring the error bodies in `error`.

use crate::error::{Error, Result};
use crate::http::Request;

pub trait Permission: Send + Sync {
	fn has_permission(&self, request: &Request) -> bool;
}

/// No restriction. Used by the health check.
pub struct AllowAny;

impl Permission for AllowAny {
	fn has_permission(&self, _request: &Request) -> bool {
		true
	}
}

/// Only users with the admin role pass.
pub struct IsAdmin;

impl Permission for IsAdmin {
	fn has_permission(&self, request: &Request) -> bool {
		request.user.as_ref().is_some_and(|u| u.is_admin())
	}
}

/// Enforce a permission, distinguishing missing from insufficient
/// credentials.
pub fn check(permission: &dyn Permission, request: &Request) -> Result<()> {
	if permission.has_permission(request) {
		return Ok(());
	}
	match request.user {
		None => Err(Error::NotAuthenticated),
		Some(_) => Err(Error::PermissionDenied),
	}
}
