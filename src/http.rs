//! Minimal HTTP request/response types and the handler/middleware seam.
//!
//! `Request` carries the parsed query string, router-extracted path
//! parameters and the authenticated user once the authentication middleware
//! has run. `Response` is a status, headers and a byte body; handlers build
//! JSON bodies through [`Response::json`].

use crate::error::{Error, Result};
use crate::models::User;
use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::{HeaderMap, Method, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// An in-flight HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Raw query pairs, split on `&`/first `=`, not yet percent-decoded.
	pub query_params: HashMap<String, String>,
	/// Variables the router extracted from the path pattern.
	pub path_params: HashMap<String, String>,
	/// Set by the authentication middleware when credentials resolve.
	pub user: Option<User>,
}

impl Request {
	pub fn new(method: Method, uri: Uri) -> Self {
		let query_params = Self::parse_query_params(&uri);
		Self {
			method,
			uri,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			query_params,
			path_params: HashMap::new(),
			user: None,
		}
	}

	fn parse_query_params(uri: &Uri) -> HashMap<String, String> {
		uri.query()
			.map(|q| {
				q.split('&')
					.filter_map(|pair| {
						// Split on the first '=' only, so '=' survives in values.
						let mut parts = pair.splitn(2, '=');
						Some((
							parts.next()?.to_string(),
							parts.next().unwrap_or("").to_string(),
						))
					})
					.collect()
			})
			.unwrap_or_default()
	}

	pub fn with_headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Insert one header. Values that are not valid header text are dropped.
	pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(value) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn with_body(mut self, body: Bytes) -> Self {
		self.body = body;
		self
	}

	pub fn with_user(mut self, user: User) -> Self {
		self.user = Some(user);
		self
	}

	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Query parameters with keys and values percent-decoded, `+` read as a
	/// space in values.
	pub fn decoded_query_params(&self) -> HashMap<String, String> {
		self.query_params
			.iter()
			.map(|(k, v)| {
				let key = percent_decode_str(k).decode_utf8_lossy().to_string();
				let value = percent_decode_str(&v.replace('+', " "))
					.decode_utf8_lossy()
					.to_string();
				(key, value)
			})
			.collect()
	}

	pub fn set_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(key.into(), value.into());
	}

	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	/// The token from an `Authorization: Bearer <token>` header, if any.
	pub fn bearer_token(&self) -> Option<&str> {
		self.headers
			.get(AUTHORIZATION)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.strip_prefix("Bearer "))
			.map(str::trim)
			.filter(|t| !t.is_empty())
	}
}

/// An outgoing HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// A JSON response with the given status. Serialization failure degrades
	/// to a plain 500 body instead of panicking in the request path.
	pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Self {
		match serde_json::to_vec(value) {
			Ok(body) => {
				let mut response = Self::new(status);
				response.headers.insert(
					CONTENT_TYPE,
					HeaderValue::from_static("application/json"),
				);
				response.body = Bytes::from(body);
				response
			}
			Err(_) => {
				let mut response = Self::new(StatusCode::INTERNAL_SERVER_ERROR);
				response.headers.insert(
					CONTENT_TYPE,
					HeaderValue::from_static("application/json"),
				);
				response.body = Bytes::from_static(b"{\"detail\":\"Internal server error.\"}");
				response
			}
		}
	}

	pub fn json_body(&self) -> Option<serde_json::Value> {
		serde_json::from_slice(&self.body).ok()
	}
}

impl From<&Error> for Response {
	fn from(error: &Error) -> Self {
		Response::json(error.status(), &error.body())
	}
}

/// Terminal request processor.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Wraps the downstream handler with a cross-cutting concern.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;

	/// Middleware can opt out per request; skipped middleware costs nothing.
	fn should_continue(&self, _request: &Request) -> bool {
		true
	}
}

/// Composes middleware around a handler, applied in insertion order.
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}
}

struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		let mut current: Arc<dyn Handler> = self.handler.clone();
		for middleware in self
			.middlewares
			.iter()
			.rev()
			.filter(|mw| mw.should_continue(&request))
		{
			current = Arc::new(ComposedHandler {
				middleware: middleware.clone(),
				next: current,
			});
		}
		current.handle(request).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	struct EchoHandler {
		body: &'static str,
	}

	#[async_trait]
	impl Handler for EchoHandler {
		async fn handle(&self, _request: Request) -> Result<Response> {
			let mut response = Response::ok();
			response.body = Bytes::from_static(self.body.as_bytes());
			Ok(response)
		}
	}

	struct PrefixMiddleware {
		prefix: &'static str,
	}

	#[async_trait]
	impl Middleware for PrefixMiddleware {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			let mut response = next.handle(request).await?;
			let mut body = self.prefix.as_bytes().to_vec();
			body.extend_from_slice(&response.body);
			response.body = Bytes::from(body);
			Ok(response)
		}
	}

	fn get(uri: &str) -> Request {
		Request::new(Method::GET, uri.parse().unwrap())
	}

	#[test]
	fn test_query_params_split_on_first_equals() {
		let request = get("/rides?token=a=b&status=completed");
		assert_eq!(request.query_params.get("token").map(String::as_str), Some("a=b"));
		assert_eq!(
			request.query_params.get("status").map(String::as_str),
			Some("completed")
		);
	}

	#[test]
	fn test_decoded_query_params() {
		let request = get("/rides?rider_email=alice%40example.com&note=a+b");
		let decoded = request.decoded_query_params();
		assert_eq!(
			decoded.get("rider_email").map(String::as_str),
			Some("alice@example.com")
		);
		assert_eq!(decoded.get("note").map(String::as_str), Some("a b"));
	}

	#[rstest]
	#[case("Bearer admin-token", Some("admin-token"))]
	#[case("Bearer ", None)]
	#[case("Basic dXNlcg==", None)]
	fn test_bearer_token(#[case] header: &str, #[case] expected: Option<&str>) {
		let request = get("/rides").with_header(AUTHORIZATION, header);
		assert_eq!(request.bearer_token(), expected);
	}

	#[test]
	fn test_json_response_sets_content_type() {
		let response = Response::json(StatusCode::OK, &serde_json::json!({"ok": true}));
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(
			response.headers.get(CONTENT_TYPE).unwrap(),
			"application/json"
		);
		assert_eq!(response.json_body().unwrap()["ok"], true);
	}

	#[tokio::test]
	async fn test_chain_applies_middleware_in_insertion_order() {
		let chain = MiddlewareChain::new(Arc::new(EchoHandler { body: "base" }))
			.with_middleware(Arc::new(PrefixMiddleware { prefix: "m1:" }))
			.with_middleware(Arc::new(PrefixMiddleware { prefix: "m2:" }));
		let response = chain.handle(get("/")).await.unwrap();
		assert_eq!(&response.body[..], b"m1:m2:base");
	}

	#[tokio::test]
	async fn test_error_converts_to_field_keyed_body() {
		let error = Error::validation("status", "Select a valid choice.");
		let response = Response::from(&error);
		assert_eq!(response.status, StatusCode::BAD_REQUEST);
		assert_eq!(
			response.json_body().unwrap()["status"],
			"Select a valid choice."
		);
	}
}
