//! Page-number pagination with a `{count, next, previous, results}` envelope.
//!
//! Defaults: 10 items per page, client-overridable via `page_size`, capped at
//! 100. A page number beyond the last page yields an empty page rather than
//! an error; a non-positive or non-numeric page number is a validation error.

use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
	pub count: u64,
	pub next: Option<String>,
	pub previous: Option<String>,
	pub results: Vec<T>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
	/// 1-indexed page number.
	pub number: u64,
	/// Items per page, already clamped to the maximum.
	pub size: u64,
}

impl PageRequest {
	/// Saturates rather than overflowing: an astronomically large page
	/// number is still a valid request for an empty page.
	pub fn offset(&self) -> u64 {
		self.number.saturating_sub(1).saturating_mul(self.size)
	}
}

/// Page-number pagination configuration.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use wingz_admin::pagination::PageNumberPagination;
///
/// let pagination = PageNumberPagination::default();
/// let page = pagination.page_request(&HashMap::new()).unwrap();
/// assert_eq!(page.number, 1);
/// assert_eq!(page.size, 10);
/// ```
#[derive(Debug, Clone)]
pub struct PageNumberPagination {
	pub page_size: u64,
	pub max_page_size: u64,
	pub page_query_param: String,
	pub page_size_query_param: String,
}

impl Default for PageNumberPagination {
	fn default() -> Self {
		Self {
			page_size: 10,
			max_page_size: 100,
			page_query_param: "page".to_string(),
			page_size_query_param: "page_size".to_string(),
		}
	}
}

impl PageNumberPagination {
	pub fn new(page_size: u64, max_page_size: u64) -> Self {
		Self {
			page_size,
			max_page_size,
			..Self::default()
		}
	}

	/// Resolve the page window from query parameters.
	///
	/// `page` must be a positive integer when present. `page_size` follows
	/// the lenient convention: unparsable or non-positive values fall back to
	/// the default, oversized values are clamped to the maximum.
	pub fn page_request(&self, query_params: &HashMap<String, String>) -> Result<PageRequest> {
		let number = match query_params.get(&self.page_query_param) {
			None => 1,
			Some(raw) => raw
				.parse::<u64>()
				.ok()
				.filter(|n| *n >= 1)
				.ok_or_else(|| Error::validation(&self.page_query_param, "Invalid page."))?,
		};

		let size = query_params
			.get(&self.page_size_query_param)
			.and_then(|raw| raw.parse::<u64>().ok())
			.filter(|s| *s >= 1)
			.map(|s| s.min(self.max_page_size))
			.unwrap_or(self.page_size);

		Ok(PageRequest { number, size })
	}

	/// Assemble the envelope for one page of results.
	///
	/// `path` and `query_params` reproduce the request URL in the `next` /
	/// `previous` links with only the page number swapped.
	pub fn build_response<T: Serialize>(
		&self,
		results: Vec<T>,
		count: u64,
		page: PageRequest,
		path: &str,
		query_params: &HashMap<String, String>,
	) -> PaginatedResponse<T> {
		let num_pages = count.div_ceil(page.size).max(1);

		let next = (page.number < num_pages)
			.then(|| self.page_link(path, query_params, page.number + 1));
		let previous = (page.number > 1 && page.number <= num_pages + 1)
			.then(|| self.page_link(path, query_params, page.number - 1));

		PaginatedResponse {
			count,
			next,
			previous,
			results,
		}
	}

	fn page_link(&self, path: &str, query_params: &HashMap<String, String>, number: u64) -> String {
		let mut pairs: Vec<(String, String)> = query_params
			.iter()
			.filter(|(k, _)| **k != self.page_query_param)
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();
		pairs.sort();
		pairs.push((self.page_query_param.clone(), number.to_string()));

		// Infallible for string pairs.
		let query = serde_urlencoded::to_string(&pairs).unwrap_or_default();
		format!("{path}?{query}")
	}
}
