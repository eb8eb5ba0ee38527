//! Pluggable filter backends for the ride list endpoint.
//!
//! Each backend reads the query parameters it owns and transforms the lazy
//! `RideQuerySet`; a `FilterChain` applies them in order. The coordinate
//! annotation is injected by `RideFilterBackend` before `OrderingBackend`
//! runs, so a distance sort can be checked against the annotation tag instead
//! of failing inside the store.

use crate::error::{Error, Result};
use crate::models::RideStatus;
use crate::query::{Direction, OrderField, Ordering, RideQuerySet};
use crate::validators::validate_coordinate_params;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A single query-parameter-driven transformation of the ride query.
#[async_trait]
pub trait FilterBackend: Send + Sync {
	async fn filter_queryset(
		&self,
		query_params: &HashMap<String, String>,
		queryset: RideQuerySet,
	) -> Result<RideQuerySet>;
}

/// Status, rider-email and coordinate filters for rides.
///
/// - `status`: exact match against the ride status choices; unknown values
///   are a validation error, not an empty result.
/// - `rider_email`: case-insensitive substring match.
/// - `lat`/`lng`: validated as a pair, then attached as the distance
///   annotation origin.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use wingz_admin::filters::{FilterBackend, RideFilterBackend};
/// use wingz_admin::query::RideQuerySet;
///
/// # tokio_test::block_on(async {
/// let mut params = HashMap::new();
/// params.insert("status".to_string(), "completed".to_string());
/// params.insert("lat".to_string(), "37.7749".to_string());
/// params.insert("lng".to_string(), "-122.4194".to_string());
///
/// let qs = RideFilterBackend
///     .filter_queryset(&params, RideQuerySet::default())
///     .await
///     .unwrap();
/// assert!(qs.status.is_some());
/// assert!(qs.has_distance());
/// # })
/// ```
pub struct RideFilterBackend;

#[async_trait]
impl FilterBackend for RideFilterBackend {
	async fn filter_queryset(
		&self,
		query_params: &HashMap<String, String>,
		mut queryset: RideQuerySet,
	) -> Result<RideQuerySet> {
		if let Some(status) = query_params.get("status").filter(|v| !v.is_empty()) {
			let status: RideStatus = status.parse().map_err(|_| {
				Error::validation(
					"status",
					format!(
						"Select a valid choice. Choices are: {}",
						RideStatus::choices().join(", ")
					),
				)
			})?;
			queryset.status = Some(status);
		}

		if let Some(email) = query_params.get("rider_email").filter(|v| !v.is_empty()) {
			queryset.rider_email = Some(email.clone());
		}

		let lat = query_params.get("lat").map(String::as_str);
		let lng = query_params.get("lng").map(String::as_str);
		queryset.distance_from = validate_coordinate_params(lat, lng)?;

		Ok(queryset)
	}
}

/// Ordering backend with an allow-list and a guard on the computed distance
/// column: `ordering=distance` without coordinates is rejected up front.
pub struct OrderingBackend {
	param_name: String,
	allowed: Vec<OrderField>,
}

impl OrderingBackend {
	pub fn new(param_name: impl Into<String>) -> Self {
		Self {
			param_name: param_name.into(),
			allowed: Vec::new(),
		}
	}

	/// Permit ordering on a field. Fields not allowed here are rejected.
	pub fn allow_field(mut self, field: OrderField) -> Self {
		self.allowed.push(field);
		self
	}

	/// Parse `"-pickup_time"` style values into a resolved ordering.
	fn parse(&self, raw: &str) -> Option<Ordering> {
		let (name, direction) = match raw.strip_prefix('-') {
			Some(name) => (name, Direction::Desc),
			None => (raw, Direction::Asc),
		};
		self.allowed
			.iter()
			.find(|f| f.param_name() == name)
			.map(|f| Ordering::new(*f, direction))
	}
}

impl Default for OrderingBackend {
	/// The ride list configuration: `pickup_time`, `distance`, `created_at`.
	fn default() -> Self {
		OrderingBackend::new("ordering")
			.allow_field(OrderField::PickupTime)
			.allow_field(OrderField::Distance)
			.allow_field(OrderField::CreatedAt)
	}
}

#[async_trait]
impl FilterBackend for OrderingBackend {
	async fn filter_queryset(
		&self,
		query_params: &HashMap<String, String>,
		mut queryset: RideQuerySet,
	) -> Result<RideQuerySet> {
		let Some(raw) = query_params.get(&self.param_name).filter(|v| !v.is_empty()) else {
			return Ok(queryset);
		};

		let ordering = self.parse(raw).ok_or_else(|| {
			Error::validation(
				&self.param_name,
				format!("Invalid ordering field: {raw}"),
			)
		})?;

		if ordering.field == OrderField::Distance && !queryset.has_distance() {
			return Err(Error::validation(
				&self.param_name,
				"Ordering by distance requires lat and lng",
			));
		}

		queryset.ordering = ordering;
		Ok(queryset)
	}
}

/// Applies a sequence of filter backends in order.
#[derive(Default)]
pub struct FilterChain {
	backends: Vec<Arc<dyn FilterBackend>>,
}

impl FilterChain {
	pub fn new() -> Self {
		Self {
			backends: Vec::new(),
		}
	}

	pub fn with_backend(mut self, backend: Arc<dyn FilterBackend>) -> Self {
		self.backends.push(backend);
		self
	}

	/// The ride list pipeline: field filters and annotation first, ordering
	/// second.
	pub fn for_rides() -> Self {
		FilterChain::new()
			.with_backend(Arc::new(RideFilterBackend))
			.with_backend(Arc::new(OrderingBackend::default()))
	}
}

#[async_trait]
impl FilterBackend for FilterChain {
	async fn filter_queryset(
		&self,
		query_params: &HashMap<String, String>,
		mut queryset: RideQuerySet,
	) -> Result<RideQuerySet> {
		for backend in &self.backends {
			queryset = backend.filter_queryset(query_params, queryset).await?;
		}
		Ok(queryset)
	}
}
