//! Request handlers for the admin API.
//!
//! `RideViewSet::list` is the assembly point: filter pipeline, pagination,
//! one count, one page fetch, one bulk event fetch. The clock is read once
//! per request so every ride on a page shares the same 24-hour cutoff.

use crate::error::{Error, Result};
use crate::events::load_todays_events;
use crate::filters::{FilterBackend, FilterChain};
use crate::http::{Request, Response};
use crate::pagination::PageNumberPagination;
use crate::permissions::{check, AllowAny, IsAdmin, Permission};
use crate::query::RideQuerySet;
use crate::serializers::{RideDetail, RideEventOut, UserOut};
use crate::store::RideStore;
use chrono::Utc;
use hyper::StatusCode;
use std::sync::Arc;

fn id_param(request: &Request) -> Result<i64> {
	request
		.path_param("id")
		.and_then(|raw| raw.parse().ok())
		.ok_or(Error::NotFound)
}

/// List and detail views over rides.
pub struct RideViewSet {
	store: Arc<dyn RideStore>,
	filters: FilterChain,
	pagination: PageNumberPagination,
	permission: Box<dyn Permission>,
}

impl RideViewSet {
	pub fn new(store: Arc<dyn RideStore>) -> Self {
		Self {
			store,
			filters: FilterChain::for_rides(),
			pagination: PageNumberPagination::default(),
			permission: Box::new(IsAdmin),
		}
	}

	/// `GET /rides`
	pub async fn list(&self, request: &Request) -> Result<Response> {
		check(self.permission.as_ref(), request)?;
		let now = Utc::now();

		let params = request.decoded_query_params();
		let queryset = self
			.filters
			.filter_queryset(&params, RideQuerySet::default())
			.await?;
		let page = self.pagination.page_request(&params)?;

		let count = self.store.count_rides(&queryset).await?;
		let records = self
			.store
			.fetch_rides(&queryset.page(page.size, page.offset()))
			.await?;

		let ride_ids: Vec<i64> = records.iter().map(|r| r.ride.id_ride).collect();
		let events = load_todays_events(self.store.as_ref(), &ride_ids, now).await?;

		let results: Vec<RideDetail> = records
			.iter()
			.map(|record| {
				let timeline = events
					.get(&record.ride.id_ride)
					.map(Vec::as_slice)
					.unwrap_or(&[]);
				RideDetail::from_record(record, timeline)
			})
			.collect();

		let envelope =
			self.pagination
				.build_response(results, count, page, request.path(), &params);
		Ok(Response::json(StatusCode::OK, &envelope))
	}

	/// `GET /rides/{id}`
	pub async fn retrieve(&self, request: &Request) -> Result<Response> {
		check(self.permission.as_ref(), request)?;
		let now = Utc::now();

		let id_ride = id_param(request)?;
		let record = self.store.get_ride(id_ride).await?.ok_or(Error::NotFound)?;
		let events = load_todays_events(self.store.as_ref(), &[id_ride], now).await?;
		let timeline = events.get(&id_ride).map(Vec::as_slice).unwrap_or(&[]);

		Ok(Response::json(
			StatusCode::OK,
			&RideDetail::from_record(&record, timeline),
		))
	}
}

/// Read-only user listing for administrators.
pub struct UserViewSet {
	store: Arc<dyn RideStore>,
	pagination: PageNumberPagination,
	permission: Box<dyn Permission>,
}

impl UserViewSet {
	pub fn new(store: Arc<dyn RideStore>) -> Self {
		Self {
			store,
			pagination: PageNumberPagination::default(),
			permission: Box::new(IsAdmin),
		}
	}

	/// `GET /users`
	pub async fn list(&self, request: &Request) -> Result<Response> {
		check(self.permission.as_ref(), request)?;
		let params = request.decoded_query_params();
		let page = self.pagination.page_request(&params)?;

		let count = self.store.count_users().await?;
		let users = self.store.fetch_users(page.size, page.offset()).await?;
		let results: Vec<UserOut> = users.iter().map(UserOut::from).collect();

		let envelope =
			self.pagination
				.build_response(results, count, page, request.path(), &params);
		Ok(Response::json(StatusCode::OK, &envelope))
	}

	/// `GET /users/{id}`
	pub async fn retrieve(&self, request: &Request) -> Result<Response> {
		check(self.permission.as_ref(), request)?;
		let id = id_param(request)?;
		let user = self.store.get_user(id).await?.ok_or(Error::NotFound)?;
		Ok(Response::json(StatusCode::OK, &UserOut::from(&user)))
	}
}

/// Read-only ride event listing, newest first.
pub struct RideEventViewSet {
	store: Arc<dyn RideStore>,
	pagination: PageNumberPagination,
	permission: Box<dyn Permission>,
}

impl RideEventViewSet {
	pub fn new(store: Arc<dyn RideStore>) -> Self {
		Self {
			store,
			pagination: PageNumberPagination::default(),
			permission: Box::new(IsAdmin),
		}
	}

	/// `GET /ride-events`
	pub async fn list(&self, request: &Request) -> Result<Response> {
		check(self.permission.as_ref(), request)?;
		let params = request.decoded_query_params();
		let page = self.pagination.page_request(&params)?;

		let count = self.store.count_events().await?;
		let events = self.store.fetch_events(page.size, page.offset()).await?;
		let results: Vec<RideEventOut> = events.iter().map(RideEventOut::from).collect();

		let envelope =
			self.pagination
				.build_response(results, count, page, request.path(), &params);
		Ok(Response::json(StatusCode::OK, &envelope))
	}

	/// `GET /ride-events/{id}`
	pub async fn retrieve(&self, request: &Request) -> Result<Response> {
		check(self.permission.as_ref(), request)?;
		let id = id_param(request)?;
		let event = self.store.get_event(id).await?.ok_or(Error::NotFound)?;
		Ok(Response::json(StatusCode::OK, &RideEventOut::from(&event)))
	}
}

/// Unauthenticated liveness probe.
pub struct HealthCheckView;

impl HealthCheckView {
	pub async fn get(&self, request: &Request) -> Result<Response> {
		check(&AllowAny, request)?;
		Ok(Response::json(
			StatusCode::OK,
			&serde_json::json!({"status": "ok"}),
		))
	}
}
