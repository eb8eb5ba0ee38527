//! The seam to the persistence collaborator.
//!
//! The core builds `RideQuerySet` descriptions and hands them to a
//! `RideStore`; it never issues SQL itself. Two implementations ship: a
//! Postgres store that pushes filtering, distance annotation and sorting down
//! into the engine, and an in-memory store that interprets the same
//! description over fetched data (used by tests and local development).
//!
//! All operations are read-only and are awaited sqlx-style futures: dropping
//! the request future cancels the in-flight query, and nothing is retried.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{Ride, RideEvent, User};
use crate::query::RideQuerySet;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryRideStore;
pub use postgres::PostgresRideStore;

/// One ride result row: the ride, its rider and optional driver already
/// joined, and the distance annotation when the query carried one.
#[derive(Debug, Clone)]
pub struct RideRecord {
	pub ride: Ride,
	pub rider: User,
	pub driver: Option<User>,
	/// Present iff the query was annotated with an origin coordinate.
	pub distance: Option<f64>,
}

/// Read-only access to rides, users and ride events.
///
/// The performance contract for list assembly: one call here is one query
/// (or one bounded set of queries) against the store, regardless of how many
/// rides are on the page.
#[async_trait]
pub trait RideStore: Send + Sync {
	/// Number of rides matching the query's filters (the page window is
	/// ignored).
	async fn count_rides(&self, queryset: &RideQuerySet) -> Result<u64>;

	/// The rides matching the query, with rider/driver attached in the same
	/// fetch and the distance annotation applied when requested.
	async fn fetch_rides(&self, queryset: &RideQuerySet) -> Result<Vec<RideRecord>>;

	/// A single ride by identifier, rider/driver attached, no annotation.
	async fn get_ride(&self, id_ride: i64) -> Result<Option<RideRecord>>;

	/// All events belonging to any of `ride_ids` created at or after
	/// `since`, ordered by creation time ascending. One bulk fetch for the
	/// whole id set.
	async fn events_since(
		&self,
		ride_ids: &[i64],
		since: DateTime<Utc>,
	) -> Result<Vec<RideEvent>>;

	async fn count_users(&self) -> Result<u64>;
	async fn fetch_users(&self, limit: u64, offset: u64) -> Result<Vec<User>>;
	async fn get_user(&self, id: i64) -> Result<Option<User>>;

	/// Events ordered newest-first, for the admin event listing.
	async fn count_events(&self) -> Result<u64>;
	async fn fetch_events(&self, limit: u64, offset: u64) -> Result<Vec<RideEvent>>;
	async fn get_event(&self, id: i64) -> Result<Option<RideEvent>>;
}
