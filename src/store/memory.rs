//! In-memory store used by tests and local development.
//!
//! Interprets a `RideQuerySet` over plain vectors with the same semantics the
//! Postgres store pushes into SQL: conjunctive filters, join-style rider
//! resolution, the great-circle annotation, sorting and the page window. A
//! query counter records how many store round-trips a caller performed, which
//! is how list assembly is held to its fixed-query contract.

use crate::error::Result;
use crate::geo::great_circle_km;
use crate::models::{Ride, RideEvent, User};
use crate::query::{Direction, OrderField, RideQuerySet};
use crate::store::{RideRecord, RideStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

#[derive(Default)]
struct Data {
	users: Vec<User>,
	rides: Vec<Ride>,
	events: Vec<RideEvent>,
}

#[derive(Default)]
pub struct MemoryRideStore {
	data: RwLock<Data>,
	queries: AtomicUsize,
}

impl MemoryRideStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_user(&self, user: User) {
		self.data.write().users.push(user);
	}

	pub fn add_ride(&self, ride: Ride) {
		self.data.write().rides.push(ride);
	}

	pub fn add_event(&self, event: RideEvent) {
		self.data.write().events.push(event);
	}

	/// Store round-trips performed since construction or the last reset.
	pub fn query_count(&self) -> usize {
		self.queries.load(AtomicOrdering::SeqCst)
	}

	pub fn reset_query_count(&self) {
		self.queries.store(0, AtomicOrdering::SeqCst);
	}

	fn tick(&self) {
		self.queries.fetch_add(1, AtomicOrdering::SeqCst);
	}

	/// Filter + join, before annotation and ordering. A ride whose rider is
	/// absent yields no row, same as the inner join.
	fn matching(data: &Data, queryset: &RideQuerySet) -> Vec<RideRecord> {
		data.rides
			.iter()
			.filter_map(|ride| {
				let rider = data.users.iter().find(|u| u.id == ride.id_rider)?;
				if let Some(status) = queryset.status {
					if ride.status != status {
						return None;
					}
				}
				if let Some(needle) = &queryset.rider_email {
					if !rider
						.email
						.to_lowercase()
						.contains(&needle.to_lowercase())
					{
						return None;
					}
				}
				let driver = ride
					.id_driver
					.and_then(|id| data.users.iter().find(|u| u.id == id))
					.cloned();
				let distance = queryset
					.distance_from
					.map(|origin| great_circle_km(origin, ride.pickup()));
				Some(RideRecord {
					ride: ride.clone(),
					rider: rider.clone(),
					driver,
					distance,
				})
			})
			.collect()
	}

	fn sort(records: &mut [RideRecord], queryset: &RideQuerySet) {
		records.sort_by(|a, b| {
			let ordering = match queryset.ordering.field {
				OrderField::PickupTime => a.ride.pickup_time.cmp(&b.ride.pickup_time),
				OrderField::CreatedAt => a.ride.created_at.cmp(&b.ride.created_at),
				OrderField::Distance => {
					let a = a.distance.unwrap_or(f64::INFINITY);
					let b = b.distance.unwrap_or(f64::INFINITY);
					a.total_cmp(&b)
				}
			};
			match queryset.ordering.direction {
				Direction::Asc => ordering,
				Direction::Desc => ordering.reverse(),
			}
		});
	}
}

#[async_trait]
impl RideStore for MemoryRideStore {
	async fn count_rides(&self, queryset: &RideQuerySet) -> Result<u64> {
		self.tick();
		let data = self.data.read();
		Ok(Self::matching(&data, queryset).len() as u64)
	}

	async fn fetch_rides(&self, queryset: &RideQuerySet) -> Result<Vec<RideRecord>> {
		self.tick();
		let data = self.data.read();
		let mut records = Self::matching(&data, queryset);
		Self::sort(&mut records, queryset);

		let start = (queryset.offset as usize).min(records.len());
		let end = match queryset.limit {
			Some(limit) => (start + limit as usize).min(records.len()),
			None => records.len(),
		};
		Ok(records[start..end].to_vec())
	}

	async fn get_ride(&self, id_ride: i64) -> Result<Option<RideRecord>> {
		self.tick();
		let data = self.data.read();
		let record = data
			.rides
			.iter()
			.find(|r| r.id_ride == id_ride)
			.and_then(|ride| {
				let rider = data.users.iter().find(|u| u.id == ride.id_rider)?;
				let driver = ride
					.id_driver
					.and_then(|id| data.users.iter().find(|u| u.id == id))
					.cloned();
				Some(RideRecord {
					ride: ride.clone(),
					rider: rider.clone(),
					driver,
					distance: None,
				})
			});
		Ok(record)
	}

	async fn events_since(
		&self,
		ride_ids: &[i64],
		since: DateTime<Utc>,
	) -> Result<Vec<RideEvent>> {
		if ride_ids.is_empty() {
			return Ok(Vec::new());
		}
		self.tick();
		let data = self.data.read();
		let mut events: Vec<RideEvent> = data
			.events
			.iter()
			.filter(|e| ride_ids.contains(&e.id_ride) && e.created_at >= since)
			.cloned()
			.collect();
		events.sort_by_key(|e| e.created_at);
		Ok(events)
	}

	async fn count_users(&self) -> Result<u64> {
		self.tick();
		Ok(self.data.read().users.len() as u64)
	}

	async fn fetch_users(&self, limit: u64, offset: u64) -> Result<Vec<User>> {
		self.tick();
		let data = self.data.read();
		let mut users = data.users.clone();
		users.sort_by_key(|u| u.id);
		let start = (offset as usize).min(users.len());
		let end = (start + limit as usize).min(users.len());
		Ok(users[start..end].to_vec())
	}

	async fn get_user(&self, id: i64) -> Result<Option<User>> {
		self.tick();
		Ok(self.data.read().users.iter().find(|u| u.id == id).cloned())
	}

	async fn count_events(&self) -> Result<u64> {
		self.tick();
		Ok(self.data.read().events.len() as u64)
	}

	async fn fetch_events(&self, limit: u64, offset: u64) -> Result<Vec<RideEvent>> {
		self.tick();
		let data = self.data.read();
		let mut events = data.events.clone();
		events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		let start = (offset as usize).min(events.len());
		let end = (start + limit as usize).min(events.len());
		Ok(events[start..end].to_vec())
	}

	async fn get_event(&self, id: i64) -> Result<Option<RideEvent>> {
		self.tick();
		Ok(self
			.data
			.read()
			.events
			.iter()
			.find(|e| e.id_ride_event == id)
			.cloned())
	}
}
