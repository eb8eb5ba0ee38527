//! Output representations.
//!
//! Rides keep their storage field names (`id_ride`, `id_rider`) on the wire;
//! events are re-keyed to `id`/`ride_id`. The `distance` field is present
//! exactly when the query was annotated with an origin, and the nested event
//! list carries only the trailing 24-hour window.

use crate::models::{RideEvent, User};
use crate::store::RideRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct UserOut {
	pub id: i64,
	pub username: String,
	pub email: String,
	pub role: String,
	pub phone_number: Option<String>,
	pub first_name: String,
	pub last_name: String,
}

impl From<&User> for UserOut {
	fn from(user: &User) -> Self {
		Self {
			id: user.id,
			username: user.username.clone(),
			email: user.email.clone(),
			role: user.role.as_str().to_string(),
			phone_number: user.phone_number.clone(),
			first_name: user.first_name.clone(),
			last_name: user.last_name.clone(),
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct RideEventOut {
	pub id: i64,
	pub ride_id: i64,
	pub description: String,
	pub created_at: DateTime<Utc>,
}

impl From<&RideEvent> for RideEventOut {
	fn from(event: &RideEvent) -> Self {
		Self {
			id: event.id_ride_event,
			ride_id: event.id_ride,
			description: event.description.clone(),
			created_at: event.created_at,
		}
	}
}

/// One ride with its people, recent timeline and optional distance.
#[derive(Debug, Clone, Serialize)]
pub struct RideDetail {
	pub id_ride: i64,
	pub status: String,
	pub rider: UserOut,
	pub driver: Option<UserOut>,
	pub pickup_latitude: f64,
	pub pickup_longitude: f64,
	pub dropoff_latitude: f64,
	pub dropoff_longitude: f64,
	pub pickup_time: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
	pub todays_ride_events: Vec<RideEventOut>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance: Option<f64>,
}

impl RideDetail {
	pub fn from_record(record: &RideRecord, events: &[RideEvent]) -> Self {
		let ride = &record.ride;
		Self {
			id_ride: ride.id_ride,
			status: ride.status.as_str().to_string(),
			rider: UserOut::from(&record.rider),
			driver: record.driver.as_ref().map(UserOut::from),
			pickup_latitude: ride.pickup_latitude,
			pickup_longitude: ride.pickup_longitude,
			dropoff_latitude: ride.dropoff_latitude,
			dropoff_longitude: ride.dropoff_longitude,
			pickup_time: ride.pickup_time,
			created_at: ride.created_at,
			updated_at: ride.updated_at,
			todays_ride_events: events.iter().map(RideEventOut::from).collect(),
			distance: record.distance,
		}
	}
}
