//! Storage-facing row types for users, rides and ride events.
//!
//! Enum fields are persisted as their wire strings (`en-route`, `rider`, ...)
//! and parsed on the way out, so the rows decode from any store that speaks
//! strings for them. Write-time coordinate values are not range-checked; only
//! query input is (see `validators`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;
use std::fmt;
use std::str::FromStr;

/// Authorization class of a user. Set at creation; the admin API is only
/// reachable with `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
	Admin,
	Driver,
	Rider,
}

impl UserRole {
	pub fn as_str(&self) -> &'static str {
		match self {
			UserRole::Admin => "admin",
			UserRole::Driver => "driver",
			UserRole::Rider => "rider",
		}
	}
}

impl FromStr for UserRole {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"admin" => Ok(UserRole::Admin),
			"driver" => Ok(UserRole::Driver),
			"rider" => Ok(UserRole::Rider),
			other => Err(format!("unknown user role: {other}")),
		}
	}
}

impl fmt::Display for UserRole {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Lifecycle status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RideStatus {
	EnRoute,
	Pickup,
	Dropoff,
	Completed,
	Cancelled,
}

impl RideStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			RideStatus::EnRoute => "en-route",
			RideStatus::Pickup => "pickup",
			RideStatus::Dropoff => "dropoff",
			RideStatus::Completed => "completed",
			RideStatus::Cancelled => "cancelled",
		}
	}

	/// All valid wire values, for error messages.
	pub fn choices() -> &'static [&'static str] {
		&["en-route", "pickup", "dropoff", "completed", "cancelled"]
	}
}

impl FromStr for RideStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"en-route" => Ok(RideStatus::EnRoute),
			"pickup" => Ok(RideStatus::Pickup),
			"dropoff" => Ok(RideStatus::Dropoff),
			"completed" => Ok(RideStatus::Completed),
			"cancelled" => Ok(RideStatus::Cancelled),
			other => Err(format!("unknown ride status: {other}")),
		}
	}
}

impl fmt::Display for RideStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A platform user: rider, driver or administrator.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
	pub id: i64,
	pub username: String,
	pub email: String,
	pub role: UserRole,
	pub phone_number: Option<String>,
	pub first_name: String,
	pub last_name: String,
}

impl User {
	pub fn is_admin(&self) -> bool {
		self.role == UserRole::Admin
	}

	/// Decode from a row whose user columns carry the given alias prefix
	/// (e.g. `rider_id`, `rider_email`, ...). Used by the joined ride select.
	pub(crate) fn from_prefixed_row(row: &PgRow, prefix: &str) -> Result<Self, sqlx::Error> {
		let col = |name: &str| format!("{prefix}_{name}");
		let role: String = row.try_get(col("role").as_str())?;
		Ok(User {
			id: row.try_get(col("id").as_str())?,
			username: row.try_get(col("username").as_str())?,
			email: row.try_get(col("email").as_str())?,
			role: role.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
			phone_number: row.try_get(col("phone_number").as_str())?,
			first_name: row.try_get(col("first_name").as_str())?,
			last_name: row.try_get(col("last_name").as_str())?,
		})
	}
}

impl sqlx::FromRow<'_, PgRow> for User {
	fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
		let role: String = row.try_get("role")?;
		Ok(User {
			id: row.try_get("id")?,
			username: row.try_get("username")?,
			email: row.try_get("email")?,
			role: role.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
			phone_number: row.try_get("phone_number")?,
			first_name: row.try_get("first_name")?,
			last_name: row.try_get("last_name")?,
		})
	}
}

/// A ride. Exactly one rider; the driver may be unassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Ride {
	pub id_ride: i64,
	pub status: RideStatus,
	pub id_rider: i64,
	pub id_driver: Option<i64>,
	pub pickup_latitude: f64,
	pub pickup_longitude: f64,
	pub dropoff_latitude: f64,
	pub dropoff_longitude: f64,
	pub pickup_time: DateTime<Utc>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Ride {
	/// The pickup point as a coordinate pair.
	pub fn pickup(&self) -> crate::geo::Coordinates {
		crate::geo::Coordinates::new(self.pickup_latitude, self.pickup_longitude)
	}
}

impl sqlx::FromRow<'_, PgRow> for Ride {
	fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
		let status: String = row.try_get("status")?;
		Ok(Ride {
			id_ride: row.try_get("id_ride")?,
			status: status.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))?,
			id_rider: row.try_get("id_rider")?,
			id_driver: row.try_get("id_driver")?,
			pickup_latitude: row.try_get("pickup_latitude")?,
			pickup_longitude: row.try_get("pickup_longitude")?,
			dropoff_latitude: row.try_get("dropoff_latitude")?,
			dropoff_longitude: row.try_get("dropoff_longitude")?,
			pickup_time: row.try_get("pickup_time")?,
			created_at: row.try_get("created_at")?,
			updated_at: row.try_get("updated_at")?,
		})
	}
}

/// A timestamped event on a ride's timeline. Owned by its ride; deleting the
/// ride deletes its events. `created_at` is immutable once set.
#[derive(Debug, Clone, PartialEq)]
pub struct RideEvent {
	pub id_ride_event: i64,
	pub id_ride: i64,
	pub description: String,
	pub created_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, PgRow> for RideEvent {
	fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
		Ok(RideEvent {
			id_ride_event: row.try_get("id_ride_event")?,
			id_ride: row.try_get("id_ride")?,
			description: row.try_get("description")?,
			created_at: row.try_get("created_at")?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_ride_status_round_trips_through_wire_strings() {
		for s in RideStatus::choices() {
			let parsed: RideStatus = s.parse().unwrap();
			assert_eq!(parsed.as_str(), *s);
		}
	}

	#[test]
	fn test_unknown_status_is_rejected() {
		assert!("requested".parse::<RideStatus>().is_err());
		assert!("".parse::<RideStatus>().is_err());
	}

	#[test]
	fn test_role_serializes_lowercase() {
		assert_eq!(
			serde_json::to_string(&UserRole::Admin).unwrap(),
			"\"admin\""
		);
		assert_eq!("driver".parse::<UserRole>().unwrap(), UserRole::Driver);
	}
}
