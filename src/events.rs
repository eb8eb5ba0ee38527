//! Windowed event loading for ride listings.
//!
//! One bulk store fetch covers every ride on the page; the window boundary is
//! computed once per request from a single clock reading, so all rides on a
//! page share the same cutoff.

use crate::error::Result;
use crate::models::RideEvent;
use crate::store::RideStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// How far back the nested event view reaches.
pub const EVENT_WINDOW_HOURS: i64 = 24;

/// Events from the trailing window for each of `ride_ids`, grouped by ride.
///
/// Store ordering (creation time ascending) is preserved within each group.
/// Rides without recent events are absent from the map; an empty id set
/// performs no fetch at all.
pub async fn load_todays_events(
	store: &dyn RideStore,
	ride_ids: &[i64],
	now: DateTime<Utc>,
) -> Result<HashMap<i64, Vec<RideEvent>>> {
	if ride_ids.is_empty() {
		return Ok(HashMap::new());
	}
	let since = now - Duration::hours(EVENT_WINDOW_HOURS);
	let events = store.events_since(ride_ids, since).await?;

	let mut grouped: HashMap<i64, Vec<RideEvent>> = HashMap::new();
	for event in events {
		grouped.entry(event.id_ride).or_default().push(event);
	}
	Ok(grouped)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryRideStore;
	use chrono::TimeZone;

	fn event(id: i64, id_ride: i64, created_at: DateTime<Utc>) -> RideEvent {
		RideEvent {
			id_ride_event: id,
			id_ride,
			description: format!("event {id}"),
			created_at,
		}
	}

	#[tokio::test]
	async fn test_window_includes_only_the_last_day() {
		let store = MemoryRideStore::new();
		let now = Utc.with_ymd_and_hms(2026, 8, 2, 12, 0, 0).unwrap();
		store.add_event(event(1, 5, now - Duration::hours(26)));
		store.add_event(event(2, 5, now - Duration::hours(23)));
		store.add_event(event(3, 5, now - Duration::minutes(5)));
		store.add_event(event(4, 6, now - Duration::hours(1)));

		let grouped = load_todays_events(&store, &[5, 6], now).await.unwrap();
		let ids: Vec<i64> = grouped[&5].iter().map(|e| e.id_ride_event).collect();
		assert_eq!(ids, vec![2, 3]);
		assert_eq!(grouped[&6].len(), 1);
	}

	#[tokio::test]
	async fn test_rides_without_recent_events_are_absent() {
		let store = MemoryRideStore::new();
		let now = Utc::now();
		store.add_event(event(1, 5, now - Duration::days(3)));

		let grouped = load_todays_events(&store, &[5, 9], now).await.unwrap();
		assert!(grouped.is_empty());
	}

	#[tokio::test]
	async fn test_empty_page_loads_nothing() {
		let store = MemoryRideStore::new();
		store.reset_query_count();
		let grouped = load_todays_events(&store, &[], Utc::now()).await.unwrap();
		assert!(grouped.is_empty());
		assert_eq!(store.query_count(), 0);
	}
}
