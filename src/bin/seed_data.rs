//! Populate the database with demonstration data.
//!
//! Creates one admin, a handful of riders and drivers, rides scattered
//! around San Francisco, and a status-change event trail per ride. Safe to
//! run repeatedly after `clear_data`.

use chrono::{Duration, Utc};
use rand::Rng;
use wingz_admin::config::{self, Settings};
use wingz_admin::geo::Coordinates;
use wingz_admin::models::{RideStatus, UserRole};
use wingz_admin::store::PostgresRideStore;

const RIDERS: usize = 5;
const DRIVERS: usize = 3;
const RIDES: usize = 40;

const SF: Coordinates = Coordinates {
	latitude: 37.7749,
	longitude: -122.4194,
};

fn jitter(origin: Coordinates, rng: &mut impl Rng) -> Coordinates {
	Coordinates {
		latitude: origin.latitude + rng.gen_range(-0.25..0.25),
		longitude: origin.longitude + rng.gen_range(-0.25..0.25),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	config::init_tracing();
	let settings = Settings::from_env()?;
	let pool = sqlx::postgres::PgPoolOptions::new()
		.max_connections(5)
		.connect(&settings.database_url)
		.await?;
	let store = PostgresRideStore::new(pool);
	store.apply_schema().await?;

	store
		.insert_user(
			&settings.admin_username,
			&settings.admin_email,
			UserRole::Admin,
			None,
			"Admin",
			"User",
		)
		.await?;

	let mut rider_ids = Vec::with_capacity(RIDERS);
	for i in 1..=RIDERS {
		let id = store
			.insert_user(
				&format!("rider{i}"),
				&format!("rider{i}@example.com"),
				UserRole::Rider,
				Some(&format!("+1555000{i:04}")),
				"Rider",
				&format!("Number{i}"),
			)
			.await?;
		rider_ids.push(id);
	}

	let mut driver_ids = Vec::with_capacity(DRIVERS);
	for i in 1..=DRIVERS {
		let id = store
			.insert_user(
				&format!("driver{i}"),
				&format!("driver{i}@example.com"),
				UserRole::Driver,
				Some(&format!("+1555111{i:04}")),
				"Driver",
				&format!("Number{i}"),
			)
			.await?;
		driver_ids.push(id);
	}

	let statuses = [
		RideStatus::EnRoute,
		RideStatus::Pickup,
		RideStatus::Dropoff,
		RideStatus::Completed,
		RideStatus::Cancelled,
	];
	let now = Utc::now();

	for i in 0..RIDES {
		// Pre-compute the random pieces so nothing non-Send crosses an await.
		let (status, id_rider, id_driver, pickup, dropoff, pickup_offset_h, event_ages_h) = {
			let mut rng = rand::thread_rng();
			let status = statuses[rng.gen_range(0..statuses.len())];
			let id_rider = rider_ids[rng.gen_range(0..rider_ids.len())];
			let id_driver = (status != RideStatus::Cancelled || rng.gen_bool(0.5))
				.then(|| driver_ids[rng.gen_range(0..driver_ids.len())]);
			let pickup = jitter(SF, &mut rng);
			let dropoff = jitter(SF, &mut rng);
			let pickup_offset_h: i64 = rng.gen_range(-72..72);
			let event_ages_h: Vec<i64> =
				(0..rng.gen_range(1..4)).map(|_| rng.gen_range(0..48)).collect();
			(status, id_rider, id_driver, pickup, dropoff, pickup_offset_h, event_ages_h)
		};

		let id_ride = store
			.insert_ride(
				status,
				id_rider,
				id_driver,
				pickup,
				dropoff,
				now + Duration::hours(pickup_offset_h),
			)
			.await?;

		for age in event_ages_h {
			store
				.insert_ride_event(
					id_ride,
					&format!("Status changed to {status}"),
					now - Duration::hours(age),
				)
				.await?;
		}

		if i % 10 == 9 {
			tracing::info!(rides = i + 1, "seeded");
		}
	}

	tracing::info!(
		riders = RIDERS,
		drivers = DRIVERS,
		rides = RIDES,
		"seed complete"
	);
	Ok(())
}
