//! Postgres-backed store with query pushdown.
//!
//! Filtering, distance annotation and sorting are rendered into the SELECT so
//! the engine evaluates them over the full candidate set; the application only
//! ever receives one page of rows. Rider and driver are joined in the same
//! statement, and the event window is one `= ANY($1)` bulk fetch.

use crate::error::{Error, Result};
use crate::geo::Coordinates;
use crate::models::{Ride, RideEvent, User};
use crate::query::{OrderField, RideQuerySet};
use crate::store::{RideRecord, RideStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};

pub struct PostgresRideStore {
	pool: PgPool,
}

const RIDE_COLUMNS: &str = "r.id_ride, r.status, r.id_rider, r.id_driver, \
	 r.pickup_latitude, r.pickup_longitude, r.dropoff_latitude, r.dropoff_longitude, \
	 r.pickup_time, r.created_at, r.updated_at";

const USER_COLUMNS: &str =
	"id, username, email, role, phone_number, first_name, last_name";

const EVENT_COLUMNS: &str = "id_ride_event, id_ride, description, created_at";

/// Aliased user columns for one side of the join (`rider_id`, `rider_email`,
/// ...), matching `User::from_prefixed_row`.
fn joined_user_columns(alias: &str) -> String {
	[
		"id",
		"username",
		"email",
		"role",
		"phone_number",
		"first_name",
		"last_name",
	]
	.iter()
	.map(|col| format!("{alias}.{col} AS {alias}_{col}"))
	.collect::<Vec<_>>()
	.join(", ")
}

/// The great-circle distance of each ride's pickup point from `origin`, as a
/// SQL expression. The arccos argument is clamped to [-1, 1] in-engine, same
/// as the in-process calculator. `origin` is range-validated before it gets
/// here, so inlining the literals is safe.
pub(crate) fn distance_expr(origin: Coordinates) -> String {
	let lat = origin.latitude;
	let lng = origin.longitude;
	format!(
		"6371 * ACOS(LEAST(1.0, GREATEST(-1.0, \
		 COS(RADIANS({lat})) * COS(RADIANS(r.pickup_latitude)) * \
		 COS(RADIANS(r.pickup_longitude) - RADIANS({lng})) + \
		 SIN(RADIANS({lat})) * SIN(RADIANS(r.pickup_latitude)))))"
	)
}

/// Escape `%`, `_` and `\` so user input matches literally inside a LIKE
/// pattern.
fn escape_like(pattern: &str) -> String {
	pattern
		.replace('\\', "\\\\")
		.replace('%', "\\%")
		.replace('_', "\\_")
}

fn order_column(field: OrderField) -> &'static str {
	match field {
		OrderField::PickupTime => "r.pickup_time",
		OrderField::Distance => "distance",
		OrderField::CreatedAt => "r.created_at",
	}
}

/// SELECT with both user joins and the optional distance annotation, no
/// predicates yet.
fn select_base(distance_from: Option<Coordinates>) -> QueryBuilder<'static, Postgres> {
	let mut qb = QueryBuilder::new("SELECT ");
	qb.push(RIDE_COLUMNS);
	qb.push(", ");
	qb.push(joined_user_columns("rider"));
	qb.push(", ");
	qb.push(joined_user_columns("driver"));
	if let Some(origin) = distance_from {
		qb.push(", ");
		qb.push(distance_expr(origin));
		qb.push(" AS distance");
	}
	qb.push(
		" FROM ride r \
		 JOIN users rider ON rider.id = r.id_rider \
		 LEFT JOIN users driver ON driver.id = r.id_driver",
	);
	qb
}

fn push_filters(qb: &mut QueryBuilder<'static, Postgres>, queryset: &RideQuerySet) {
	let mut prefix = " WHERE ";
	if let Some(status) = queryset.status {
		qb.push(prefix);
		qb.push("r.status = ");
		qb.push_bind(status.as_str());
		prefix = " AND ";
	}
	if let Some(email) = &queryset.rider_email {
		qb.push(prefix);
		qb.push("rider.email ILIKE ");
		qb.push_bind(format!("%{}%", escape_like(email)));
	}
}

/// The full list statement: filters, annotation, ordering, page window.
pub(crate) fn rides_select(queryset: &RideQuerySet) -> QueryBuilder<'static, Postgres> {
	let mut qb = select_base(queryset.distance_from);
	push_filters(&mut qb, queryset);

	qb.push(format!(
		" ORDER BY {} {}",
		order_column(queryset.ordering.field),
		queryset.ordering.direction.sql_keyword()
	));

	// The window binds as i64; a saturated u64 offset must not wrap negative.
	if let Some(limit) = queryset.limit {
		qb.push(" LIMIT ");
		qb.push_bind(limit.min(i64::MAX as u64) as i64);
	}
	if queryset.offset > 0 {
		qb.push(" OFFSET ");
		qb.push_bind(queryset.offset.min(i64::MAX as u64) as i64);
	}
	qb
}

/// The matching COUNT statement (no annotation, no window).
pub(crate) fn rides_count(queryset: &RideQuerySet) -> QueryBuilder<'static, Postgres> {
	let mut qb =
		QueryBuilder::new("SELECT COUNT(*) FROM ride r JOIN users rider ON rider.id = r.id_rider");
	push_filters(&mut qb, queryset);
	qb
}

fn record_from_row(row: &PgRow, with_distance: bool) -> Result<RideRecord, sqlx::Error> {
	let ride = Ride::from_row(row)?;
	let rider = User::from_prefixed_row(row, "rider")?;
	let driver = match row.try_get::<Option<i64>, _>("driver_id")? {
		Some(_) => Some(User::from_prefixed_row(row, "driver")?),
		None => None,
	};
	let distance = if with_distance {
		Some(row.try_get("distance")?)
	} else {
		None
	};
	Ok(RideRecord {
		ride,
		rider,
		driver,
		distance,
	})
}

impl PostgresRideStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	/// Create the tables and indexes if they do not exist yet.
	pub async fn apply_schema(&self) -> Result<()> {
		sqlx::raw_sql(include_str!("../../migrations/schema.sql"))
			.execute(&self.pool)
			.await
			.map_err(Error::from)?;
		Ok(())
	}

	pub async fn insert_user(
		&self,
		username: &str,
		email: &str,
		role: crate::models::UserRole,
		phone_number: Option<&str>,
		first_name: &str,
		last_name: &str,
	) -> Result<i64> {
		let id = sqlx::query_scalar::<_, i64>(
			"INSERT INTO users (username, email, role, phone_number, first_name, last_name) \
			 VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
		)
		.bind(username)
		.bind(email)
		.bind(role.as_str())
		.bind(phone_number)
		.bind(first_name)
		.bind(last_name)
		.fetch_one(&self.pool)
		.await?;
		Ok(id)
	}

	#[allow(clippy::too_many_arguments)]
	pub async fn insert_ride(
		&self,
		status: crate::models::RideStatus,
		id_rider: i64,
		id_driver: Option<i64>,
		pickup: Coordinates,
		dropoff: Coordinates,
		pickup_time: DateTime<Utc>,
	) -> Result<i64> {
		let id = sqlx::query_scalar::<_, i64>(
			"INSERT INTO ride (status, id_rider, id_driver, pickup_latitude, pickup_longitude, \
			 dropoff_latitude, dropoff_longitude, pickup_time) \
			 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id_ride",
		)
		.bind(status.as_str())
		.bind(id_rider)
		.bind(id_driver)
		.bind(pickup.latitude)
		.bind(pickup.longitude)
		.bind(dropoff.latitude)
		.bind(dropoff.longitude)
		.bind(pickup_time)
		.fetch_one(&self.pool)
		.await?;
		Ok(id)
	}

	pub async fn insert_ride_event(
		&self,
		id_ride: i64,
		description: &str,
		created_at: DateTime<Utc>,
	) -> Result<i64> {
		let id = sqlx::query_scalar::<_, i64>(
			"INSERT INTO ride_event (id_ride, description, created_at) \
			 VALUES ($1, $2, $3) RETURNING id_ride_event",
		)
		.bind(id_ride)
		.bind(description)
		.bind(created_at)
		.fetch_one(&self.pool)
		.await?;
		Ok(id)
	}

	/// Empty all three tables. Seeding support only.
	pub async fn clear(&self) -> Result<()> {
		sqlx::raw_sql("TRUNCATE ride_event, ride, users RESTART IDENTITY CASCADE")
			.execute(&self.pool)
			.await
			.map_err(Error::from)?;
		Ok(())
	}
}

#[async_trait]
impl RideStore for PostgresRideStore {
	async fn count_rides(&self, queryset: &RideQuerySet) -> Result<u64> {
		let mut qb = rides_count(queryset);
		let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
		Ok(count as u64)
	}

	async fn fetch_rides(&self, queryset: &RideQuerySet) -> Result<Vec<RideRecord>> {
		let mut qb = rides_select(queryset);
		let rows = qb.build().fetch_all(&self.pool).await?;
		let records = rows
			.iter()
			.map(|row| record_from_row(row, queryset.has_distance()))
			.collect::<Result<Vec<_>, sqlx::Error>>()?;
		Ok(records)
	}

	async fn get_ride(&self, id_ride: i64) -> Result<Option<RideRecord>> {
		let mut qb = select_base(None);
		qb.push(" WHERE r.id_ride = ");
		qb.push_bind(id_ride);
		let row = qb.build().fetch_optional(&self.pool).await?;
		match row {
			Some(row) => Ok(Some(record_from_row(&row, false)?)),
			None => Ok(None),
		}
	}

	async fn events_since(
		&self,
		ride_ids: &[i64],
		since: DateTime<Utc>,
	) -> Result<Vec<RideEvent>> {
		if ride_ids.is_empty() {
			return Ok(Vec::new());
		}
		let events = sqlx::query_as::<_, RideEvent>(
			"SELECT id_ride_event, id_ride, description, created_at FROM ride_event \
			 WHERE id_ride = ANY($1) AND created_at >= $2 ORDER BY created_at ASC",
		)
		.bind(ride_ids)
		.bind(since)
		.fetch_all(&self.pool)
		.await?;
		Ok(events)
	}

	async fn count_users(&self) -> Result<u64> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
			.fetch_one(&self.pool)
			.await?;
		Ok(count as u64)
	}

	async fn fetch_users(&self, limit: u64, offset: u64) -> Result<Vec<User>> {
		let users = sqlx::query_as::<_, User>(&format!(
			"SELECT {USER_COLUMNS} FROM users ORDER BY id ASC LIMIT $1 OFFSET $2"
		))
		.bind(limit as i64)
		.bind(offset as i64)
		.fetch_all(&self.pool)
		.await?;
		Ok(users)
	}

	async fn get_user(&self, id: i64) -> Result<Option<User>> {
		let user = sqlx::query_as::<_, User>(&format!(
			"SELECT {USER_COLUMNS} FROM users WHERE id = $1"
		))
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;
		Ok(user)
	}

	async fn count_events(&self) -> Result<u64> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ride_event")
			.fetch_one(&self.pool)
			.await?;
		Ok(count as u64)
	}

	async fn fetch_events(&self, limit: u64, offset: u64) -> Result<Vec<RideEvent>> {
		let events = sqlx::query_as::<_, RideEvent>(&format!(
			"SELECT {EVENT_COLUMNS} FROM ride_event ORDER BY created_at DESC LIMIT $1 OFFSET $2"
		))
		.bind(limit as i64)
		.bind(offset as i64)
		.fetch_all(&self.pool)
		.await?;
		Ok(events)
	}

	async fn get_event(&self, id: i64) -> Result<Option<RideEvent>> {
		let event = sqlx::query_as::<_, RideEvent>(&format!(
			"SELECT {EVENT_COLUMNS} FROM ride_event WHERE id_ride_event = $1"
		))
		.bind(id)
		.fetch_optional(&self.pool)
		.await?;
		Ok(event)
	}
}
