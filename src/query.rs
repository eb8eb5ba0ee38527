//! Declarative ride query description.
//!
//! `RideQuerySet` is the still-lazy query the filter pipeline builds and a
//! store executes: filters compose conjunctively, the distance annotation is
//! tagged explicitly so the sort stage can check it without relying on the
//! store to fail, and the page window is plain limit/offset.

use crate::geo::Coordinates;
use crate::models::RideStatus;

/// Sortable ride columns. `Distance` is computed, present only when the
/// query carries a coordinate annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
	PickupTime,
	Distance,
	CreatedAt,
}

impl OrderField {
	/// The ordering key as it appears in query parameters.
	pub fn param_name(&self) -> &'static str {
		match self {
			OrderField::PickupTime => "pickup_time",
			OrderField::Distance => "distance",
			OrderField::CreatedAt => "created_at",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Asc,
	Desc,
}

impl Direction {
	pub fn sql_keyword(&self) -> &'static str {
		match self {
			Direction::Asc => "ASC",
			Direction::Desc => "DESC",
		}
	}
}

/// A resolved sort: which column, which way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
	pub field: OrderField,
	pub direction: Direction,
}

impl Ordering {
	pub fn new(field: OrderField, direction: Direction) -> Self {
		Self { field, direction }
	}
}

impl Default for Ordering {
	/// Newest rides first.
	fn default() -> Self {
		Ordering::new(OrderField::CreatedAt, Direction::Desc)
	}
}

/// A lazy, composable ride query. Built by the filter backends, executed by a
/// `RideStore`. Filter application order does not change the result set; the
/// store evaluates all predicates conjunctively.
#[derive(Debug, Clone, Default)]
pub struct RideQuerySet {
	/// Exact status match.
	pub status: Option<RideStatus>,
	/// Case-insensitive substring match against the rider's email.
	pub rider_email: Option<String>,
	/// When present, every candidate row is annotated with its great-circle
	/// distance from this origin.
	pub distance_from: Option<Coordinates>,
	pub ordering: Ordering,
	pub limit: Option<u64>,
	pub offset: u64,
}

impl RideQuerySet {
	/// Whether the distance column will exist on results of this query.
	pub fn has_distance(&self) -> bool {
		self.distance_from.is_some()
	}

	/// Narrow the query to one page window.
	pub fn page(mut self, limit: u64, offset: u64) -> Self {
		self.limit = Some(limit);
		self.offset = offset;
		self
	}
}
