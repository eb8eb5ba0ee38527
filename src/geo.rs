//! Great-circle distance between coordinate pairs.
//!
//! Uses the spherical law of cosines with a 6371 km Earth radius, matching
//! the expression the Postgres store pushes down. The arccos argument is
//! clamped to [-1, 1]: for identical points the dot product can overshoot 1.0
//! by a few ulps and `acos` would return NaN.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated (latitude, longitude) pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
	pub latitude: f64,
	pub longitude: f64,
}

impl Coordinates {
	pub fn new(latitude: f64, longitude: f64) -> Self {
		Self {
			latitude,
			longitude,
		}
	}

	/// True when latitude is within [-90, 90] and longitude within
	/// [-180, 180].
	pub fn in_range(&self) -> bool {
		(-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
	}
}

/// Great-circle distance in kilometers between `origin` and `target`.
///
/// # Examples
///
/// ```
/// use wingz_admin::geo::{Coordinates, great_circle_km};
///
/// let sf = Coordinates::new(37.7749, -122.4194);
/// let la = Coordinates::new(34.0522, -118.2437);
/// let km = great_circle_km(sf, la);
/// assert!((km - 559.0).abs() < 5.0);
/// ```
pub fn great_circle_km(origin: Coordinates, target: Coordinates) -> f64 {
	let o_lat = origin.latitude.to_radians();
	let t_lat = target.latitude.to_radians();
	let d_lng = target.longitude.to_radians() - origin.longitude.to_radians();

	let arg = o_lat.cos() * t_lat.cos() * d_lng.cos() + o_lat.sin() * t_lat.sin();
	EARTH_RADIUS_KM * arg.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const EPSILON: f64 = 1e-6;

	#[rstest]
	#[case(0.0, 0.0)]
	#[case(37.7749, -122.4194)]
	#[case(90.0, 0.0)]
	#[case(-90.0, 180.0)]
	#[case(45.0, -180.0)]
	fn test_distance_to_self_is_zero(#[case] lat: f64, #[case] lng: f64) {
		let p = Coordinates::new(lat, lng);
		assert!(great_circle_km(p, p).abs() < EPSILON);
	}

	#[test]
	fn test_distance_is_symmetric() {
		let a = Coordinates::new(37.7749, -122.4194);
		let b = Coordinates::new(40.7128, -74.0060);
		assert!((great_circle_km(a, b) - great_circle_km(b, a)).abs() < EPSILON);
	}

	#[test]
	fn test_antipodal_points_are_half_the_circumference() {
		let a = Coordinates::new(0.0, 0.0);
		let b = Coordinates::new(0.0, 180.0);
		let km = great_circle_km(a, b);
		assert!((km - 20015.0).abs() < 1.0, "got {km}");
	}

	#[test]
	fn test_one_degree_of_longitude_at_equator() {
		let a = Coordinates::new(0.0, 0.0);
		let b = Coordinates::new(0.0, 1.0);
		let km = great_circle_km(a, b);
		assert!((111.0..112.5).contains(&km), "got {km}");
	}

	#[test]
	fn test_clamp_prevents_nan_for_near_identical_points() {
		let a = Coordinates::new(37.774_900_000_000_1, -122.4194);
		let b = Coordinates::new(37.7749, -122.4194);
		let km = great_circle_km(a, b);
		assert!(km.is_finite());
		assert!(km >= 0.0);
	}

	#[test]
	fn test_range_check() {
		assert!(Coordinates::new(90.0, 180.0).in_range());
		assert!(Coordinates::new(-90.0, -180.0).in_range());
		assert!(!Coordinates::new(91.0, 0.0).in_range());
		assert!(!Coordinates::new(0.0, 180.1).in_range());
	}
}
