//! Query-input coordinate validation.
//!
//! Runs before any distance annotation or distance sort is attempted, and is
//! applied uniformly: partial, unparsable and out-of-range coordinates are all
//! rejected rather than silently ignored.

use crate::error::{Error, Result};
use crate::geo::Coordinates;

/// Messages surfaced under the `coordinates` key.
const MSG_BOTH_REQUIRED: &str = "Both lat and lng are required together";
const MSG_BAD_FORMAT: &str = "Invalid coordinate format";
const MSG_OUT_OF_RANGE: &str = "Invalid coordinates. Lat: -90 to 90, Lng: -180 to 180";

/// Validate the optional `lat`/`lng` query parameters.
///
/// Returns `Ok(None)` when neither is supplied (no distance computation
/// requested), `Ok(Some(..))` when both parse and are in range, and a
/// validation error keyed on `coordinates` otherwise. An empty string counts
/// as absent, matching how the query layer treats blank parameters.
///
/// # Examples
///
/// ```
/// use wingz_admin::validators::validate_coordinate_params;
///
/// assert!(validate_coordinate_params(None, None).unwrap().is_none());
///
/// let coords = validate_coordinate_params(Some("37.7749"), Some("-122.4194"))
///     .unwrap()
///     .unwrap();
/// assert_eq!(coords.latitude, 37.7749);
///
/// assert!(validate_coordinate_params(Some("37.7749"), None).is_err());
/// assert!(validate_coordinate_params(Some("91"), Some("0")).is_err());
/// ```
pub fn validate_coordinate_params(
	lat: Option<&str>,
	lng: Option<&str>,
) -> Result<Option<Coordinates>> {
	let lat = lat.filter(|v| !v.is_empty());
	let lng = lng.filter(|v| !v.is_empty());

	match (lat, lng) {
		(None, None) => Ok(None),
		(Some(_), None) | (None, Some(_)) => {
			Err(Error::validation("coordinates", MSG_BOTH_REQUIRED))
		}
		(Some(lat), Some(lng)) => {
			let latitude: f64 = lat
				.parse()
				.map_err(|_| Error::validation("coordinates", MSG_BAD_FORMAT))?;
			let longitude: f64 = lng
				.parse()
				.map_err(|_| Error::validation("coordinates", MSG_BAD_FORMAT))?;

			let coords = Coordinates::new(latitude, longitude);
			if !coords.in_range() {
				return Err(Error::validation("coordinates", MSG_OUT_OF_RANGE));
			}
			Ok(Some(coords))
		}
	}
}
