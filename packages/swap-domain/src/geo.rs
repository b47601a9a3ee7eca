use swap_config::DistanceUnit;

use crate::item::Location;

pub const EARTH_RADIUS_MILES: f64 = 3_958.761_3;
pub const EARTH_RADIUS_KILOMETERS: f64 = 6_371.008_8;

// Widens bounding boxes so floating point error never excludes an item the exact distance
// check would keep.
const BOX_MARGIN_DEGREES: f64 = 1e-6;

pub fn earth_radius(unit: DistanceUnit) -> f64 {
	match unit {
		DistanceUnit::Miles => EARTH_RADIUS_MILES,
		DistanceUnit::Kilometers => EARTH_RADIUS_KILOMETERS,
	}
}

/// Great-circle distance between two points using the haversine formula.
pub fn haversine_distance(a: Location, b: Location, unit: DistanceUnit) -> f64 {
	let lat_a = a.latitude.to_radians();
	let lat_b = b.latitude.to_radians();
	let d_lat = (b.latitude - a.latitude).to_radians();
	let d_lon = (b.longitude - a.longitude).to_radians();
	let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

	2.0 * earth_radius(unit) * h.sqrt().min(1.0).asin()
}

/// Coarse rectangle enclosing every point within a radius of a center. A `None` range means the
/// rectangle spans that whole axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
	pub latitude: Option<(f64, f64)>,
	pub longitude: Option<(f64, f64)>,
}
impl BoundingBox {
	pub const UNBOUNDED: Self = Self { latitude: None, longitude: None };

	pub fn around(center: Location, radius: f64, unit: DistanceUnit) -> Self {
		if !radius.is_finite()
			|| radius < 0.0
			|| !center.is_finite()
			|| !(-90.0..=90.0).contains(&center.latitude)
		{
			return Self::UNBOUNDED;
		}

		let angular = radius / earth_radius(unit);
		let lat_delta = angular.to_degrees() + BOX_MARGIN_DEGREES;
		let min_lat = center.latitude - lat_delta;
		let max_lat = center.latitude + lat_delta;

		// A polar cap covers every longitude.
		if min_lat <= -90.0 || max_lat >= 90.0 {
			return Self { latitude: Some((min_lat.max(-90.0), max_lat.min(90.0))), longitude: None };
		}

		let ratio = angular.sin() / center.latitude.to_radians().cos();

		if angular >= std::f64::consts::FRAC_PI_2 || ratio >= 1.0 {
			return Self { latitude: Some((min_lat, max_lat)), longitude: None };
		}

		let lon_delta = ratio.asin().to_degrees() + BOX_MARGIN_DEGREES;
		let min_lon = center.longitude - lon_delta;
		let max_lon = center.longitude + lon_delta;

		// Boxes crossing the antimeridian are left open on longitude rather than split.
		if min_lon < -180.0 || max_lon > 180.0 {
			return Self { latitude: Some((min_lat, max_lat)), longitude: None };
		}

		Self { latitude: Some((min_lat, max_lat)), longitude: Some((min_lon, max_lon)) }
	}

	pub fn contains(&self, point: Location) -> bool {
		let lat_ok = self
			.latitude
			.map(|(min, max)| (min..=max).contains(&point.latitude))
			.unwrap_or(true);
		let lon_ok = self
			.longitude
			.map(|(min, max)| (min..=max).contains(&point.longitude))
			.unwrap_or(true);

		lat_ok && lon_ok
	}
}
