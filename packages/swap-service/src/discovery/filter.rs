use std::collections::BTreeMap;

use swap_config::DistanceUnit;
use swap_domain::{
	attributes::AttributeField,
	geo::{self, BoundingBox},
	item::{Item, Location},
};

use crate::{Error, Result};

/// One conjunct of a discovery query. A rejected item reports why it was dropped.
pub trait ItemPredicate
where
	Self: Send + Sync,
{
	fn name(&self) -> &'static str;

	fn evaluate(&self, item: &Item) -> (bool, Option<String>);
}

/// Accepts items whose attribute value is one of the accepted values, for every constrained
/// field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeFacetFilter {
	fields: BTreeMap<AttributeField, Vec<String>>,
}
impl AttributeFacetFilter {
	/// Builds the filter from client supplied field names. Unknown names and empty value lists
	/// impose nothing. Names differing only in case are merged.
	pub fn new(raw: &BTreeMap<String, Vec<String>>) -> Self {
		let mut fields: BTreeMap<AttributeField, Vec<String>> = BTreeMap::new();

		for (name, values) in raw {
			let Some(field) = AttributeField::parse(name) else {
				tracing::debug!(attribute = name.as_str(), "Ignoring unknown attribute filter.");

				continue;
			};
			let accepted: Vec<String> = values
				.iter()
				.map(|value| value.trim())
				.filter(|value| !value.is_empty())
				.map(str::to_string)
				.collect();

			if accepted.is_empty() {
				continue;
			}

			let slot = fields.entry(field).or_default();

			for value in accepted {
				if !slot.iter().any(|existing| existing.eq_ignore_ascii_case(&value)) {
					slot.push(value);
				}
			}
		}

		Self { fields }
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}
}
impl ItemPredicate for AttributeFacetFilter {
	fn name(&self) -> &'static str {
		"attributes"
	}

	fn evaluate(&self, item: &Item) -> (bool, Option<String>) {
		for (field, accepted) in &self.fields {
			let Some(value) = item.attributes.get(*field) else {
				return (false, Some(format!("attributes.{field}.missing")));
			};

			if !accepted.iter().any(|candidate| candidate.eq_ignore_ascii_case(value)) {
				return (false, Some(format!("attributes.{field}.no_match")));
			}
		}

		(true, None)
	}
}

/// Single-value equality on `condition`, kept for clients predating the attribute map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionFilter {
	condition: String,
}
impl ConditionFilter {
	pub fn new(raw: Option<&str>) -> Option<Self> {
		let condition = raw?.trim();

		if condition.is_empty() {
			return None;
		}

		Some(Self { condition: condition.to_string() })
	}
}
impl ItemPredicate for ConditionFilter {
	fn name(&self) -> &'static str {
		"condition"
	}

	fn evaluate(&self, item: &Item) -> (bool, Option<String>) {
		match item.attributes.get(AttributeField::Condition) {
			Some(value) if value.eq_ignore_ascii_case(&self.condition) => (true, None),
			_ => (false, Some("condition.no_match".to_string())),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialFilter {
	center: Location,
	radius: f64,
	unit: DistanceUnit,
}
impl SpatialFilter {
	pub fn new(center: Location, radius: f64, unit: DistanceUnit) -> Result<Self> {
		if !center.latitude.is_finite() || !(-90.0..=90.0).contains(&center.latitude) {
			return Err(Error::invalid("lat must be a number between -90 and 90."));
		}
		if !center.longitude.is_finite() || !(-180.0..=180.0).contains(&center.longitude) {
			return Err(Error::invalid("long must be a number between -180 and 180."));
		}
		if !radius.is_finite() || radius < 0.0 {
			return Err(Error::invalid("radius must be a non-negative number."));
		}

		Ok(Self { center, radius, unit })
	}

	pub fn bounds(&self) -> BoundingBox {
		BoundingBox::around(self.center, self.radius, self.unit)
	}

	pub fn distance_to(&self, location: Location) -> f64 {
		geo::haversine_distance(self.center, location, self.unit)
	}
}
impl ItemPredicate for SpatialFilter {
	fn name(&self) -> &'static str {
		"spatial"
	}

	fn evaluate(&self, item: &Item) -> (bool, Option<String>) {
		let Some(location) = item.location else {
			return (false, Some("spatial.no_location".to_string()));
		};

		if !location.is_finite() || self.distance_to(location) > self.radius {
			return (false, Some("spatial.out_of_radius".to_string()));
		}

		(true, None)
	}
}
