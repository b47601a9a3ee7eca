use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::attributes::Attributes;

pub const DEFAULT_QUANTITY: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
	pub latitude: f64,
	pub longitude: f64,
}
impl Location {
	pub fn is_finite(&self) -> bool {
		self.latitude.is_finite() && self.longitude.is_finite()
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
	#[default]
	Available,
	Unavailable,
}
impl ItemStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Available => "available",
			Self::Unavailable => "unavailable",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"available" => Some(Self::Available),
			"unavailable" => Some(Self::Unavailable),
			_ => None,
		}
	}
}
impl fmt::Display for ItemStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
	pub id: String,
	pub user_id: String,
	pub title: String,
	pub description: String,
	pub quantity: u32,
	pub categories: Vec<String>,
	pub attributes: Attributes,
	pub location: Option<Location>,
	pub status: ItemStatus,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

/// Deduplicates and trims category tags. Tag order carries no meaning, so the result is
/// sorted.
pub fn normalize_categories<I>(categories: I) -> Vec<String>
where
	I: IntoIterator<Item = String>,
{
	let mut out: Vec<String> = categories
		.into_iter()
		.map(|category| category.trim().to_string())
		.filter(|category| !category.is_empty())
		.collect();

	out.sort();
	out.dedup();

	out
}
