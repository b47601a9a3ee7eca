//! The fixed attribute record carried by every item and the closed value set of each field.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

const CONDITION: &[&str] = &["new", "used", "refurbished"];
const SIZE: &[&str] = &["small", "medium", "large"];
const COLOR: &[&str] =
	&["red", "green", "blue", "black", "white", "yellow", "orange", "purple", "pink", "brown"];
const SHIPPING_OPTIONS: &[&str] = &["localPickup", "domesticShipping", "internationalShipping"];
const LISTING_TYPE: &[&str] = &["sale", "rent", "exchange"];
const ITEM_CATEGORY: &[&str] = &[
	"electronics",
	"homeAndGarden",
	"fashion",
	"beauty",
	"health",
	"sports",
	"outdoors",
	"automotive",
	"books",
	"music",
	"games",
	"toys",
	"collectibles",
	"art",
	"crafts",
	"clothing",
	"baby",
	"petSupplies",
	"travel",
];
const OWNERSHIP_HISTORY: &[&str] = &["firstOwner", "secondOwner", "multipleOwners"];
const AUTHENTICITY: &[&str] = &["authentic", "replica", "unauthorized"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
	#[error("{field} must be one of: {allowed}. Got '{value}'.")]
	InvalidValue { field: &'static str, value: String, allowed: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeField {
	Condition,
	Size,
	Color,
	ShippingOptions,
	ListingType,
	ItemCategory,
	OwnershipHistory,
	Authenticity,
}
impl AttributeField {
	pub const ALL: [Self; 8] = [
		Self::Condition,
		Self::Size,
		Self::Color,
		Self::ShippingOptions,
		Self::ListingType,
		Self::ItemCategory,
		Self::OwnershipHistory,
		Self::Authenticity,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Condition => "condition",
			Self::Size => "size",
			Self::Color => "color",
			Self::ShippingOptions => "shippingOptions",
			Self::ListingType => "listingType",
			Self::ItemCategory => "itemCategory",
			Self::OwnershipHistory => "ownershipHistory",
			Self::Authenticity => "authenticity",
		}
	}

	/// Resolves a client supplied field name, ignoring ASCII case. Returns `None` for names
	/// outside the fixed record.
	pub fn parse(name: &str) -> Option<Self> {
		let name = name.trim();

		Self::ALL.into_iter().find(|field| field.as_str().eq_ignore_ascii_case(name))
	}

	pub fn allowed_values(&self) -> &'static [&'static str] {
		match self {
			Self::Condition => CONDITION,
			Self::Size => SIZE,
			Self::Color => COLOR,
			Self::ShippingOptions => SHIPPING_OPTIONS,
			Self::ListingType => LISTING_TYPE,
			Self::ItemCategory => ITEM_CATEGORY,
			Self::OwnershipHistory => OWNERSHIP_HISTORY,
			Self::Authenticity => AUTHENTICITY,
		}
	}

	pub fn allows(&self, value: &str) -> bool {
		self.allowed_values().contains(&value)
	}
}
impl fmt::Display for AttributeField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Attributes {
	pub condition: Option<String>,
	pub size: Option<String>,
	pub color: Option<String>,
	pub shipping_options: Option<String>,
	pub listing_type: Option<String>,
	pub item_category: Option<String>,
	pub ownership_history: Option<String>,
	pub authenticity: Option<String>,
}
impl Attributes {
	pub fn get(&self, field: AttributeField) -> Option<&str> {
		self.slot(field).as_deref()
	}

	pub fn set(&mut self, field: AttributeField, value: Option<String>) {
		*self.slot_mut(field) = value;
	}

	/// Blank values are the wire encoding of "not set"; fold them into `None` and trim the
	/// rest.
	pub fn normalized(mut self) -> Self {
		for field in AttributeField::ALL {
			let slot = self.slot_mut(field);
			let value = slot.take().map(|value| value.trim().to_string());

			*slot = value.filter(|value| !value.is_empty());
		}

		self
	}

	pub fn validate(&self) -> Result<(), AttributeError> {
		for field in AttributeField::ALL {
			let Some(value) = self.get(field) else { continue };

			if !field.allows(value) {
				return Err(AttributeError::InvalidValue {
					field: field.as_str(),
					value: value.to_string(),
					allowed: field.allowed_values().join(", "),
				});
			}
		}

		Ok(())
	}

	pub fn values(&self) -> impl Iterator<Item = &str> {
		AttributeField::ALL.into_iter().filter_map(|field| self.get(field))
	}

	fn slot(&self, field: AttributeField) -> &Option<String> {
		match field {
			AttributeField::Condition => &self.condition,
			AttributeField::Size => &self.size,
			AttributeField::Color => &self.color,
			AttributeField::ShippingOptions => &self.shipping_options,
			AttributeField::ListingType => &self.listing_type,
			AttributeField::ItemCategory => &self.item_category,
			AttributeField::OwnershipHistory => &self.ownership_history,
			AttributeField::Authenticity => &self.authenticity,
		}
	}

	fn slot_mut(&mut self, field: AttributeField) -> &mut Option<String> {
		match field {
			AttributeField::Condition => &mut self.condition,
			AttributeField::Size => &mut self.size,
			AttributeField::Color => &mut self.color,
			AttributeField::ShippingOptions => &mut self.shipping_options,
			AttributeField::ListingType => &mut self.listing_type,
			AttributeField::ItemCategory => &mut self.item_category,
			AttributeField::OwnershipHistory => &mut self.ownership_history,
			AttributeField::Authenticity => &mut self.authenticity,
		}
	}
}

/// Field name to allowed values, in the shape clients use to build attribute pickers.
pub fn catalog() -> BTreeMap<&'static str, &'static [&'static str]> {
	AttributeField::ALL.into_iter().map(|field| (field.as_str(), field.allowed_values())).collect()
}
