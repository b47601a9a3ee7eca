use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const MIN_STARS: u8 = 1;
pub const MAX_STARS: u8 = 10;

/// A review left by one user for another user or for an item. A creator rates each recipient at
/// most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
	pub id: String,
	pub creator_id: String,
	pub recipient_id: String,
	pub recipient_is_item: bool,
	pub title: String,
	pub body: String,
	pub stars: u8,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

/// Running aggregate kept on a user's profile.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RatingSummary {
	pub avg_rating: f64,
	pub num_ratings: u32,
}
impl RatingSummary {
	/// Mean and count of `stars`. An empty input averages to zero.
	pub fn from_stars(stars: impl IntoIterator<Item = u8>) -> Self {
		let mut total = 0_u64;
		let mut count = 0_u32;

		for star in stars {
			total += u64::from(star);
			count += 1;
		}

		if count == 0 {
			return Self::default();
		}

		Self { avg_rating: total as f64 / f64::from(count), num_ratings: count }
	}
}
