use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub name: String,
	pub email: String,
	#[serde(skip_serializing, default)]
	pub password_hash: String,
	pub avg_rating: f64,
	pub num_ratings: u32,
}
