use serde_json::Value;
use time::OffsetDateTime;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ItemRow {
	pub item_id: String,
	pub user_id: String,
	pub title: String,
	pub description: String,
	pub quantity: i32,
	pub categories: Vec<String>,
	pub attributes: Value,
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub status: String,
	pub created_at: OffsetDateTime,
}

/// Attachment metadata without the payload.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AttachmentMeta {
	pub name: String,
	pub content_type: String,
	pub size: i64,
	pub position: i32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AttachmentRow {
	pub owner_id: String,
	pub name: String,
	pub content_type: String,
	pub data: Vec<u8>,
	pub position: i32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MessageRow {
	pub message_id: String,
	pub sender_id: String,
	pub recipient_id: String,
	pub text: String,
	pub sent_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRow {
	pub user_id: String,
	pub name: String,
	pub email: String,
	pub password_hash: String,
	pub avg_rating: f64,
	pub num_ratings: i32,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct RatingRow {
	pub rating_id: String,
	pub creator_id: String,
	pub recipient_id: String,
	pub recipient_is_item: bool,
	pub title: String,
	pub body: String,
	pub stars: i16,
	pub created_at: OffsetDateTime,
}
