use sqlx::PgConnection;

use crate::{
	Result,
	db::Db,
	models::{AttachmentMeta, AttachmentRow, ItemRow, MessageRow, RatingRow, UserRow},
};

/// Storage-side prefilter for item listings. `None` leaves that constraint off.
#[derive(Clone, Copy, Debug, Default)]
pub struct ItemScanArgs<'a> {
	pub status: Option<&'a str>,
	pub latitude: Option<(f64, f64)>,
	pub longitude: Option<(f64, f64)>,
}

pub async fn insert_item(db: &Db, item: &ItemRow) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO items (
	item_id,
	user_id,
	title,
	description,
	quantity,
	categories,
	attributes,
	latitude,
	longitude,
	status,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
	)
	.bind(item.item_id.as_str())
	.bind(item.user_id.as_str())
	.bind(item.title.as_str())
	.bind(item.description.as_str())
	.bind(item.quantity)
	.bind(&item.categories)
	.bind(&item.attributes)
	.bind(item.latitude)
	.bind(item.longitude)
	.bind(item.status.as_str())
	.bind(item.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn get_item(db: &Db, item_id: &str) -> Result<Option<ItemRow>> {
	let row = sqlx::query_as::<_, ItemRow>(
		"\
SELECT
	item_id,
	user_id,
	title,
	description,
	quantity,
	categories,
	attributes,
	latitude,
	longitude,
	status,
	created_at
FROM items
WHERE item_id = $1",
	)
	.bind(item_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Newest first, ties by id.
pub async fn scan_items(db: &Db, args: ItemScanArgs<'_>) -> Result<Vec<ItemRow>> {
	let (min_lat, max_lat) = split_range(args.latitude);
	let (min_lon, max_lon) = split_range(args.longitude);
	let rows = sqlx::query_as::<_, ItemRow>(
		"\
SELECT
	item_id,
	user_id,
	title,
	description,
	quantity,
	categories,
	attributes,
	latitude,
	longitude,
	status,
	created_at
FROM items
WHERE ($1::text IS NULL OR status = $1)
	AND ($2::float8 IS NULL OR latitude BETWEEN $2 AND $3)
	AND ($4::float8 IS NULL OR longitude BETWEEN $4 AND $5)
ORDER BY created_at DESC, item_id ASC",
	)
	.bind(args.status)
	.bind(min_lat)
	.bind(max_lat)
	.bind(min_lon)
	.bind(max_lon)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Removes the item and its attachments. Returns whether the item existed.
pub async fn delete_item(db: &Db, item_id: &str) -> Result<bool> {
	let mut tx = db.pool.begin().await?;

	sqlx::query("DELETE FROM attachments WHERE owner_id = $1")
		.bind(item_id)
		.execute(&mut *tx)
		.await?;

	let deleted =
		sqlx::query("DELETE FROM items WHERE item_id = $1").bind(item_id).execute(&mut *tx).await?;

	tx.commit().await?;

	Ok(deleted.rows_affected() > 0)
}

pub async fn list_attachments(db: &Db, owner_id: &str) -> Result<Vec<AttachmentMeta>> {
	let rows = sqlx::query_as::<_, AttachmentMeta>(
		"\
SELECT name, content_type, octet_length(data)::int8 AS size, position
FROM attachments
WHERE owner_id = $1
ORDER BY position ASC, name ASC",
	)
	.bind(owner_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn get_attachment(db: &Db, owner_id: &str, name: &str) -> Result<Option<AttachmentRow>> {
	let row = sqlx::query_as::<_, AttachmentRow>(
		"\
SELECT owner_id, name, content_type, data, position
FROM attachments
WHERE owner_id = $1 AND name = $2",
	)
	.bind(owner_id)
	.bind(name)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Appends an attachment after the owner's existing ones. Re-uploading a name replaces the
/// payload in place.
pub async fn put_attachment(
	db: &Db,
	owner_id: &str,
	name: &str,
	content_type: &str,
	data: &[u8],
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO attachments (owner_id, name, content_type, data, position)
SELECT $1, $2, $3, $4, COALESCE(MAX(position) + 1, 0)
FROM attachments
WHERE owner_id = $1
ON CONFLICT (owner_id, name) DO UPDATE
SET content_type = EXCLUDED.content_type, data = EXCLUDED.data",
	)
	.bind(owner_id)
	.bind(name)
	.bind(content_type)
	.bind(data)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_message(db: &Db, message: &MessageRow) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO messages (message_id, sender_id, recipient_id, text, sent_at)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(message.message_id.as_str())
	.bind(message.sender_id.as_str())
	.bind(message.recipient_id.as_str())
	.bind(message.text.as_str())
	.bind(message.sent_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn messages_involving(db: &Db, user_id: &str) -> Result<Vec<MessageRow>> {
	let rows = sqlx::query_as::<_, MessageRow>(
		"\
SELECT message_id, sender_id, recipient_id, text, sent_at
FROM messages
WHERE sender_id = $1 OR recipient_id = $1
ORDER BY sent_at ASC, message_id ASC",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Both directions between two users, oldest first.
pub async fn messages_between(db: &Db, a: &str, b: &str) -> Result<Vec<MessageRow>> {
	let rows = sqlx::query_as::<_, MessageRow>(
		"\
SELECT message_id, sender_id, recipient_id, text, sent_at
FROM messages
WHERE (sender_id = $1 AND recipient_id = $2)
	OR (sender_id = $2 AND recipient_id = $1)
ORDER BY sent_at ASC, message_id ASC",
	)
	.bind(a)
	.bind(b)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Fails with [`crate::Error::Conflict`] when the email is already registered.
pub async fn insert_user(db: &Db, user: &UserRow) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO users (user_id, name, email, password_hash, avg_rating, num_ratings)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(user.user_id.as_str())
	.bind(user.name.as_str())
	.bind(user.email.as_str())
	.bind(user.password_hash.as_str())
	.bind(user.avg_rating)
	.bind(user.num_ratings)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn get_user(db: &Db, user_id: &str) -> Result<Option<UserRow>> {
	let row = sqlx::query_as::<_, UserRow>(
		"\
SELECT user_id, name, email, password_hash, avg_rating, num_ratings
FROM users
WHERE user_id = $1",
	)
	.bind(user_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Rewrites the profile fields. Returns whether the user existed. A taken email fails with
/// [`crate::Error::Conflict`].
pub async fn update_user(db: &Db, user: &UserRow) -> Result<bool> {
	let updated = sqlx::query(
		"\
UPDATE users
SET name = $2, email = $3, password_hash = $4
WHERE user_id = $1",
	)
	.bind(user.user_id.as_str())
	.bind(user.name.as_str())
	.bind(user.email.as_str())
	.bind(user.password_hash.as_str())
	.execute(&db.pool)
	.await?;

	Ok(updated.rows_affected() > 0)
}

/// Fails with [`crate::Error::Conflict`] when the creator already rated the recipient.
pub async fn insert_rating(db: &Db, rating: &RatingRow) -> Result<()> {
	let mut tx = db.pool.begin().await?;

	sqlx::query(
		"\
INSERT INTO ratings (
	rating_id,
	creator_id,
	recipient_id,
	recipient_is_item,
	title,
	body,
	stars,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
	)
	.bind(rating.rating_id.as_str())
	.bind(rating.creator_id.as_str())
	.bind(rating.recipient_id.as_str())
	.bind(rating.recipient_is_item)
	.bind(rating.title.as_str())
	.bind(rating.body.as_str())
	.bind(rating.stars)
	.bind(rating.created_at)
	.execute(&mut *tx)
	.await?;

	if !rating.recipient_is_item {
		refresh_user_rating(&mut *tx, &rating.recipient_id).await?;
	}

	tx.commit().await?;

	Ok(())
}

pub async fn get_rating(db: &Db, rating_id: &str) -> Result<Option<RatingRow>> {
	let row = sqlx::query_as::<_, RatingRow>(
		"\
SELECT
	rating_id,
	creator_id,
	recipient_id,
	recipient_is_item,
	title,
	body,
	stars,
	created_at
FROM ratings
WHERE rating_id = $1",
	)
	.bind(rating_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Rewrites title, body and stars. Returns whether the rating existed.
pub async fn update_rating(db: &Db, rating: &RatingRow) -> Result<bool> {
	let mut tx = db.pool.begin().await?;
	let updated = sqlx::query(
		"\
UPDATE ratings
SET title = $2, body = $3, stars = $4
WHERE rating_id = $1",
	)
	.bind(rating.rating_id.as_str())
	.bind(rating.title.as_str())
	.bind(rating.body.as_str())
	.bind(rating.stars)
	.execute(&mut *tx)
	.await?;

	if !rating.recipient_is_item {
		refresh_user_rating(&mut *tx, &rating.recipient_id).await?;
	}

	tx.commit().await?;

	Ok(updated.rows_affected() > 0)
}

/// Returns whether the rating existed.
pub async fn delete_rating(db: &Db, rating_id: &str) -> Result<bool> {
	let mut tx = db.pool.begin().await?;
	let deleted: Option<(String, bool)> = sqlx::query_as(
		"\
DELETE FROM ratings
WHERE rating_id = $1
RETURNING recipient_id, recipient_is_item",
	)
	.bind(rating_id)
	.fetch_optional(&mut *tx)
	.await?;

	if let Some((recipient_id, false)) = &deleted {
		refresh_user_rating(&mut *tx, recipient_id).await?;
	}

	tx.commit().await?;

	Ok(deleted.is_some())
}

/// Recomputes the average and count of ratings `user_id` received.
async fn refresh_user_rating(executor: &mut PgConnection, user_id: &str) -> Result<()> {
	sqlx::query(
		"\
UPDATE users
SET
	avg_rating = COALESCE(stats.avg_rating, 0),
	num_ratings = stats.num_ratings
FROM (
	SELECT AVG(stars)::float8 AS avg_rating, COUNT(*)::int4 AS num_ratings
	FROM ratings
	WHERE recipient_id = $1 AND NOT recipient_is_item
) AS stats
WHERE users.user_id = $1",
	)
	.bind(user_id)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

fn split_range(range: Option<(f64, f64)>) -> (Option<f64>, Option<f64>) {
	match range {
		Some((min, max)) => (Some(min), Some(max)),
		None => (None, None),
	}
}
