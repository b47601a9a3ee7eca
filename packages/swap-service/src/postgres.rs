//! [`Store`] backed by the Postgres schema in `swap-storage`.

use swap_domain::{
	attachment::{Attachment, AttachmentRef},
	attributes::Attributes,
	item::{Item, ItemStatus, Location},
	message::Message,
	rating::Rating,
	user::User,
};
use swap_storage::{
	db::Db,
	models::{ItemRow, MessageRow, RatingRow, UserRow},
	queries::{self, ItemScanArgs},
};

use crate::{BoxFuture, Error, ItemScan, Result, Store};

impl Store for Db {
	fn scan_items<'a>(&'a self, scan: ItemScan) -> BoxFuture<'a, Result<Vec<Item>>> {
		Box::pin(async move {
			let args = ItemScanArgs {
				status: scan.status.as_ref().map(ItemStatus::as_str),
				latitude: scan.bounds.latitude,
				longitude: scan.bounds.longitude,
			};
			let rows = queries::scan_items(self, args).await?;

			rows.into_iter().map(item_from_row).collect()
		})
	}

	fn load_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<Option<Item>>> {
		Box::pin(async move { queries::get_item(self, item_id).await?.map(item_from_row).transpose() })
	}

	fn insert_item<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let row = item_to_row(item)?;

			queries::insert_item(self, &row).await?;

			Ok(())
		})
	}

	fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::delete_item(self, item_id).await?) })
	}

	fn list_attachment_names<'a>(
		&'a self,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<AttachmentRef>>> {
		Box::pin(async move {
			let metas = queries::list_attachments(self, owner_id).await?;

			Ok(metas
				.into_iter()
				.map(|meta| AttachmentRef {
					name: meta.name,
					content_type: meta.content_type,
					size: u64::try_from(meta.size).unwrap_or(0),
				})
				.collect())
		})
	}

	fn get_attachment<'a>(
		&'a self,
		owner_id: &'a str,
		name: &'a str,
	) -> BoxFuture<'a, Result<Attachment>> {
		Box::pin(async move {
			let row = queries::get_attachment(self, owner_id, name).await?.ok_or_else(|| {
				Error::NotFound { message: format!("Attachment {name} of {owner_id} not found.") }
			})?;

			Ok(Attachment { name: row.name, content_type: row.content_type, data: row.data })
		})
	}

	fn put_attachment<'a>(
		&'a self,
		owner_id: &'a str,
		attachment: &'a Attachment,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::put_attachment(
				self,
				owner_id,
				&attachment.name,
				&attachment.content_type,
				&attachment.data,
			)
			.await?;

			Ok(())
		})
	}

	fn messages_involving<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			let rows = queries::messages_involving(self, user_id).await?;

			Ok(rows.into_iter().map(message_from_row).collect())
		})
	}

	fn messages_between<'a>(
		&'a self,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			let rows = queries::messages_between(self, a, b).await?;

			Ok(rows.into_iter().map(message_from_row).collect())
		})
	}

	fn insert_message<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let row = MessageRow {
				message_id: message.id.clone(),
				sender_id: message.sender_id.clone(),
				recipient_id: message.recipient_id.clone(),
				text: message.text.clone(),
				sent_at: message.sent_at,
			};

			queries::insert_message(self, &row).await?;

			Ok(())
		})
	}

	fn load_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move {
			let row = queries::get_user(self, user_id).await?;

			Ok(row.map(|row| User {
				id: row.user_id,
				name: row.name,
				email: row.email,
				password_hash: row.password_hash,
				avg_rating: row.avg_rating,
				num_ratings: u32::try_from(row.num_ratings).unwrap_or(0),
			}))
		})
	}

	fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::insert_user(self, &user_to_row(user)).await?;

			Ok(())
		})
	}

	fn update_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::update_user(self, &user_to_row(user)).await?) })
	}

	fn insert_rating<'a>(&'a self, rating: &'a Rating) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::insert_rating(self, &rating_to_row(rating)).await?;

			Ok(())
		})
	}

	fn load_rating<'a>(&'a self, rating_id: &'a str) -> BoxFuture<'a, Result<Option<Rating>>> {
		Box::pin(async move {
			queries::get_rating(self, rating_id).await?.map(rating_from_row).transpose()
		})
	}

	fn update_rating<'a>(&'a self, rating: &'a Rating) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::update_rating(self, &rating_to_row(rating)).await?) })
	}

	fn delete_rating<'a>(&'a self, rating_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(queries::delete_rating(self, rating_id).await?) })
	}
}

fn item_from_row(row: ItemRow) -> Result<Item> {
	let status = ItemStatus::parse(&row.status).ok_or_else(|| Error::Storage {
		message: format!("Item {} has unknown status {:?}.", row.item_id, row.status),
	})?;
	let attributes: Attributes = serde_json::from_value(row.attributes).map_err(|err| {
		Error::Storage { message: format!("Item {} has malformed attributes: {err}.", row.item_id) }
	})?;
	let location = match (row.latitude, row.longitude) {
		(Some(latitude), Some(longitude)) => Some(Location { latitude, longitude }),
		_ => None,
	};

	Ok(Item {
		id: row.item_id,
		user_id: row.user_id,
		title: row.title,
		description: row.description,
		quantity: u32::try_from(row.quantity).unwrap_or(0),
		categories: row.categories,
		attributes,
		location,
		status,
		created_at: row.created_at,
	})
}

fn item_to_row(item: &Item) -> Result<ItemRow> {
	let quantity = i32::try_from(item.quantity)
		.map_err(|_| Error::invalid(format!("quantity {} is too large.", item.quantity)))?;
	let attributes = serde_json::to_value(&item.attributes)
		.map_err(|err| Error::Storage { message: format!("Failed to encode attributes: {err}.") })?;

	Ok(ItemRow {
		item_id: item.id.clone(),
		user_id: item.user_id.clone(),
		title: item.title.clone(),
		description: item.description.clone(),
		quantity,
		categories: item.categories.clone(),
		attributes,
		latitude: item.location.map(|location| location.latitude),
		longitude: item.location.map(|location| location.longitude),
		status: item.status.as_str().to_string(),
		created_at: item.created_at,
	})
}

fn user_to_row(user: &User) -> UserRow {
	UserRow {
		user_id: user.id.clone(),
		name: user.name.clone(),
		email: user.email.clone(),
		password_hash: user.password_hash.clone(),
		avg_rating: user.avg_rating,
		num_ratings: i32::try_from(user.num_ratings).unwrap_or(i32::MAX),
	}
}

fn rating_from_row(row: RatingRow) -> Result<Rating> {
	let stars = u8::try_from(row.stars).map_err(|_| Error::Storage {
		message: format!("Rating {} has out of range stars {}.", row.rating_id, row.stars),
	})?;

	Ok(Rating {
		id: row.rating_id,
		creator_id: row.creator_id,
		recipient_id: row.recipient_id,
		recipient_is_item: row.recipient_is_item,
		title: row.title,
		body: row.body,
		stars,
		created_at: row.created_at,
	})
}

fn rating_to_row(rating: &Rating) -> RatingRow {
	RatingRow {
		rating_id: rating.id.clone(),
		creator_id: rating.creator_id.clone(),
		recipient_id: rating.recipient_id.clone(),
		recipient_is_item: rating.recipient_is_item,
		title: rating.title.clone(),
		body: rating.body.clone(),
		stars: i16::from(rating.stars),
		created_at: rating.created_at,
	}
}

fn message_from_row(row: MessageRow) -> Message {
	Message {
		id: row.message_id,
		sender_id: row.sender_id,
		recipient_id: row.recipient_id,
		text: row.text,
		sent_at: row.sent_at,
	}
}
