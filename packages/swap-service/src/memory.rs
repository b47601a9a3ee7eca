//! In-process [`Store`] for tests and local runs without Postgres.

use std::{
	collections::{HashMap, HashSet},
	sync::{Mutex, MutexGuard},
	time::Duration,
};

use swap_domain::{
	attachment::{Attachment, AttachmentRef},
	item::Item,
	message::Message,
	rating::{Rating, RatingSummary},
	user::User,
};

use crate::{BoxFuture, Error, ItemScan, Result, Store};

#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<State>,
}

#[derive(Default)]
struct State {
	items: Vec<Item>,
	attachments: HashMap<String, Vec<Attachment>>,
	messages: Vec<Message>,
	users: Vec<User>,
	ratings: Vec<Rating>,
	broken_attachments: HashSet<(String, String)>,
	slow_attachments: HashMap<(String, String), Duration>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes every later fetch of `owner_id`/`name` fail with a storage error.
	pub fn break_attachment(&self, owner_id: &str, name: &str) {
		self.lock().broken_attachments.insert((owner_id.to_string(), name.to_string()));
	}

	/// Delays every later fetch of `owner_id`/`name` by `delay`.
	pub fn slow_attachment(&self, owner_id: &str, name: &str, delay: Duration) {
		self.lock().slow_attachments.insert((owner_id.to_string(), name.to_string()), delay);
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}
}

impl State {
	fn refresh_summary(&mut self, rating: &Rating) {
		if rating.recipient_is_item {
			return;
		}

		let summary = RatingSummary::from_stars(
			self.ratings
				.iter()
				.filter(|r| !r.recipient_is_item && r.recipient_id == rating.recipient_id)
				.map(|r| r.stars),
		);

		if let Some(user) = self.users.iter_mut().find(|user| user.id == rating.recipient_id) {
			user.avg_rating = summary.avg_rating;
			user.num_ratings = summary.num_ratings;
		}
	}
}

impl Store for MemoryStore {
	fn scan_items<'a>(&'a self, scan: ItemScan) -> BoxFuture<'a, Result<Vec<Item>>> {
		Box::pin(async move {
			let state = self.lock();
			let mut out: Vec<Item> = state
				.items
				.iter()
				.filter(|item| scan.status.is_none_or(|status| item.status == status))
				.filter(|item| match (scan.bounds.latitude, scan.bounds.longitude) {
					(None, None) => true,
					_ => item.location.is_some_and(|location| scan.bounds.contains(location)),
				})
				.cloned()
				.collect();

			out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

			Ok(out)
		})
	}

	fn load_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<Option<Item>>> {
		Box::pin(async move { Ok(self.lock().items.iter().find(|item| item.id == item_id).cloned()) })
	}

	fn insert_item<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();

			if state.items.iter().any(|existing| existing.id == item.id) {
				return Err(Error::Conflict { message: format!("Item {} already exists.", item.id) });
			}

			state.items.push(item.clone());

			Ok(())
		})
	}

	fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.lock();
			let before = state.items.len();

			state.items.retain(|item| item.id != item_id);
			state.attachments.remove(item_id);

			Ok(state.items.len() != before)
		})
	}

	fn list_attachment_names<'a>(
		&'a self,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<AttachmentRef>>> {
		Box::pin(async move {
			let state = self.lock();
			let refs = state
				.attachments
				.get(owner_id)
				.map(|attachments| {
					attachments
						.iter()
						.map(|attachment| AttachmentRef {
							name: attachment.name.clone(),
							content_type: attachment.content_type.clone(),
							size: attachment.data.len() as u64,
						})
						.collect()
				})
				.unwrap_or_default();

			Ok(refs)
		})
	}

	fn get_attachment<'a>(
		&'a self,
		owner_id: &'a str,
		name: &'a str,
	) -> BoxFuture<'a, Result<Attachment>> {
		Box::pin(async move {
			let key = (owner_id.to_string(), name.to_string());
			let (broken, delay, found) = {
				let state = self.lock();
				let found = state
					.attachments
					.get(owner_id)
					.and_then(|attachments| attachments.iter().find(|a| a.name == name))
					.cloned();

				(
					state.broken_attachments.contains(&key),
					state.slow_attachments.get(&key).copied(),
					found,
				)
			};

			if let Some(delay) = delay {
				tokio::time::sleep(delay).await;
			}
			if broken {
				return Err(Error::Storage {
					message: format!("Attachment {name} of {owner_id} is unreadable."),
				});
			}

			found.ok_or_else(|| Error::NotFound {
				message: format!("Attachment {name} of {owner_id} not found."),
			})
		})
	}

	fn put_attachment<'a>(
		&'a self,
		owner_id: &'a str,
		attachment: &'a Attachment,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();
			let attachments = state.attachments.entry(owner_id.to_string()).or_default();

			match attachments.iter_mut().find(|existing| existing.name == attachment.name) {
				Some(existing) => *existing = attachment.clone(),
				None => attachments.push(attachment.clone()),
			}

			Ok(())
		})
	}

	fn messages_involving<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			Ok(self.lock().messages.iter().filter(|m| m.involves(user_id)).cloned().collect())
		})
	}

	fn messages_between<'a>(
		&'a self,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, Result<Vec<Message>>> {
		Box::pin(async move {
			let mut out: Vec<Message> = self
				.lock()
				.messages
				.iter()
				.filter(|m| m.involves(a) && m.counterpart(a) == Some(b))
				.cloned()
				.collect();

			out.sort_by(|x, y| x.sent_at.cmp(&y.sent_at).then_with(|| x.id.cmp(&y.id)));

			Ok(out)
		})
	}

	fn insert_message<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			self.lock().messages.push(message.clone());

			Ok(())
		})
	}

	fn load_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move { Ok(self.lock().users.iter().find(|user| user.id == user_id).cloned()) })
	}

	fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();

			if state.users.iter().any(|existing| existing.email == user.email) {
				return Err(Error::Conflict { message: "users_email_key".to_string() });
			}
			if state.users.iter().any(|existing| existing.id == user.id) {
				return Err(Error::Conflict { message: "users_pkey".to_string() });
			}

			state.users.push(user.clone());

			Ok(())
		})
	}

	fn update_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.lock();

			let taken =
				state.users.iter().any(|other| other.email == user.email && other.id != user.id);

			if taken {
				return Err(Error::Conflict { message: "users_email_key".to_string() });
			}

			let Some(existing) = state.users.iter_mut().find(|existing| existing.id == user.id) else {
				return Ok(false);
			};

			existing.name = user.name.clone();
			existing.email = user.email.clone();
			existing.password_hash = user.password_hash.clone();

			Ok(true)
		})
	}

	fn insert_rating<'a>(&'a self, rating: &'a Rating) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut state = self.lock();

			let duplicate = state.ratings.iter().any(|existing| {
				existing.creator_id == rating.creator_id && existing.recipient_id == rating.recipient_id
			});

			if duplicate {
				return Err(Error::Conflict { message: "ratings_creator_recipient_key".to_string() });
			}

			state.ratings.push(rating.clone());
			state.refresh_summary(rating);

			Ok(())
		})
	}

	fn load_rating<'a>(&'a self, rating_id: &'a str) -> BoxFuture<'a, Result<Option<Rating>>> {
		Box::pin(async move { Ok(self.lock().ratings.iter().find(|r| r.id == rating_id).cloned()) })
	}

	fn update_rating<'a>(&'a self, rating: &'a Rating) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.lock();
			let Some(existing) = state.ratings.iter_mut().find(|existing| existing.id == rating.id)
			else {
				return Ok(false);
			};

			existing.title = rating.title.clone();
			existing.body = rating.body.clone();
			existing.stars = rating.stars;

			let updated = existing.clone();

			state.refresh_summary(&updated);

			Ok(true)
		})
	}

	fn delete_rating<'a>(&'a self, rating_id: &'a str) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut state = self.lock();
			let Some(index) = state.ratings.iter().position(|rating| rating.id == rating_id) else {
				return Ok(false);
			};
			let removed = state.ratings.remove(index);

			state.refresh_summary(&removed);

			Ok(true)
		})
	}
}
