pub mod attachments;
pub mod conversations;
pub mod discovery;
pub mod items;
pub mod memory;
pub mod messages;
pub mod postgres;
pub mod ratings;
pub mod users;

mod error;

pub use attachments::AttachmentLimit;
pub use conversations::{ConversationView, ConversationsRequest, ConversationsResponse};
pub use discovery::{DiscoveryRequest, DiscoveryResponse, ItemView, SpatialQuery};
pub use error::{Error, Result};
pub use items::{
	AttributesCatalogResponse, CreateItemRequest, CreateItemResponse, DeleteItemRequest,
	GetItemRequest, GetItemResponse, ImageUpload,
};
pub use messages::{HistoryRequest, HistoryResponse, SendMessageRequest, SendMessageResponse};
pub use ratings::{
	CreateRatingRequest, DeleteRatingRequest, GetRatingRequest, RatingResponse, UpdateRatingRequest,
};
pub use users::{
	CreateUserRequest, CreateUserResponse, GetUserRequest, GetUserResponse, PROFILE_PICTURE,
	UpdateUserRequest, UserView,
};

use std::{future::Future, pin::Pin, sync::Arc};

use swap_config::Config;
use swap_domain::{
	attachment::{Attachment, AttachmentRef},
	geo::BoundingBox,
	item::{Item, ItemStatus},
	message::Message,
	rating::Rating,
	user::User,
};
use swap_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Coarse listing prefilter pushed down to storage. Everything else runs in process.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemScan {
	pub status: Option<ItemStatus>,
	pub bounds: BoundingBox,
}
impl Default for ItemScan {
	fn default() -> Self {
		Self { status: None, bounds: BoundingBox::UNBOUNDED }
	}
}

/// Persistence seam for the marketplace. Implemented for Postgres and by [`memory::MemoryStore`].
pub trait Store
where
	Self: Send + Sync,
{
	/// Items passing `scan`, newest first with ties broken by id.
	fn scan_items<'a>(&'a self, scan: ItemScan) -> BoxFuture<'a, Result<Vec<Item>>>;

	fn load_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<Option<Item>>>;

	fn insert_item<'a>(&'a self, item: &'a Item) -> BoxFuture<'a, Result<()>>;

	/// Removes the item with its attachments. Resolves to `false` when nothing was deleted.
	fn delete_item<'a>(&'a self, item_id: &'a str) -> BoxFuture<'a, Result<bool>>;

	/// Attachment metadata for `owner_id` in storage order.
	fn list_attachment_names<'a>(
		&'a self,
		owner_id: &'a str,
	) -> BoxFuture<'a, Result<Vec<AttachmentRef>>>;

	fn get_attachment<'a>(
		&'a self,
		owner_id: &'a str,
		name: &'a str,
	) -> BoxFuture<'a, Result<Attachment>>;

	fn put_attachment<'a>(
		&'a self,
		owner_id: &'a str,
		attachment: &'a Attachment,
	) -> BoxFuture<'a, Result<()>>;

	fn messages_involving<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Message>>>;

	/// Messages in both directions between `a` and `b`, oldest first.
	fn messages_between<'a>(
		&'a self,
		a: &'a str,
		b: &'a str,
	) -> BoxFuture<'a, Result<Vec<Message>>>;

	fn insert_message<'a>(&'a self, message: &'a Message) -> BoxFuture<'a, Result<()>>;

	fn load_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Option<User>>>;

	/// Fails with [`Error::Conflict`] when the email is taken.
	fn insert_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<()>>;

	/// Rewrites name, email and password hash. Resolves to `false` when the user is unknown and
	/// fails with [`Error::Conflict`] when the email is taken.
	fn update_user<'a>(&'a self, user: &'a User) -> BoxFuture<'a, Result<bool>>;

	/// Fails with [`Error::Conflict`] when the creator already rated the recipient.
	///
	/// Every rating write refreshes the recipient's [`User::avg_rating`] and
	/// [`User::num_ratings`] when the recipient is a user.
	fn insert_rating<'a>(&'a self, rating: &'a Rating) -> BoxFuture<'a, Result<()>>;

	fn load_rating<'a>(&'a self, rating_id: &'a str) -> BoxFuture<'a, Result<Option<Rating>>>;

	/// Rewrites title, body and stars. Resolves to `false` when nothing was updated.
	fn update_rating<'a>(&'a self, rating: &'a Rating) -> BoxFuture<'a, Result<bool>>;

	fn delete_rating<'a>(&'a self, rating_id: &'a str) -> BoxFuture<'a, Result<bool>>;
}

pub struct SwapService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
}
impl SwapService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_store(cfg, Arc::new(db))
	}

	pub fn with_store(cfg: Config, store: Arc<dyn Store>) -> Self {
		Self { cfg, store }
	}
}
