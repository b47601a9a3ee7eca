use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use swap_domain::{
	attachment::{self, Attachment},
	attributes::{self, Attributes},
	item::{self, DEFAULT_QUANTITY, Item, ItemStatus, Location},
	time_serde,
};

use crate::{AttachmentLimit, Error, ItemView, Result, SwapService};

#[derive(Clone, Debug)]
pub struct ImageUpload {
	pub file_name: String,
	pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct CreateItemRequest {
	pub user_id: String,
	pub title: String,
	pub description: Option<String>,
	pub quantity: Option<i64>,
	pub categories: Vec<String>,
	pub location: Option<Location>,
	pub attributes: Attributes,
	pub images: Vec<ImageUpload>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateItemResponse {
	pub id: String,
}

#[derive(Clone, Debug)]
pub struct GetItemRequest {
	pub item_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct GetItemResponse {
	pub item: ItemView,
}

#[derive(Clone, Debug)]
pub struct DeleteItemRequest {
	pub user_id: String,
	pub item_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AttributesCatalogResponse {
	pub attributes: BTreeMap<&'static str, &'static [&'static str]>,
}

impl SwapService {
	pub async fn create_item(&self, req: CreateItemRequest) -> Result<CreateItemResponse> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() {
			return Err(Error::Unauthorized { message: "A user id is required.".to_string() });
		}

		let title = req.title.trim();

		if title.is_empty() {
			return Err(Error::invalid("title must be non-empty."));
		}

		let quantity = match req.quantity {
			None => DEFAULT_QUANTITY,
			Some(raw) => u32::try_from(raw)
				.map_err(|_| Error::invalid(format!("quantity must be zero or greater. Got {raw}.")))?,
		};
		let location = req
			.location
			.ok_or_else(|| Error::invalid("latitude and longitude are required."))?;

		if !location.is_finite()
			|| !(-90.0..=90.0).contains(&location.latitude)
			|| !(-180.0..=180.0).contains(&location.longitude)
		{
			return Err(Error::invalid("latitude and longitude must be valid coordinates."));
		}

		let attributes = req.attributes.normalized();

		attributes.validate()?;

		let images = self.validate_images(req.images)?;
		let item = Item {
			id: Uuid::new_v4().to_string(),
			user_id: user_id.to_string(),
			title: title.to_string(),
			description: req.description.map(|d| d.trim().to_string()).unwrap_or_default(),
			quantity,
			categories: item::normalize_categories(req.categories),
			attributes,
			location: Some(location),
			status: ItemStatus::Available,
			created_at: time_serde::now_utc(),
		};

		self.store.insert_item(&item).await?;

		for image in &images {
			if let Err(err) = self.store.put_attachment(&item.id, image).await {
				tracing::error!(item_id = item.id.as_str(), error = %err, "Failed to store image. Rolling back item.");

				if let Err(cleanup) = self.store.delete_item(&item.id).await {
					tracing::error!(item_id = item.id.as_str(), error = %cleanup, "Rollback failed.");
				}

				return Err(err);
			}
		}

		tracing::info!(
			item_id = item.id.as_str(),
			user_id = item.user_id.as_str(),
			images = images.len(),
			"Item created."
		);

		Ok(CreateItemResponse { id: item.id })
	}

	/// Single-item view with every attachment. Unavailable items are still returned.
	pub async fn get_item(&self, req: GetItemRequest) -> Result<GetItemResponse> {
		let item = self
			.store
			.load_item(&req.item_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Item {} not found.", req.item_id) })?;
		let mut views = self.attach_all(vec![item], AttachmentLimit::All).await?;
		let item = views.pop().ok_or_else(|| Error::NotFound {
			message: format!("Item {} not found.", req.item_id),
		})?;

		Ok(GetItemResponse { item })
	}

	pub async fn delete_item(&self, req: DeleteItemRequest) -> Result<()> {
		let item = self
			.store
			.load_item(&req.item_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Item {} not found.", req.item_id) })?;

		if item.user_id != req.user_id {
			return Err(Error::Forbidden {
				message: "Only the owner may delete an item.".to_string(),
			});
		}
		if !self.store.delete_item(&item.id).await? {
			return Err(Error::NotFound { message: format!("Item {} not found.", item.id) });
		}

		tracing::info!(item_id = item.id.as_str(), user_id = req.user_id.as_str(), "Item deleted.");

		Ok(())
	}

	pub fn attributes_catalog(&self) -> AttributesCatalogResponse {
		AttributesCatalogResponse { attributes: attributes::catalog() }
	}

	pub(crate) fn validate_images(&self, uploads: Vec<ImageUpload>) -> Result<Vec<Attachment>> {
		if uploads.is_empty() {
			return Err(Error::invalid("At least 1 image is required."));
		}

		let cfg = &self.cfg.attachments;
		let mut out = Vec::with_capacity(uploads.len());

		for upload in uploads {
			let extension = attachment::file_extension(&upload.file_name)
				.map(str::to_ascii_lowercase)
				.filter(|ext| cfg.allowed_extensions.iter().any(|allowed| allowed == ext));
			let content_type = extension.as_deref().and_then(attachment::content_type_for_extension);
			let Some(content_type) = content_type else {
				return Err(Error::invalid(format!(
					"Only {} files are allowed. Got {:?}.",
					cfg.allowed_extensions.join(", "),
					upload.file_name
				)));
			};

			if upload.data.len() as u64 > cfg.max_upload_bytes {
				return Err(Error::invalid(format!(
					"{} exceeds the {} byte upload limit.",
					upload.file_name, cfg.max_upload_bytes
				)));
			}

			out.push(Attachment {
				name: upload.file_name,
				content_type: content_type.to_string(),
				data: upload.data,
			});
		}

		Ok(out)
	}
}
