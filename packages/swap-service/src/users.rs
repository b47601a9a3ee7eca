use serde::Serialize;
use uuid::Uuid;

use swap_domain::user::User;

use crate::{AttachmentLimit, Error, ImageUpload, Result, SwapService, attachments};

/// Attachment name under which a user's profile picture is kept. Uploading again replaces it.
pub const PROFILE_PICTURE: &str = "profile-picture";

#[derive(Clone, Debug)]
pub struct CreateUserRequest {
	pub name: String,
	pub email: String,
	/// Produced by the upstream identity service. Never returned.
	pub password_hash: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateUserResponse {
	pub id: String,
}

#[derive(Clone, Debug)]
pub struct GetUserRequest {
	pub user_id: String,
}

/// Profile edit. `None` keeps the stored value.
#[derive(Clone, Debug)]
pub struct UpdateUserRequest {
	pub user_id: String,
	pub name: Option<String>,
	pub email: Option<String>,
	pub password_hash: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
	#[serde(flatten)]
	pub user: User,
	pub profile_picture: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct GetUserResponse {
	pub user: UserView,
}

impl SwapService {
	/// Registers a profile. A taken email is a [`Error::Conflict`].
	pub async fn create_user(&self, req: CreateUserRequest) -> Result<CreateUserResponse> {
		let user = User {
			id: Uuid::new_v4().to_string(),
			name: valid_name(&req.name)?,
			email: valid_email(&req.email)?,
			password_hash: req.password_hash,
			avg_rating: 0.0,
			num_ratings: 0,
		};

		self.store.insert_user(&user).await.map_err(email_conflict)?;

		tracing::info!(user_id = user.id.as_str(), "User created.");

		Ok(CreateUserResponse { id: user.id })
	}

	pub async fn get_user(&self, req: GetUserRequest) -> Result<GetUserResponse> {
		let user = self
			.store
			.load_user(&req.user_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("User {} not found.", req.user_id) })?;
		let picture = attachments::assemble(
			self.store.as_ref(),
			&user.id,
			AttachmentLimit::AtMost(1),
			self.fetch_timeout(),
		)
		.await?;

		Ok(GetUserResponse { user: UserView { user, profile_picture: picture.into_iter().next() } })
	}

	/// Edits the caller's own profile and returns the stored result. Rating aggregates are never
	/// taken from the request.
	pub async fn update_user(&self, req: UpdateUserRequest) -> Result<GetUserResponse> {
		let mut user = self.store.load_user(&req.user_id).await?.ok_or_else(|| Error::NotFound {
			message: format!("User {} not found.", req.user_id),
		})?;

		if let Some(name) = req.name.as_deref() {
			user.name = valid_name(name)?;
		}
		if let Some(email) = req.email.as_deref() {
			user.email = valid_email(email)?;
		}
		if let Some(password_hash) = req.password_hash {
			user.password_hash = password_hash;
		}
		if !self.store.update_user(&user).await.map_err(email_conflict)? {
			return Err(Error::NotFound { message: format!("User {} not found.", user.id) });
		}

		tracing::info!(user_id = user.id.as_str(), "User updated.");

		self.get_user(GetUserRequest { user_id: user.id }).await
	}

	pub async fn set_profile_picture(&self, user_id: &str, upload: ImageUpload) -> Result<()> {
		if self.store.load_user(user_id).await?.is_none() {
			return Err(Error::NotFound { message: format!("User {user_id} not found.") });
		}

		let mut images = self.validate_images(vec![upload])?;
		let Some(mut picture) = images.pop() else {
			return Err(Error::invalid("At least 1 image is required."));
		};

		picture.name = PROFILE_PICTURE.to_string();

		self.store.put_attachment(user_id, &picture).await?;

		tracing::info!(user_id, "Profile picture updated.");

		Ok(())
	}
}

fn valid_name(raw: &str) -> Result<String> {
	let name = raw.trim();

	if name.is_empty() {
		return Err(Error::invalid("name must be non-empty."));
	}

	Ok(name.to_string())
}

fn valid_email(raw: &str) -> Result<String> {
	let email = raw.trim().to_lowercase();

	if !is_plausible_email(&email) {
		return Err(Error::invalid("email must be a valid address."));
	}

	Ok(email)
}

fn email_conflict(err: Error) -> Error {
	match err {
		Error::Conflict { .. } => Error::Conflict { message: "Email already exists.".to_string() },
		other => other,
	}
}

fn is_plausible_email(email: &str) -> bool {
	let Some((local, domain)) = email.split_once('@') else { return false };

	!local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
