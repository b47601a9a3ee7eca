use serde::Serialize;
use uuid::Uuid;

use swap_domain::{
	rating::{MAX_STARS, MIN_STARS, Rating},
	time_serde,
};

use crate::{Error, Result, SwapService};

#[derive(Clone, Debug)]
pub struct CreateRatingRequest {
	pub creator_id: String,
	pub recipient_id: String,
	pub recipient_is_item: bool,
	pub title: String,
	pub body: String,
	pub stars: i64,
}

#[derive(Clone, Debug)]
pub struct GetRatingRequest {
	pub rating_id: String,
}

#[derive(Clone, Debug)]
pub struct UpdateRatingRequest {
	pub user_id: String,
	pub rating_id: String,
	pub title: String,
	pub body: String,
	pub stars: i64,
}

#[derive(Clone, Debug)]
pub struct DeleteRatingRequest {
	pub user_id: String,
	pub rating_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct RatingResponse {
	pub rating: Rating,
}

impl SwapService {
	/// Records a rating of a user or an item. Each creator rates a recipient once.
	pub async fn create_rating(&self, req: CreateRatingRequest) -> Result<RatingResponse> {
		let creator_id = req.creator_id.trim();
		let recipient_id = req.recipient_id.trim();

		if creator_id.is_empty() {
			return Err(Error::Unauthorized { message: "A user id is required.".to_string() });
		}
		if recipient_id.is_empty() {
			return Err(Error::invalid("recipientId must be non-empty."));
		}
		if recipient_id == creator_id {
			return Err(Error::invalid("You cannot rate yourself."));
		}

		let (title, body) = review_text(&req.title, &req.body)?;
		let stars = parse_stars(req.stars)?;
		let recipient_exists = if req.recipient_is_item {
			self.store.load_item(recipient_id).await?.is_some()
		} else {
			self.store.load_user(recipient_id).await?.is_some()
		};

		if !recipient_exists {
			return Err(Error::NotFound { message: format!("Recipient {recipient_id} not found.") });
		}

		let rating = Rating {
			id: Uuid::new_v4().to_string(),
			creator_id: creator_id.to_string(),
			recipient_id: recipient_id.to_string(),
			recipient_is_item: req.recipient_is_item,
			title,
			body,
			stars,
			created_at: time_serde::now_utc(),
		};

		self.store.insert_rating(&rating).await.map_err(|err| match err {
			Error::Conflict { .. } =>
				Error::Conflict { message: "You have already rated this recipient.".to_string() },
			other => other,
		})?;

		tracing::info!(
			rating_id = rating.id.as_str(),
			creator_id = rating.creator_id.as_str(),
			recipient_id = rating.recipient_id.as_str(),
			"Rating created."
		);

		Ok(RatingResponse { rating })
	}

	pub async fn get_rating(&self, req: GetRatingRequest) -> Result<RatingResponse> {
		let rating = self.load_rating(&req.rating_id).await?;

		Ok(RatingResponse { rating })
	}

	/// Replaces title, body and stars. Only the creator may edit.
	pub async fn update_rating(&self, req: UpdateRatingRequest) -> Result<RatingResponse> {
		let mut rating = self.load_rating(&req.rating_id).await?;

		if rating.creator_id != req.user_id {
			return Err(Error::Forbidden {
				message: "Only the creator may edit a rating.".to_string(),
			});
		}

		let (title, body) = review_text(&req.title, &req.body)?;

		rating.title = title;
		rating.body = body;
		rating.stars = parse_stars(req.stars)?;

		if !self.store.update_rating(&rating).await? {
			return Err(Error::NotFound { message: format!("Rating {} not found.", rating.id) });
		}

		tracing::info!(rating_id = rating.id.as_str(), stars = rating.stars, "Rating updated.");

		Ok(RatingResponse { rating })
	}

	pub async fn delete_rating(&self, req: DeleteRatingRequest) -> Result<()> {
		let rating = self.load_rating(&req.rating_id).await?;

		if rating.creator_id != req.user_id {
			return Err(Error::Forbidden {
				message: "Only the creator may delete a rating.".to_string(),
			});
		}
		if !self.store.delete_rating(&rating.id).await? {
			return Err(Error::NotFound { message: format!("Rating {} not found.", rating.id) });
		}

		tracing::info!(rating_id = rating.id.as_str(), "Rating deleted.");

		Ok(())
	}

	async fn load_rating(&self, rating_id: &str) -> Result<Rating> {
		self.store
			.load_rating(rating_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Rating {rating_id} not found.") })
	}
}

fn review_text(title: &str, body: &str) -> Result<(String, String)> {
	let title = title.trim();
	let body = body.trim();

	if title.is_empty() {
		return Err(Error::invalid("title must be non-empty."));
	}
	if body.is_empty() {
		return Err(Error::invalid("body must be non-empty."));
	}

	Ok((title.to_string(), body.to_string()))
}

fn parse_stars(raw: i64) -> Result<u8> {
	u8::try_from(raw)
		.ok()
		.filter(|stars| (MIN_STARS..=MAX_STARS).contains(stars))
		.ok_or_else(|| {
			Error::invalid(format!("stars must be between {MIN_STARS} and {MAX_STARS}. Got {raw}."))
		})
}
