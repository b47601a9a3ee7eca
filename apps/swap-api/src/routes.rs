use std::{collections::BTreeMap, str::FromStr};

use axum::{
	Json, Router,
	extract::{
		DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, Request, State,
		multipart::{Field, MultipartError},
	},
	http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
	middleware::{self, Next},
	response::{IntoResponse, Response},
	routing::{get, post, put},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use swap_domain::{attributes::Attributes, item::Location};
use swap_service::{
	AttributesCatalogResponse, ConversationsRequest, ConversationsResponse, CreateItemRequest,
	CreateItemResponse, CreateRatingRequest, CreateUserRequest, CreateUserResponse,
	DeleteItemRequest, DeleteRatingRequest, DiscoveryRequest, DiscoveryResponse,
	Error as ServiceError, GetItemRequest, GetItemResponse, GetRatingRequest, GetUserRequest,
	GetUserResponse, HistoryRequest, HistoryResponse, ImageUpload, RatingResponse,
	SendMessageRequest, SendMessageResponse, SpatialQuery, UpdateRatingRequest, UpdateUserRequest,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	let body_limit = usize::try_from(state.service.cfg.attachments.max_upload_bytes)
		.unwrap_or(usize::MAX);
	let api = Router::new()
		.route("/items", get(list_items).post(create_item))
		.route("/items/attributes", get(attributes_catalog))
		.route("/items/{item_id}", get(get_item).delete(delete_item))
		.route("/messages", get(message_history).post(send_message))
		.route("/messages/conversations", get(conversations))
		.route("/ratings", post(create_rating))
		.route("/ratings/{rating_id}", get(get_rating).put(update_rating).delete(delete_rating))
		.route("/users", post(create_user))
		.route("/users/me", put(update_user))
		.route("/users/me/picture", put(set_profile_picture))
		.route("/users/{user_id}", get(get_user))
		.layer(DefaultBodyLimit::max(body_limit))
		.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

	Router::new().route("/health", get(health)).merge(api).with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

/// Id of the caller, as asserted by the gateway through `security.user_header`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub String);
impl FromRequestParts<AppState> for CurrentUser {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
		let header = state.service.cfg.security.user_header.as_str();
		let user_id = parts
			.headers
			.get(header)
			.and_then(|raw| raw.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty());

		match user_id {
			Some(user_id) => Ok(Self(user_id.to_string())),
			None => Err(json_error(
				StatusCode::UNAUTHORIZED,
				"unauthorized",
				format!("The {header} header is required."),
				None,
			)),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
struct ListItemsParams {
	lat: Option<String>,
	long: Option<String>,
	radius: Option<String>,
	limit: Option<String>,
	skip: Option<String>,
	attributes: Option<String>,
	condition: Option<String>,
	search: Option<String>,
}

async fn list_items(
	State(state): State<AppState>,
	Query(params): Query<ListItemsParams>,
) -> Result<Json<DiscoveryResponse>, ApiError> {
	let request = discovery_request(params)?;
	let response = state.service.discover(request).await?;

	Ok(Json(response))
}

async fn attributes_catalog(State(state): State<AppState>) -> Json<AttributesCatalogResponse> {
	Json(state.service.attributes_catalog())
}

async fn get_item(
	State(state): State<AppState>,
	Path(item_id): Path<String>,
) -> Result<Json<GetItemResponse>, ApiError> {
	let response = state.service.get_item(GetItemRequest { item_id }).await?;

	Ok(Json(response))
}

async fn create_item(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	mut multipart: Multipart,
) -> Result<Json<CreateItemResponse>, ApiError> {
	let mut request = CreateItemRequest {
		user_id,
		title: String::new(),
		description: None,
		quantity: None,
		categories: Vec::new(),
		location: None,
		attributes: Attributes::default(),
		images: Vec::new(),
	};
	let mut latitude: Option<f64> = None;
	let mut longitude: Option<f64> = None;

	while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
		let Some(name) = field.name().map(str::to_string) else { continue };

		match name.as_str() {
			"title" => request.title = field_text(field).await?,
			"description" => request.description = Some(field_text(field).await?),
			"quantity" =>
				request.quantity = Some(parse_param("quantity", &field_text(field).await?)?),
			"categories" => request.categories.push(field_text(field).await?),
			"latitude" => latitude = Some(parse_param("latitude", &field_text(field).await?)?),
			"longitude" => longitude = Some(parse_param("longitude", &field_text(field).await?)?),
			"attributes" =>
				request.attributes = parse_json("attributes", &field_text(field).await?)?,
			"images" => request.images.push(field_image(field).await?),
			other => tracing::debug!(field = other, "Ignoring unknown multipart field."),
		}
	}

	request.location = match (latitude, longitude) {
		(Some(latitude), Some(longitude)) => Some(Location { latitude, longitude }),
		(None, None) => None,
		_ => return Err(invalid_request("latitude and longitude must be provided together.", None)),
	};

	let response = state.service.create_item(request).await?;

	Ok(Json(response))
}

async fn delete_item(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	Path(item_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_item(DeleteItemRequest { user_id, item_id }).await?;

	Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageBody {
	recipient_id: String,
	text: String,
}

async fn send_message(
	State(state): State<AppState>,
	CurrentUser(sender_id): CurrentUser,
	Json(payload): Json<SendMessageBody>,
) -> Result<Json<SendMessageResponse>, ApiError> {
	let request =
		SendMessageRequest { sender_id, recipient_id: payload.recipient_id, text: payload.text };
	let response = state.service.send_message(request).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams {
	other_user_id: Option<String>,
}

async fn message_history(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
	let Some(other_user_id) = params.other_user_id.filter(|id| !id.trim().is_empty()) else {
		return Err(invalid_request(
			"otherUserId is required.",
			Some(vec!["otherUserId".to_string()]),
		));
	};
	let response = state.service.message_history(HistoryRequest { user_id, other_user_id }).await?;

	Ok(Json(response))
}

async fn conversations(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
) -> Result<Json<ConversationsResponse>, ApiError> {
	let response = state.service.conversations(ConversationsRequest { user_id }).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserBody {
	name: String,
	email: String,
	password_hash: String,
}

async fn create_user(
	State(state): State<AppState>,
	Json(payload): Json<CreateUserBody>,
) -> Result<Json<CreateUserResponse>, ApiError> {
	let request = CreateUserRequest {
		name: payload.name,
		email: payload.email,
		password_hash: payload.password_hash,
	};
	let response = state.service.create_user(request).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserBody {
	name: Option<String>,
	email: Option<String>,
	password_hash: Option<String>,
}

async fn update_user(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	Json(payload): Json<UpdateUserBody>,
) -> Result<Json<GetUserResponse>, ApiError> {
	let request = UpdateUserRequest {
		user_id,
		name: payload.name,
		email: payload.email,
		password_hash: payload.password_hash,
	};
	let response = state.service.update_user(request).await?;

	Ok(Json(response))
}

async fn get_user(
	State(state): State<AppState>,
	Path(user_id): Path<String>,
) -> Result<Json<GetUserResponse>, ApiError> {
	let response = state.service.get_user(GetUserRequest { user_id }).await?;

	Ok(Json(response))
}

async fn set_profile_picture(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
	while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
		if field.name() != Some("image") {
			continue;
		}

		let upload = field_image(field).await?;

		state.service.set_profile_picture(&user_id, upload).await?;

		return Ok(StatusCode::NO_CONTENT);
	}

	Err(invalid_request("An image field is required.", Some(vec!["image".to_string()])))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRatingBody {
	recipient_id: String,
	#[serde(default)]
	recipient_is_item: bool,
	title: String,
	body: String,
	stars: i64,
}

#[derive(Debug, Deserialize)]
struct UpdateRatingBody {
	title: String,
	body: String,
	stars: i64,
}

async fn create_rating(
	State(state): State<AppState>,
	CurrentUser(creator_id): CurrentUser,
	Json(payload): Json<CreateRatingBody>,
) -> Result<(StatusCode, Json<RatingResponse>), ApiError> {
	let request = CreateRatingRequest {
		creator_id,
		recipient_id: payload.recipient_id,
		recipient_is_item: payload.recipient_is_item,
		title: payload.title,
		body: payload.body,
		stars: payload.stars,
	};
	let response = state.service.create_rating(request).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn get_rating(
	State(state): State<AppState>,
	Path(rating_id): Path<String>,
) -> Result<Json<RatingResponse>, ApiError> {
	let response = state.service.get_rating(GetRatingRequest { rating_id }).await?;

	Ok(Json(response))
}

async fn update_rating(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	Path(rating_id): Path<String>,
	Json(payload): Json<UpdateRatingBody>,
) -> Result<Json<RatingResponse>, ApiError> {
	let request = UpdateRatingRequest {
		user_id,
		rating_id,
		title: payload.title,
		body: payload.body,
		stars: payload.stars,
	};
	let response = state.service.update_rating(request).await?;

	Ok(Json(response))
}

async fn delete_rating(
	State(state): State<AppState>,
	CurrentUser(user_id): CurrentUser,
	Path(rating_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_rating(DeleteRatingRequest { user_id, rating_id }).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn auth_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
	if let Some(expected) = state.service.cfg.security.api_auth_token.as_deref() {
		if read_bearer_token(req.headers()) != Some(expected) {
			return json_error(
				StatusCode::UNAUTHORIZED,
				"unauthorized",
				"A valid Bearer token is required.",
				None,
			)
			.into_response();
		}
	}

	next.run(req).await
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

fn discovery_request(params: ListItemsParams) -> Result<DiscoveryRequest, ApiError> {
	let (Some(lat), Some(long)) = (params.lat.as_deref(), params.long.as_deref()) else {
		return Err(invalid_request(
			"lat and long are required.",
			Some(vec!["lat".to_string(), "long".to_string()]),
		));
	};
	let location = SpatialQuery {
		latitude: parse_param("lat", lat)?,
		longitude: parse_param("long", long)?,
		radius: params.radius.as_deref().map(|radius| parse_param("radius", radius)).transpose()?,
	};
	let attributes: BTreeMap<String, Vec<String>> = match params.attributes.as_deref() {
		Some(raw) if !raw.trim().is_empty() => parse_json("attributes", raw)?,
		_ => BTreeMap::new(),
	};

	Ok(DiscoveryRequest {
		location: Some(location),
		attributes,
		condition: params.condition,
		search: params.search,
		limit: params.limit.as_deref().map(|limit| parse_param("limit", limit)).transpose()?,
		skip: params.skip.as_deref().map(|skip| parse_param("skip", skip)).transpose()?,
	})
}

fn parse_param<T>(name: &str, raw: &str) -> Result<T, ApiError>
where
	T: FromStr,
{
	raw.trim().parse().map_err(|_| {
		invalid_request(format!("{name} is malformed. Got {raw:?}."), Some(vec![name.to_string()]))
	})
}

fn parse_json<T>(name: &str, raw: &str) -> Result<T, ApiError>
where
	T: DeserializeOwned,
{
	serde_json::from_str(raw).map_err(|err| {
		invalid_request(format!("{name} must be valid JSON. {err}."), Some(vec![name.to_string()]))
	})
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
	field.text().await.map_err(multipart_error)
}

async fn field_image(field: Field<'_>) -> Result<ImageUpload, ApiError> {
	let file_name = field.file_name().map(str::to_string).unwrap_or_default();
	let data = field.bytes().await.map_err(multipart_error)?;

	Ok(ImageUpload { file_name, data: data.to_vec() })
}

fn multipart_error(err: MultipartError) -> ApiError {
	let status = err.status();
	let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
		"payload_too_large"
	} else {
		"invalid_request"
	};

	json_error(status, code, err.body_text(), None)
}

fn invalid_request(message: impl Into<String>, fields: Option<Vec<String>>) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "invalid_request", message, fields)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				json_error(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			ServiceError::Unauthorized { message } =>
				json_error(StatusCode::UNAUTHORIZED, "unauthorized", message, None),
			ServiceError::Forbidden { message } =>
				json_error(StatusCode::FORBIDDEN, "forbidden", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "not_found", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "conflict", message, None),
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage request failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"Internal error.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
