use std::{collections::BTreeMap, sync::Arc};

use swap_config::{
	Attachments, Config, Discovery, DiscoveryText, DistanceUnit, Postgres, Security, Service,
	Storage,
};
use swap_domain::{attributes::Attributes, item::Location};
use swap_service::{
	ConversationsRequest, CreateItemRequest, CreateRatingRequest, CreateUserRequest,
	DeleteItemRequest, DeleteRatingRequest, DiscoveryRequest, Error, GetItemRequest,
	GetRatingRequest, GetUserRequest, HistoryRequest, ImageUpload, SendMessageRequest,
	SpatialQuery, SwapService, UpdateRatingRequest, UpdateUserRequest, memory::MemoryStore,
};

const MADISON: Location = Location { latitude: 43.0731, longitude: -89.4012 };

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused".to_string(), pool_max_conns: 1 },
		},
		discovery: Discovery {
			default_limit: 10,
			max_limit: 100,
			default_radius: 10.0,
			distance_unit: DistanceUnit::Miles,
			text: DiscoveryText {
				min_similarity: 0.8,
				preserve_trailing_space_quirk: false,
				include_description: true,
				include_tags: true,
			},
		},
		attachments: Attachments {
			list_view_max: 1,
			fetch_timeout_ms: 500,
			max_upload_bytes: 1_024,
			allowed_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
		},
		security: Security {
			bind_localhost_only: true,
			api_auth_token: None,
			user_header: "x-user-id".to_string(),
		},
	}
}

fn service() -> SwapService {
	SwapService::with_store(test_config(), Arc::new(MemoryStore::new()))
}

fn image(name: &str) -> ImageUpload {
	ImageUpload { file_name: name.to_string(), data: name.as_bytes().to_vec() }
}

fn listing(user_id: &str, title: &str, attributes: Attributes) -> CreateItemRequest {
	CreateItemRequest {
		user_id: user_id.to_string(),
		title: title.to_string(),
		description: None,
		quantity: None,
		categories: Vec::new(),
		location: Some(MADISON),
		attributes,
		images: vec![image("front.jpg"), image("back.png")],
	}
}

fn colored(color: &str) -> Attributes {
	Attributes { color: Some(color.to_string()), ..Default::default() }
}

async fn register(service: &SwapService, name: &str) -> String {
	let request = CreateUserRequest {
		name: name.to_string(),
		email: format!("{}@example.com", name.to_lowercase()),
		password_hash: "hash".to_string(),
	};

	service.create_user(request).await.expect("create user").id
}

fn rating_of(creator_id: &str, recipient_id: &str, stars: i64) -> CreateRatingRequest {
	CreateRatingRequest {
		creator_id: creator_id.to_string(),
		recipient_id: recipient_id.to_string(),
		recipient_is_item: false,
		title: "Trade".to_string(),
		body: "Went smoothly.".to_string(),
		stars,
	}
}

async fn summary(service: &SwapService, user_id: &str) -> (f64, u32) {
	let user = service
		.get_user(GetUserRequest { user_id: user_id.to_string() })
		.await
		.expect("profile")
		.user
		.user;

	(user.avg_rating, user.num_ratings)
}

#[tokio::test]
async fn color_filter_returns_only_matching_item() {
	let service = service();
	let a = service.create_item(listing("seller", "Chair A", colored("red"))).await.expect("A");

	service.create_item(listing("seller", "Chair B", colored("blue"))).await.expect("B");

	let mut attributes = BTreeMap::new();

	attributes.insert("color".to_string(), vec!["red".to_string()]);

	let response = service
		.discover(DiscoveryRequest {
			location: Some(SpatialQuery {
				latitude: MADISON.latitude,
				longitude: MADISON.longitude,
				radius: Some(10.0),
			}),
			attributes,
			..Default::default()
		})
		.await
		.expect("discover");

	assert_eq!(response.items.len(), 1);
	assert_eq!(response.items[0].item.id, a.id);
	assert_eq!(response.items[0].attachments.len(), 1, "list views inline one attachment");
	assert!(response.items[0].attachments[0].starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn single_item_view_inlines_every_attachment() {
	let service = service();
	let created = service.create_item(listing("seller", "Lamp", colored("red"))).await.expect("create");
	let fetched =
		service.get_item(GetItemRequest { item_id: created.id.clone() }).await.expect("get");

	assert_eq!(fetched.item.item.quantity, 1);
	assert_eq!(fetched.item.attachments.len(), 2);
	assert!(fetched.item.attachments[1].starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn create_item_rejects_bad_input() {
	let service = service();
	let mut no_images = listing("seller", "Lamp", Attributes::default());

	no_images.images.clear();

	let mut gif = listing("seller", "Lamp", Attributes::default());

	gif.images = vec![image("anim.gif")];

	let mut bad_color = listing("seller", "Lamp", colored("teal"));

	bad_color.images = vec![image("ok.png")];

	let mut no_location = listing("seller", "Lamp", Attributes::default());

	no_location.location = None;

	for req in [no_images, gif, bad_color, no_location] {
		let err = service.create_item(req).await.expect_err("must be rejected");

		assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	}
}

#[tokio::test]
async fn facet_matches_behind_newer_non_matches_are_found() {
	let service = service();
	let red = service.create_item(listing("seller", "Chair", colored("red"))).await.expect("red");

	for _ in 0..2 {
		service.create_item(listing("seller", "Chair", colored("blue"))).await.expect("blue");
	}

	let mut attributes = BTreeMap::new();

	attributes.insert("color".to_string(), vec!["red".to_string()]);

	let response = service
		.discover(DiscoveryRequest {
			location: Some(SpatialQuery {
				latitude: MADISON.latitude,
				longitude: MADISON.longitude,
				radius: None,
			}),
			attributes,
			..Default::default()
		})
		.await
		.expect("discover");
	let ids: Vec<&str> = response.items.iter().map(|view| view.item.id.as_str()).collect();

	assert_eq!(ids, vec![red.id.as_str()]);
}

#[tokio::test]
async fn only_the_owner_may_delete() {
	let service = service();
	let created = service.create_item(listing("owner", "Desk", colored("red"))).await.expect("create");
	let err = service
		.delete_item(DeleteItemRequest { user_id: "intruder".to_string(), item_id: created.id.clone() })
		.await
		.expect_err("intruder must be refused");

	assert!(matches!(err, Error::Forbidden { .. }));

	service
		.delete_item(DeleteItemRequest { user_id: "owner".to_string(), item_id: created.id.clone() })
		.await
		.expect("owner deletes");

	let err = service.get_item(GetItemRequest { item_id: created.id }).await.expect_err("gone");

	assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn conversations_list_latest_message_per_counterpart() {
	let service = service();

	for (from, to, text) in [("u", "v", "t1"), ("w", "u", "t2"), ("v", "u", "t3")] {
		service
			.send_message(SendMessageRequest {
				sender_id: from.to_string(),
				recipient_id: to.to_string(),
				text: text.to_string(),
			})
			.await
			.expect("send");
		// Keeps server-assigned timestamps strictly increasing.
		tokio::time::sleep(std::time::Duration::from_millis(2)).await;
	}

	let response =
		service.conversations(ConversationsRequest { user_id: "u".to_string() }).await.expect("list");
	let summary: Vec<(&str, &str)> = response
		.conversations
		.iter()
		.map(|c| (c.message.text.as_str(), c.counterpart_id.as_str()))
		.collect();

	assert_eq!(summary, vec![("t3", "v"), ("t2", "w")]);
	assert_eq!(response.conversations[0].conversation_key, "u:v");

	let history = service
		.message_history(HistoryRequest { user_id: "v".to_string(), other_user_id: "u".to_string() })
		.await
		.expect("history");
	let texts: Vec<&str> = history.messages.iter().map(|m| m.text.as_str()).collect();

	assert_eq!(texts, vec!["t1", "t3"]);
}

#[tokio::test]
async fn send_message_validates_participants_and_text() {
	let service = service();
	let to_self = SendMessageRequest {
		sender_id: "u".to_string(),
		recipient_id: "u".to_string(),
		text: "hi".to_string(),
	};
	let blank = SendMessageRequest {
		sender_id: "u".to_string(),
		recipient_id: "v".to_string(),
		text: "  ".to_string(),
	};

	assert!(matches!(service.send_message(to_self).await, Err(Error::InvalidRequest { .. })));
	assert!(matches!(service.send_message(blank).await, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn user_profile_hides_hash_and_inlines_picture() {
	let service = service();
	let created = service
		.create_user(CreateUserRequest {
			name: "Una".to_string(),
			email: "Una@Example.com".to_string(),
			password_hash: "secret-hash".to_string(),
		})
		.await
		.expect("create user");
	let duplicate = service
		.create_user(CreateUserRequest {
			name: "Other".to_string(),
			email: "una@example.com".to_string(),
			password_hash: "x".to_string(),
		})
		.await
		.expect_err("email taken");

	assert!(matches!(duplicate, Error::Conflict { .. }));

	service.set_profile_picture(&created.id, image("me.png")).await.expect("picture");

	let profile =
		service.get_user(GetUserRequest { user_id: created.id.clone() }).await.expect("profile");
	let json = serde_json::to_value(&profile).expect("serialize");

	assert_eq!(json["user"]["email"], "una@example.com");
	assert!(json["user"].get("passwordHash").is_none());
	assert!(
		json["user"]["profilePicture"]
			.as_str()
			.is_some_and(|uri| uri.starts_with("data:image/png;base64,"))
	);
}

#[tokio::test]
async fn rating_writes_keep_the_recipient_summary_current() {
	let service = service();
	let ada = register(&service, "Ada").await;
	let bo = register(&service, "Bo").await;
	let cy = register(&service, "Cy").await;

	assert_eq!(summary(&service, &cy).await, (0.0, 0));

	let first = service.create_rating(rating_of(&ada, &cy, 8)).await.expect("rate").rating;
	let second = service.create_rating(rating_of(&bo, &cy, 4)).await.expect("rate").rating;

	assert_eq!(summary(&service, &cy).await, (6.0, 2));

	let updated = service
		.update_rating(UpdateRatingRequest {
			user_id: ada.clone(),
			rating_id: first.id.clone(),
			title: "Even better".to_string(),
			body: "Came back for more.".to_string(),
			stars: 10,
		})
		.await
		.expect("update")
		.rating;

	assert_eq!(updated.stars, 10);
	assert_eq!(summary(&service, &cy).await, (7.0, 2));

	service
		.delete_rating(DeleteRatingRequest { user_id: bo.clone(), rating_id: second.id.clone() })
		.await
		.expect("delete");

	assert_eq!(summary(&service, &cy).await, (10.0, 1));

	let fetched =
		service.get_rating(GetRatingRequest { rating_id: first.id.clone() }).await.expect("get");

	assert_eq!(fetched.rating.title, "Even better");

	let err = service
		.get_rating(GetRatingRequest { rating_id: second.id })
		.await
		.expect_err("deleted rating");

	assert!(matches!(err, Error::NotFound { .. }));
}

#[tokio::test]
async fn rating_rules_are_enforced() {
	let service = service();
	let ada = register(&service, "Ada").await;
	let bo = register(&service, "Bo").await;

	let err = service.create_rating(rating_of(&ada, &ada, 5)).await.expect_err("self rating");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	for stars in [0, 11] {
		let err = service.create_rating(rating_of(&ada, &bo, stars)).await.expect_err("stars");

		assert!(matches!(err, Error::InvalidRequest { .. }), "stars {stars}");
	}

	let err = service.create_rating(rating_of(&ada, "nobody", 5)).await.expect_err("unknown");

	assert!(matches!(err, Error::NotFound { .. }));

	let rating = service.create_rating(rating_of(&ada, &bo, 5)).await.expect("rate").rating;
	let err = service.create_rating(rating_of(&ada, &bo, 9)).await.expect_err("duplicate");

	assert!(matches!(err, Error::Conflict { .. }));

	let err = service
		.update_rating(UpdateRatingRequest {
			user_id: bo.clone(),
			rating_id: rating.id.clone(),
			title: "Mine now".to_string(),
			body: "Nope.".to_string(),
			stars: 1,
		})
		.await
		.expect_err("only the creator edits");

	assert!(matches!(err, Error::Forbidden { .. }));

	let err = service
		.delete_rating(DeleteRatingRequest { user_id: bo.clone(), rating_id: rating.id })
		.await
		.expect_err("only the creator deletes");

	assert!(matches!(err, Error::Forbidden { .. }));
	assert_eq!(summary(&service, &bo).await, (5.0, 1));
}

#[tokio::test]
async fn item_ratings_leave_the_owner_summary_alone() {
	let service = service();
	let owner = register(&service, "Owner").await;
	let buyer = register(&service, "Buyer").await;
	let item = service.create_item(listing(&owner, "Desk", colored("red"))).await.expect("item");
	let request = CreateRatingRequest {
		recipient_id: item.id.clone(),
		recipient_is_item: true,
		..rating_of(&buyer, "", 9)
	};
	let rating = service.create_rating(request).await.expect("rate item").rating;

	assert!(rating.recipient_is_item);
	assert_eq!(summary(&service, &owner).await, (0.0, 0));
}

#[tokio::test]
async fn profile_update_edits_fields_and_guards_email() {
	let service = service();
	let ada = register(&service, "Ada").await;

	register(&service, "Bo").await;

	let updated = service
		.update_user(UpdateUserRequest {
			user_id: ada.clone(),
			name: Some(" Ada L ".to_string()),
			email: Some("ADA.L@example.com".to_string()),
			password_hash: None,
		})
		.await
		.expect("update");

	assert_eq!(updated.user.user.name, "Ada L");
	assert_eq!(updated.user.user.email, "ada.l@example.com");
	assert_eq!(updated.user.user.password_hash, "hash");

	let err = service
		.update_user(UpdateUserRequest {
			user_id: ada.clone(),
			name: None,
			email: Some("bo@example.com".to_string()),
			password_hash: None,
		})
		.await
		.expect_err("email taken");

	assert!(matches!(err, Error::Conflict { .. }));

	let err = service
		.update_user(UpdateUserRequest {
			user_id: "nobody".to_string(),
			name: Some("Ghost".to_string()),
			email: None,
			password_hash: None,
		})
		.await
		.expect_err("unknown user");

	assert!(matches!(err, Error::NotFound { .. }));
}
