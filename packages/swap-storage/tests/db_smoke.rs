use serde_json::json;
use time::{Duration, OffsetDateTime};

use swap_config::Postgres;
use swap_storage::{
	Error,
	db::Db,
	models::{ItemRow, MessageRow, RatingRow, UserRow},
	queries::{self, ItemScanArgs},
};
use swap_testkit::TestDatabase;

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

fn item_row(id: &str, status: &str, latitude: f64, created_offset: i64) -> ItemRow {
	ItemRow {
		item_id: id.to_string(),
		user_id: "owner".to_string(),
		title: format!("Item {id}"),
		description: String::new(),
		quantity: 1,
		categories: vec!["misc".to_string()],
		attributes: json!({ "color": "red" }),
		latitude: Some(latitude),
		longitude: Some(-89.4),
		status: status.to_string(),
		created_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(created_offset),
	}
}

fn user_row(id: &str, email: &str) -> UserRow {
	UserRow {
		user_id: id.to_string(),
		name: id.to_string(),
		email: email.to_string(),
		password_hash: "hash".to_string(),
		avg_rating: 0.0,
		num_ratings: 0,
	}
}

fn rating_row(id: &str, creator: &str, recipient: &str, stars: i16) -> RatingRow {
	RatingRow {
		rating_id: id.to_string(),
		creator_id: creator.to_string(),
		recipient_id: recipient.to_string(),
		recipient_is_item: false,
		title: "Title".to_string(),
		body: "Body".to_string(),
		stars,
		created_at: OffsetDateTime::UNIX_EPOCH,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_idempotent; set SWAP_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name IN ('users', 'items', 'attachments', 'messages', 'ratings')",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 5);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn duplicate_email_is_a_conflict() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!("Skipping duplicate_email_is_a_conflict; set SWAP_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	queries::insert_user(&db, &user_row("u1", "same@example.com"))
		.await
		.expect("First insert must succeed.");

	let err = queries::insert_user(&db, &user_row("u2", "same@example.com"))
		.await
		.expect_err("Duplicate email must fail.");

	assert!(matches!(err, Error::Conflict(_)), "Unexpected error: {err:?}");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn scan_applies_status_and_bounds_in_recency_order() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!(
			"Skipping scan_applies_status_and_bounds_in_recency_order; set SWAP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	for row in [
		item_row("a", "available", 43.07, 1),
		item_row("b", "available", 43.08, 2),
		item_row("c", "unavailable", 43.07, 3),
		item_row("d", "available", 50.0, 4),
	] {
		queries::insert_item(&db, &row).await.expect("Failed to insert item.");
	}

	let rows = queries::scan_items(
		&db,
		ItemScanArgs {
			status: Some("available"),
			latitude: Some((43.0, 43.1)),
			longitude: None,
		},
	)
	.await
	.expect("Failed to scan items.");
	let ids: Vec<&str> = rows.iter().map(|row| row.item_id.as_str()).collect();

	assert_eq!(ids, vec!["b", "a"]);
	assert_eq!(rows[0].attributes, json!({ "color": "red" }));

	let all = queries::scan_items(&db, ItemScanArgs::default())
		.await
		.expect("Failed to scan items.");
	let ids: Vec<&str> = all.iter().map(|row| row.item_id.as_str()).collect();

	assert_eq!(ids, vec!["d", "c", "b", "a"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn attachments_keep_upload_order_and_go_with_their_item() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!(
			"Skipping attachments_keep_upload_order_and_go_with_their_item; set SWAP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	queries::insert_item(&db, &item_row("item", "available", 1.0, 1))
		.await
		.expect("Failed to insert item.");

	for name in ["z.png", "a.png", "m.jpg"] {
		queries::put_attachment(&db, "item", name, "image/png", b"bytes")
			.await
			.expect("Failed to store attachment.");
	}

	let names: Vec<String> = queries::list_attachments(&db, "item")
		.await
		.expect("Failed to list attachments.")
		.into_iter()
		.map(|meta| meta.name)
		.collect();

	assert_eq!(names, vec!["z.png", "a.png", "m.jpg"]);
	assert!(queries::delete_item(&db, "item").await.expect("Failed to delete item."));
	assert!(
		queries::list_attachments(&db, "item").await.expect("Failed to list attachments.").is_empty()
	);
	assert!(!queries::delete_item(&db, "item").await.expect("Failed to delete item."));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn messages_between_covers_both_directions() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!(
			"Skipping messages_between_covers_both_directions; set SWAP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	for (id, from, to, offset) in [("1", "u", "v", 1), ("2", "v", "u", 2), ("3", "u", "w", 3)] {
		let row = MessageRow {
			message_id: id.to_string(),
			sender_id: from.to_string(),
			recipient_id: to.to_string(),
			text: "hi".to_string(),
			sent_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(offset),
		};

		queries::insert_message(&db, &row).await.expect("Failed to insert message.");
	}

	let between = queries::messages_between(&db, "v", "u").await.expect("Failed to query.");
	let involving = queries::messages_involving(&db, "u").await.expect("Failed to query.");

	assert_eq!(between.iter().map(|m| m.message_id.as_str()).collect::<Vec<_>>(), vec!["1", "2"]);
	assert_eq!(involving.len(), 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn rating_writes_refresh_the_recipient_aggregate() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!(
			"Skipping rating_writes_refresh_the_recipient_aggregate; set SWAP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	for (id, email) in [("a", "a@example.com"), ("b", "b@example.com"), ("c", "c@example.com")] {
		queries::insert_user(&db, &user_row(id, email)).await.expect("Failed to insert user.");
	}

	queries::insert_rating(&db, &rating_row("r1", "a", "c", 8)).await.expect("Failed to rate.");
	queries::insert_rating(&db, &rating_row("r2", "b", "c", 4)).await.expect("Failed to rate.");

	let err = queries::insert_rating(&db, &rating_row("r3", "a", "c", 1))
		.await
		.expect_err("Second rating of the same recipient must fail.");

	assert!(matches!(err, Error::Conflict(_)), "Unexpected error: {err:?}");

	let user = queries::get_user(&db, "c").await.expect("Failed to load user.").expect("user");

	assert_eq!((user.avg_rating, user.num_ratings), (6.0, 2));

	let mut edited = rating_row("r1", "a", "c", 10);

	edited.title = "Better".to_string();

	assert!(queries::update_rating(&db, &edited).await.expect("Failed to update rating."));

	let stored = queries::get_rating(&db, "r1").await.expect("Failed to load.").expect("rating");

	assert_eq!((stored.title.as_str(), stored.stars), ("Better", 10));

	assert!(queries::delete_rating(&db, "r2").await.expect("Failed to delete rating."));
	assert!(!queries::delete_rating(&db, "r2").await.expect("Failed to delete rating."));

	let user = queries::get_user(&db, "c").await.expect("Failed to load user.").expect("user");

	assert_eq!((user.avg_rating, user.num_ratings), (10.0, 1));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SWAP_PG_DSN to run."]
async fn profile_update_keeps_emails_unique() {
	let Some(base_dsn) = swap_testkit::env_dsn() else {
		eprintln!("Skipping profile_update_keeps_emails_unique; set SWAP_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	queries::insert_user(&db, &user_row("a", "a@example.com")).await.expect("Failed to insert.");
	queries::insert_user(&db, &user_row("b", "b@example.com")).await.expect("Failed to insert.");

	let mut renamed = user_row("a", "a2@example.com");

	renamed.name = "Ada".to_string();

	assert!(queries::update_user(&db, &renamed).await.expect("Failed to update user."));

	let taken = user_row("b", "a2@example.com");
	let err = queries::update_user(&db, &taken).await.expect_err("Taken email must fail.");

	assert!(matches!(err, Error::Conflict(_)), "Unexpected error: {err:?}");
	assert!(!queries::update_user(&db, &user_row("z", "z@example.com")).await.expect("update"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
