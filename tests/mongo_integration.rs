//! MongoDB integration tests
//!
//! Most of these tests require a running MongoDB instance.
//! Set MONGODB_URL environment variable to run them.
//!
//! Run with: cargo test --test mongo_integration -- --ignored

use std::sync::Arc;
use std::time::Duration;

use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing_mongo_hook::entry::LogEntry;
use tracing_mongo_hook::error::{HookError, WriteError};
use tracing_mongo_hook::format::{Formatter, JsonFormatter, TextFormatter};
use tracing_mongo_hook::level::Level;
use tracing_mongo_hook::{Hook, HookConfig, HookLayer, MongoHook};

async fn setup_collection() -> Option<(Database, Collection<Document>)> {
    let mongodb_url = std::env::var("MONGODB_URL").ok()?;
    let client = Client::with_uri_str(&mongodb_url).await.ok()?;
    let db_name = format!("test_hooks_{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
    let database = client.database(&db_name);
    let collection = database.collection::<Document>("logs");
    Some((database, collection))
}

#[tokio::test]
#[ignore = "Requires MongoDB instance"]
async fn test_level_formatter_timeout_matrix() {
    let Some((database, collection)) = setup_collection().await else {
        eprintln!("Skipping test - MongoDB not available");
        return;
    };

    let levels = [Level::Trace, Level::Debug, Level::Info, Level::Warn, Level::Error];
    let formatters: [Arc<dyn Formatter>; 2] =
        [Arc::new(TextFormatter::default()), Arc::new(JsonFormatter::default())];
    let timeouts = [None, Some(Duration::from_secs(5))];

    let mut expected = 0u64;
    for timeout in timeouts {
        let hook = MongoHook::new(
            Some(collection.clone()),
            HookConfig::default().with_timeout(timeout),
        )
        .unwrap();

        for formatter in &formatters {
            for level in levels {
                let case = expected as i64;
                let entry = LogEntry::new(level, level.as_str())
                    .with_field("case", case)
                    .with_formatter(Arc::clone(formatter));
                hook.fire(&entry).await.unwrap();
                expected += 1;

                let stored = collection
                    .find_one(doc! { "case": case })
                    .await
                    .unwrap()
                    .expect("document was written");
                assert_eq!(stored.get_str("level").unwrap(), level.as_str());
                assert_eq!(stored.get_str("message").unwrap(), level.as_str());
                assert!(stored.get_str("entry").is_ok());
            }
        }
    }

    assert_eq!(collection.count_documents(doc! {}).await.unwrap(), expected);
    database.drop().await.ok();
}

#[tokio::test]
#[ignore = "Requires MongoDB instance"]
async fn test_error_entry_round_trip() {
    let Some((database, collection)) = setup_collection().await else {
        eprintln!("Skipping test - MongoDB not available");
        return;
    };

    let hook = MongoHook::new(
        Some(collection.clone()),
        HookConfig::default().with_timeout(Some(Duration::from_secs(5))),
    )
    .unwrap();

    let entry = LogEntry::new(Level::Error, "boom").with_field("user_id", 42);
    hook.fire(&entry).await.unwrap();

    assert_eq!(collection.count_documents(doc! {}).await.unwrap(), 1);
    let stored = collection
        .find_one(doc! { "message": "boom" })
        .await
        .unwrap()
        .expect("document was written");
    assert_eq!(stored.get_str("level").unwrap(), "error");
    assert_eq!(stored.get_i64("user_id").unwrap(), 42);
    assert_eq!(
        stored.get_datetime("time").unwrap().timestamp_millis(),
        entry.timestamp.timestamp_millis()
    );

    database.drop().await.ok();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires MongoDB instance"]
async fn test_tracing_events_are_written() {
    let Some((database, collection)) = setup_collection().await else {
        eprintln!("Skipping test - MongoDB not available");
        return;
    };

    let hook = MongoHook::new(Some(collection.clone()), HookConfig::default()).unwrap();
    let layer = HookLayer::new(Arc::new(hook)).with_formatter(Arc::new(JsonFormatter::default()));
    let failed = layer.failed_events();

    use tracing_subscriber::layer::SubscriberExt;
    let subscriber = tracing_subscriber::Registry::default().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(order_id = 7, "order placed");
        tracing::error!(order_id = 7, "order failed");
    });

    assert_eq!(failed.load(std::sync::atomic::Ordering::Relaxed), 0);
    assert_eq!(collection.count_documents(doc! { "order_id": 7 }).await.unwrap(), 2);

    database.drop().await.ok();
}

#[tokio::test]
async fn test_unreachable_server_is_a_write_error() {
    let mut options = ClientOptions::parse("mongodb://127.0.0.1:1").await.unwrap();
    options.server_selection_timeout = Some(Duration::from_millis(300));
    let client = Client::with_options(options).unwrap();
    let collection = client.database("test_hooks").collection::<Document>("logs");

    let hook = MongoHook::new(Some(collection), HookConfig::default()).unwrap();
    let err = hook
        .fire(&LogEntry::new(Level::Error, "nobody listens"))
        .await
        .unwrap_err();

    assert!(matches!(err, HookError::Write(WriteError::Insert(_))), "unexpected error: {err}");
}
