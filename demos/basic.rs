use std::sync::Arc;

use mongodb::bson::Document;
use mongodb::Client;
use tracing::{error, info, warn};

use tracing_mongo_hook::env::{
    env_or, MONGO_HOOK_COLLECTION_ENV, MONGO_HOOK_DATABASE_ENV, MONGO_HOOK_URI_ENV,
};
use tracing_mongo_hook::init::init_tracing;
use tracing_mongo_hook::{HookConfig, MongoHook};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) The connection belongs to the application, not to the hook.
    let uri = env_or(MONGO_HOOK_URI_ENV, "mongodb://localhost:27017");
    let database = env_or(MONGO_HOOK_DATABASE_ENV, "test_hooks");
    let collection_name = env_or(MONGO_HOOK_COLLECTION_ENV, "logs");

    let client = Client::with_uri_str(&uri).await?;
    let collection = client.database(&database).collection::<Document>(&collection_name);

    // 2) Build the hook (timeout from MONGO_HOOK_TIMEOUT_MS, if set) and install it.
    let hook = MongoHook::new(Some(collection), HookConfig::from_env()?)?;
    init_tracing(Arc::new(hook))?;

    // 3) Every event below becomes one document in `collection_name`.
    info!("service started");
    warn!(free_mb = 512, "disk space is getting low");
    error!(user_id = 42, "boom");

    Ok(())
}
