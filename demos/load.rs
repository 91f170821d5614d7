use std::sync::Arc;
use std::time::Instant;

use tracing::error;

use tracing_mongo_hook::init::{init_tracing_with_config, LayerConfig};
use tracing_mongo_hook::memory::MemoryCollection;
use tracing_mongo_hook::{HookConfig, MongoHook};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let collection = MemoryCollection::new();
    let hook = MongoHook::new(Some(collection.clone()), HookConfig::default())?;
    let config = LayerConfig {
        enable_stdout: false,
        ..LayerConfig::default()
    };
    init_tracing_with_config(Arc::new(hook), config)?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "fired {} events in {:?} (~{:.0} ev/s), {} documents stored",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        collection.len()
    );
    Ok(())
}
