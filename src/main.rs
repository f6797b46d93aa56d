// coropool - task-aware object pool
// Run examples with: cargo run --example basic

use coropool::{ObjectPool, PoolConfiguration};

#[tokio::main(flavor = "current_thread")]
async fn main() -> coropool::PoolResult<()> {
    println!("=== coropool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    println!("Quick Demo:");
    let config = PoolConfiguration::new().with_min_objects(1).with_max_objects(4);
    let pool = ObjectPool::new(|| async { Ok::<_, std::io::Error>(7u32) }, config)?;

    if let Some(obj) = pool.acquire(None).await? {
        println!("  Got object: {}", *obj);
        pool.release(&obj).await?;
    }

    println!("  Idle after return: {}", pool.idle_count());
    pool.shutdown().await
}
