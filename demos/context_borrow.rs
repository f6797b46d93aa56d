//! Per-request borrows: every request task gets one connection for its
//! whole lifetime, returned automatically when the request ends.

use coropool::{ExecutionContext, ObjectPool, PoolConfiguration, PoolManager, StatusTable};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), coropool::BoxError> {
    println!("=== coropool - Context Borrow Example ===\n");

    let next = Arc::new(AtomicU32::new(1));
    let table = Arc::new(StatusTable::default());
    let config = PoolConfiguration::new()
        .with_min_objects(2)
        .with_max_objects(4)
        .with_interval_check_period(Duration::from_millis(100));
    let pool = ObjectPool::with_status_table(
        move || {
            let id = next.fetch_add(1, Ordering::Relaxed);
            async move { Ok::<_, std::io::Error>(id) }
        },
        config,
        Arc::clone(&table),
    )?;
    PoolManager::global().register("sessions", pool);

    let mut requests = Vec::new();
    for request in 0..8 {
        requests.push(tokio::spawn(async move {
            let Some(pool) = PoolManager::global().get::<u32>("sessions") else {
                return;
            };
            ExecutionContext::scope(async move {
                // Both calls see the same session
                let first = pool.defer(None).await;
                let second = pool.defer(None).await;
                match (first, second) {
                    (Ok(a), Ok(b)) => {
                        let same = a.ptr_eq(&b);
                        println!("   request {} -> session {} (same: {})", request, *a, same);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                    }
                    (Err(err), _) | (_, Err(err)) => {
                        println!("   request {} failed: {}", request, err)
                    }
                }
            })
            .await;
        }));
    }
    for request in requests {
        request.await?;
    }

    if let Some(pool) = PoolManager::global().get::<u32>("sessions") {
        println!("\n   Status: {:?}", pool.status());
        println!("   Aggregated over the table: {:?}", pool.status_all());
    }

    PoolManager::global().reset_all().await?;
    println!("   Rows left in the table: {}", table.len());
    Ok(())
}
