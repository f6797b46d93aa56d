//! Basic usage: lazy growth, checkout, return, status and shutdown

use coropool::{BoxError, Lifecycle, ObjectPool, PoolConfiguration, async_trait};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static NEXT_CONNECTION: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug)]
struct Connection {
    id: usize,
}

#[async_trait]
impl Lifecycle for Connection {
    async fn before_use(&self) -> Result<bool, BoxError> {
        println!("   [conn {}] ping before use", self.id);
        Ok(true)
    }

    async fn after_return(&self) -> Result<(), BoxError> {
        println!("   [conn {}] rollback on return", self.id);
        Ok(())
    }

    async fn before_destroy(&self) -> Result<(), BoxError> {
        println!("   [conn {}] closing", self.id);
        Ok(())
    }
}

async fn connect() -> Result<Connection, std::io::Error> {
    tokio::time::sleep(Duration::from_millis(5)).await;
    Ok(Connection {
        id: NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed),
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BoxError> {
    println!("=== coropool - Basic Example ===\n");

    let config = PoolConfiguration::new()
        .with_min_objects(1)
        .with_max_objects(3)
        .with_get_object_timeout(Duration::from_millis(200));
    let pool = ObjectPool::new(connect, config)?;

    println!("1. Checkout and return:");
    let conn = pool.acquire(None).await?.ok_or("pool empty")?;
    println!("   Using connection {}", conn.id);
    pool.release(&conn).await?;
    println!("   Status: {:?}\n", pool.status());

    println!("2. Exhausting the pool:");
    let mut held = Vec::new();
    while let Some(conn) = pool.acquire(Some(Duration::from_millis(50))).await? {
        held.push(conn);
    }
    println!("   Holding {} connections, next acquire timed out", held.len());
    for conn in &held {
        pool.release(conn).await?;
    }
    println!();

    println!("3. invoke() returns the object for you:");
    let id = pool.invoke(None, |conn| async move { conn.id }).await?;
    println!("   Ran on connection {}\n", id);

    println!("4. Metrics:");
    for (key, value) in pool.export_metrics() {
        println!("   {} = {}", key, value);
    }
    println!();

    println!("5. Shutdown:");
    pool.shutdown().await?;
    println!("   Status after shutdown: {:?}", pool.status());
    Ok(())
}
