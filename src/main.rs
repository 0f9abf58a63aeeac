//! SqlMap Runtime - demonstration binary
//!
//! Wires a cached order statement over an in-memory table, walks it with a
//! paged cursor and resolves a lazily loaded customer relation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sqlmap_runtime::cache::{CacheKind, CacheModelConfig, CacheRegistry, MemoryCache};
use sqlmap_runtime::lazy::Relation;
use sqlmap_runtime::paging::PagedCursor;
use sqlmap_runtime::statement::{CachingStatement, MemoryConnectionManager, VecStatement};
use sqlmap_runtime::{spawn_cleanup_task, Config};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Order {
    id: u32,
    customer: u64,
    total: f64,
}

type OrderStatement = CachingStatement<VecStatement<Order>>;
type Orders = Relation<OrderStatement, MemoryConnectionManager, Vec<Order>>;

struct Customer {
    id: u64,
    name: String,
    orders: Orders,
}

fn sample_orders() -> Vec<Order> {
    (1..=23)
        .map(|id| Order {
            id,
            customer: u64::from(id % 4),
            total: f64::from(id) * 12.5,
        })
        .collect()
}

/// Runs the demonstration.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the shared backing cache and its cleanup task
/// 4. Register cache models and build a cached statement
/// 5. Page through the statement, then resolve a lazy relation
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sqlmap_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_size={}, page_size={}, flush_interval={}s, cleanup_interval={}s",
        config.cache_size, config.page_size, config.flush_interval, config.cleanup_interval
    );

    let backing = MemoryCache::shared();
    let cleanup_handle = spawn_cleanup_task(backing.clone(), config.cleanup_interval);

    let mut registry: CacheRegistry<Vec<Order>> = CacheRegistry::with_backing(backing.clone());
    let orders_cache = registry.add_model(
        CacheModelConfig::new("orders", CacheKind::Basic)
            .with_defaults(&config)
            .flush_on_execute("InsertOrder"),
    )?;

    let table = VecStatement::new("SelectOrders", sample_orders()).with_filter(|o: &Order, p: &Value| {
        p["customer"].as_u64().map_or(true, |customer| o.customer == customer)
    });
    let statement = Arc::new(CachingStatement::new(table, orders_cache.clone()));
    let manager = Arc::new(MemoryConnectionManager::new());

    // Walk every page, then come back to the first one
    let mut cursor = PagedCursor::new(statement.clone(), manager.clone(), json!({}), config.page_size)?;
    loop {
        info!(
            page = cursor.current_page_index(),
            rows = cursor.len(),
            first = cursor.is_first_page(),
            last = cursor.is_last_page(),
            "order page"
        );
        if !cursor.next_page()? {
            break;
        }
    }
    cursor.goto_page(0)?;

    let customer_id = 3;
    let customer = Customer {
        id: customer_id,
        name: "Acme".to_string(),
        orders: Relation::deferred(
            statement.clone(),
            manager.clone(),
            json!({ "customer": customer_id }),
            "orders",
        )?,
    };

    let orders = customer.orders.get()?;
    info!(
        customer = %customer.name,
        id = customer.id,
        orders = orders.len(),
        loaded = customer.orders.is_loaded(),
        "lazy relation resolved"
    );

    let flushed = registry.statement_executed("InsertOrder")?;
    info!(
        flushed,
        hit_ratio = orders_cache.lock().hit_ratio(),
        executions = statement.inner().executions(),
        connections = manager.opened(),
        backing_entries = backing.len(),
        "demo complete"
    );

    cleanup_handle.abort();
    Ok(())
}
