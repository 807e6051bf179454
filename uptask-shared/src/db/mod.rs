/// Database layer for UpTask
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: migration runner for the workspace `migrations/` directory
/// - `store`: the [`store::Store`] trait handlers program against
/// - `postgres`: [`postgres::PgStore`], the production store
/// - `memory`: [`memory::MemoryStore`], the in-process store
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use uptask_shared::db::{memory::MemoryStore, store::Store};
///
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;
pub mod postgres;
pub mod store;
