//! Application context shared by request handlers.
//!
//! [`AppContext`] is passed to every handler via Axum state. It owns the
//! storage handle (the connection pool) explicitly; no handler reaches for a
//! global.

use std::sync::Arc;

use iv_core::config::Config;
use iv_db::pool::{DbPool, PooledConnection};

/// Application context shared by all request handlers (via Axum state).
///
/// This is cheaply cloneable because it only holds `Arc`s.
#[derive(Clone)]
pub struct AppContext {
    /// Database connection pool.
    pub db: DbPool,
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(db: DbPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Run a blocking storage operation on a pooled connection.
    ///
    /// The connection is checked out on the blocking thread pool and goes
    /// back to the pool when `f` returns, whichever way it returns.
    pub async fn with_conn<T, F>(&self, f: F) -> iv_core::Result<T>
    where
        F: FnOnce(&PooledConnection) -> iv_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let conn = iv_db::pool::get_conn(&db)?;
            f(&conn)
        })
        .await
        .map_err(|e| iv_core::Error::Internal(format!("spawn_blocking join error: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn with_conn_runs_query() {
        let ctx = AppContext::new(iv_db::pool::init_memory_pool().unwrap(), Config::default());
        let n: i64 = ctx
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
                    .map_err(|e| iv_core::Error::database(e.to_string()))
            })
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn with_conn_propagates_errors() {
        let ctx = AppContext::new(iv_db::pool::init_memory_pool().unwrap(), Config::default());
        let err = ctx
            .with_conn(|_| -> iv_core::Result<()> { Err(iv_core::Error::not_found("Image", 1)) })
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 404);
    }
}
