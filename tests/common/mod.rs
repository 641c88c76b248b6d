//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, default config,
//! and full [`AppContext`]. The [`TestHarness::with_server`] constructor
//! starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use iv_core::config::Config;
use iv_db::pool::{init_memory_pool, DbPool};
use iv_server::context::AppContext;
use iv_server::router::build_router;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
}

impl TestHarness {
    /// Create a new harness with default configuration and in-memory DB.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration and in-memory DB.
    pub fn with_config(config: Config) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(db.clone(), config);
        Self { ctx, db }
    }

    /// Create a harness backed by a SQLite file in `dir` instead of memory.
    pub fn with_file_db(dir: &std::path::Path) -> Self {
        let path = dir.join("imagevault.db");
        let db = iv_db::pool::init_pool(&path.to_string_lossy())
            .expect("failed to create file-backed pool");
        let mut config = Config::default();
        config.server.db_path = path;
        let ctx = AppContext::new(db.clone(), config);
        Self { ctx, db }
    }

    /// Serve this harness's router on a random port.
    pub async fn serve(&self) -> SocketAddr {
        let app = build_router(self.ctx.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let addr = harness.serve().await;
        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> iv_db::pool::PooledConnection {
        iv_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Count the rows currently stored in the images table.
    pub fn image_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
            .expect("failed to count images")
    }
}

/// Build a multipart form carrying a single file part named `file`.
pub fn file_form(name: &str, content_type: &str, bytes: &[u8]) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes.to_vec())
        .file_name(name.to_string())
        .mime_str(content_type)
        .expect("valid mime type");
    reqwest::multipart::Form::new().part("file", part)
}

/// Upload a file and return the decoded JSON response.
pub async fn upload(
    addr: SocketAddr,
    name: &str,
    content_type: &str,
    bytes: &[u8],
) -> serde_json::Value {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/images/upload"))
        .multipart(file_form(name, content_type, bytes))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}
