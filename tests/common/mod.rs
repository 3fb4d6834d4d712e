//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory DB, default config and
//! an in-memory media store into a full [`AppContext`]. The [`with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

use gallery::config::{Config, StoreBackend};
use gallery::images::GalleryService;
use gallery::media_store::{MediaStore, MemoryStore};
use gallery::server::{create_router, AppContext};
use gallery_db::pool::{init_memory_pool, DbPool};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and an in-memory media store.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub store: Arc<MemoryStore>,
}

impl TestHarness {
    /// Create a new harness with default configuration.
    pub fn new() -> Self {
        Self::with_config(memory_config())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = build_context(config, store.clone(), db.clone());
        Self { ctx, db, store }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let addr = serve(harness.ctx.clone()).await;
        (harness, addr)
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let addr = serve(harness.ctx.clone()).await;
        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> gallery_db::pool::PooledConnection {
        gallery_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Number of image records in the database.
    pub fn record_count(&self) -> usize {
        record_count(&self.db)
    }
}

/// Number of image records in `db`.
pub fn record_count(db: &DbPool) -> usize {
    let conn = gallery_db::pool::get_conn(db).expect("failed to get db connection");
    gallery_db::queries::images::list_images(&conn)
        .expect("failed to list images")
        .len()
}

/// Config selecting the in-memory store.
pub fn memory_config() -> Config {
    let mut config = Config::default();
    config.media_store.backend = StoreBackend::Memory;
    config
}

/// Build an [`AppContext`] over an arbitrary media store.
pub fn build_context(config: Config, store: Arc<dyn MediaStore>, db: DbPool) -> AppContext {
    let gallery = GalleryService::new(store, db, config.media_store.folder.clone());
    AppContext::new(config, gallery)
}

/// Serve `ctx` on a random local port.
pub async fn serve(ctx: AppContext) -> SocketAddr {
    let app = create_router(ctx);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind random port");
    let addr = listener.local_addr().expect("failed to get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    addr
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn encode(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 40, 90]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .expect("failed to encode fixture image");
    buf
}

/// A small valid PNG.
pub fn png_bytes() -> Vec<u8> {
    encode(image::ImageFormat::Png)
}

/// A small valid JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    encode(image::ImageFormat::Jpeg)
}

/// A minimal GIF header.
pub fn gif_bytes() -> Vec<u8> {
    b"GIF89a\x01\x00\x01\x00\x80\x00\x00\xff\xff\xff\x00\x00\x00;".to_vec()
}

/// Multipart form with every `(file_name, bytes)` pair under `images`.
pub fn images_form(files: &[(&str, Vec<u8>)]) -> reqwest::multipart::Form {
    files.iter().fold(reqwest::multipart::Form::new(), |form, (name, data)| {
        form.part(
            "images",
            reqwest::multipart::Part::bytes(data.clone()).file_name(name.to_string()),
        )
    })
}

/// POST `files` to `/upload`.
pub async fn upload(addr: SocketAddr, files: &[(&str, Vec<u8>)]) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("http://{addr}/upload"))
        .multipart(images_form(files))
        .send()
        .await
        .expect("upload request failed")
}
