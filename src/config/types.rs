use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub media_store: MediaStoreConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite database file holding image records
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum size of an upload request body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_db_path() -> PathBuf {
    PathBuf::from("gallery.db")
}
fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Which media store implementation backs the gallery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Cloudinary upload API
    #[default]
    Cloudinary,
    /// Process-local store; assets vanish on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaStoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Cloudinary cloud name (env: CLOUDINARY_NAME)
    #[serde(default)]
    pub cloud_name: String,

    /// Cloudinary API key (env: CLOUDINARY_API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Cloudinary API secret (env: CLOUDINARY_API_SECRET)
    #[serde(default)]
    pub api_secret: String,

    /// Folder every upload is grouped under
    #[serde(default = "default_folder")]
    pub folder: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout for media store calls; 0 disables it
    #[serde(default)]
    pub request_timeout_secs: u64,
}

fn default_folder() -> String {
    "gallery".to_string()
}
fn default_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}

impl Default for MediaStoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_folder(),
            api_base: default_api_base(),
            request_timeout_secs: 0,
        }
    }
}
