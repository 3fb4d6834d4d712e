mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./gallery.toml",
        "./config.toml",
        "~/.config/gallery/config.toml",
        "/etc/gallery/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Overlay credentials and paths from the process environment.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Overlay settings using `lookup` as the variable source.
///
/// Empty values are ignored so an exported-but-blank variable does not wipe
/// a value from the file.
pub fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = get("CLOUDINARY_NAME") {
        config.media_store.cloud_name = v;
    }
    if let Some(v) = get("CLOUDINARY_API_KEY") {
        config.media_store.api_key = v;
    }
    if let Some(v) = get("CLOUDINARY_API_SECRET") {
        config.media_store.api_secret = v;
    }
    if let Some(v) = get("GALLERY_DB_PATH") {
        config.server.db_path = PathBuf::from(v);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("max_upload_bytes cannot be 0");
    }

    let store = &config.media_store;
    if store.folder.trim().is_empty() {
        anyhow::bail!("Media store folder cannot be empty");
    }

    if store.backend == StoreBackend::Cloudinary {
        for (name, value) in [
            ("cloud_name", &store.cloud_name),
            ("api_key", &store.api_key),
            ("api_secret", &store.api_secret),
        ] {
            if value.is_empty() {
                anyhow::bail!("Cloudinary media store is selected but {} is not set", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cloudinary_config() -> Config {
        let mut config = Config::default();
        config.media_store.cloud_name = "demo".into();
        config.media_store.api_key = "key".into();
        config.media_store.api_secret = "secret".into();
        config
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.media_store.folder, "gallery");
        assert_eq!(config.media_store.backend, StoreBackend::Cloudinary);
        assert_eq!(config.media_store.request_timeout_secs, 0);
    }

    #[test]
    fn empty_toml_is_valid_document() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn env_overrides_replace_credentials() {
        let env: HashMap<&str, &str> = [
            ("CLOUDINARY_NAME", "envcloud"),
            ("CLOUDINARY_API_KEY", "envkey"),
            ("CLOUDINARY_API_SECRET", ""),
            ("GALLERY_DB_PATH", "/tmp/x.db"),
        ]
        .into_iter()
        .collect();

        let mut config = cloudinary_config();
        apply_overrides_from(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.media_store.cloud_name, "envcloud");
        assert_eq!(config.media_store.api_key, "envkey");
        assert_eq!(config.media_store.api_secret, "secret");
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn cloudinary_requires_credentials() {
        let err = validate_config(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("cloud_name"));
        assert!(validate_config(&cloudinary_config()).is_ok());
    }

    #[test]
    fn memory_backend_needs_no_credentials() {
        let mut config = Config::default();
        config.media_store.backend = StoreBackend::Memory;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_port_and_blank_folder() {
        let mut config = cloudinary_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());

        let mut config = cloudinary_config();
        config.media_store.folder = "  ".into();
        assert!(validate_config(&config).is_err());
    }
}
