//! Cloudinary upload API client.
//!
//! Uses signed requests against `/v1_1/{cloud}/image/upload` and
//! `/v1_1/{cloud}/image/destroy`. The signature is the hex SHA-1 of the
//! sorted `key=value` parameters joined with `&`, followed by the API secret.

use std::time::Duration;

use async_trait::async_trait;
use gallery_common::format::ALLOWED_EXTENSIONS;
use gallery_common::{Error, Result};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::{MediaStore, StoredAsset};
use crate::config::MediaStoreConfig;
use crate::images::ImageUpload;

/// Media store backed by the Cloudinary REST API.
pub struct CloudinaryStore {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl CloudinaryStore {
    /// Create a client from configuration.
    pub fn new(config: &MediaStoreConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| Error::media_store(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/v1_1/{}/image/{action}", self.api_base, self.cloud_name)
    }

    fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, file: &ImageUpload, folder: &str) -> Result<StoredAsset> {
        let params = vec![
            ("allowed_formats", ALLOWED_EXTENSIONS.join(",")),
            ("folder", folder.to_string()),
            ("timestamp", Self::timestamp()),
        ];
        let signature = sign_params(&params, &self.api_secret);

        let part = Part::bytes(file.data.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(file.format.mime_type())
            .map_err(|e| Error::media_store(format!("Invalid upload part: {e}")))?;

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        tracing::debug!(file = %file.file_name, folder, "uploading to Cloudinary");

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::media_store(format!("Cloudinary upload request failed: {e}")))?;

        let body: UploadResponse = read_json(response).await?;

        Ok(StoredAsset {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<()> {
        let params = vec![
            ("public_id", public_id.to_string()),
            ("timestamp", Self::timestamp()),
        ];
        let signature = sign_params(&params, &self.api_secret);

        let mut form: Vec<(&str, String)> = params;
        form.push(("api_key", self.api_key.clone()));
        form.push(("signature", signature));

        let response = self
            .client
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::media_store(format!("Cloudinary destroy request failed: {e}")))?;

        let body: DestroyResponse = read_json(response).await?;
        match body.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                tracing::warn!(public_id, "Cloudinary asset already absent");
                Ok(())
            }
            other => Err(Error::media_store(format!(
                "Cloudinary destroy of {public_id} returned '{other}'"
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "cloudinary"
    }
}

/// Decode a Cloudinary response, turning non-2xx statuses into errors that
/// carry the API's own message when it sent one.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        return Err(Error::media_store(format!(
            "Cloudinary returned {status}: {message}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| Error::media_store(format!("Invalid Cloudinary response: {e}")))
}

/// Compute the request signature for `params`.
///
/// Empty values are skipped, matching the server-side check.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut pairs: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_documented_vector() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        assert_eq!(
            sign_params(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn signature_skips_empty_values() {
        let with_empty = vec![
            ("public_id", "sample_image".to_string()),
            ("folder", String::new()),
            ("timestamp", "1".to_string()),
        ];
        let without = vec![
            ("public_id", "sample_image".to_string()),
            ("timestamp", "1".to_string()),
        ];
        assert_eq!(sign_params(&with_empty, "s"), sign_params(&without, "s"));
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let config = MediaStoreConfig {
            cloud_name: "demo".into(),
            api_base: "http://localhost:9000/".into(),
            ..Default::default()
        };
        let store = CloudinaryStore::new(&config).unwrap();
        assert_eq!(
            store.endpoint("destroy"),
            "http://localhost:9000/v1_1/demo/image/destroy"
        );
    }
}
