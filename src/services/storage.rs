//! Supabase Storage uploads (invoices, artwork images).

use crate::config::SupabaseConfig;
use crate::error::{Result, StoreError};

#[derive(Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub public_url: String,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, config: &SupabaseConfig) -> Self {
        Self {
            http,
            base_url: config.url.clone(),
            service_key: config.service_role_key.clone(),
        }
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }

    /// Upload (or overwrite) an object.
    pub async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<StoredObject> {
        if self.base_url.is_empty() || self.service_key.is_empty() {
            return Err(StoreError::Storage("Supabase storage is not configured".into()));
        }

        let size = bytes.len();
        let resp = self
            .http
            .post(format!("{}/storage/v1/object/{bucket}/{path}", self.base_url))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("content-type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("upload to {bucket}/{path} failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Storage(format!("upload to {bucket}/{path} returned {status}: {body}")));
        }

        tracing::info!(bucket, path, size, "Object uploaded");
        Ok(StoredObject { bucket: bucket.to_string(), path: path.to_string(), public_url: self.public_url(bucket, path) })
    }
}

/// Keeps a single path segment to `[a-z0-9._-]`.
pub fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '-' })
        .collect();
    cleaned.trim_matches(|c| c == '-' || c == '.').to_string()
}
