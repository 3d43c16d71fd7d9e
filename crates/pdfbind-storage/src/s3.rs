use crate::keys::validate_key;
use crate::sign;
use crate::traits::{PostGrant, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use chrono::Utc;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use pdfbind_core::StorageBackend;
use std::collections::BTreeMap;
use std::time::Duration;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    access_key_id: String,
    secret_access_key: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `access_key_id` / `secret_access_key` - credentials, also used for
    ///   grant signing (POST policies and presigned GETs)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        access_key_id: String,
        secret_access_key: String,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone())
            .with_access_key_id(access_key_id.clone())
            .with_secret_access_key(secret_access_key.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
            access_key_id,
            secret_access_key,
        })
    }

    /// Public URL for an object.
    ///
    /// For AWS S3, uses the virtual-hosted format; for S3-compatible
    /// providers, path-style under the custom endpoint.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }

    /// (scheme, host, path-prefix) for signed requests against this bucket.
    fn signing_target(&self) -> (String, String, String) {
        if let Some(ref endpoint) = self.endpoint_url {
            let trimmed = endpoint.trim_end_matches('/');
            let (scheme, host) = match trimmed.split_once("://") {
                Some((scheme, host)) => (scheme.to_string(), host.to_string()),
                None => ("https".to_string(), trimmed.to_string()),
            };
            (scheme, host, format!("/{}", self.bucket))
        } else {
            (
                "https".to_string(),
                format!("{}.s3.{}.amazonaws.com", self.bucket, self.region),
                String::new(),
            )
        }
    }

    /// The URL upload forms must POST to (the bucket root).
    fn post_url(&self) -> String {
        let (scheme, host, prefix) = self.signing_target();
        format!("{}://{}{}/", scheme, host, prefix)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> StorageResult<String> {
        validate_key(key)?;
        let size = data.len() as u64;
        let bytes = Bytes::from(data);
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(self.generate_url(key))
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        expires_in: Duration,
        content_disposition: Option<&str>,
    ) -> StorageResult<String> {
        validate_key(key)?;

        // Plain downloads go through object_store's signer; a disposition
        // override must be part of the signed query string, which the signer
        // does not support, so those URLs are signed by hand.
        match content_disposition {
            None => {
                let location = Path::from(key.to_string());
                let url_result: ObjectResult<_> = self
                    .store
                    .signed_url(Method::GET, &location, expires_in)
                    .await;

                let url = url_result
                    .map_err(|e| StorageError::BackendError(e.to_string()))?
                    .to_string();

                Ok(url)
            }
            Some(disposition) => {
                let (scheme, host, prefix) = self.signing_target();
                let path = format!("{}/{}", prefix, key);
                Ok(sign::presign_get(
                    &scheme,
                    &host,
                    &path,
                    &self.region,
                    &self.access_key_id,
                    &self.secret_access_key,
                    Utc::now(),
                    expires_in.as_secs(),
                    &[("response-content-disposition", disposition)],
                ))
            }
        }
    }

    async fn presigned_post(
        &self,
        key: &str,
        content_type: &str,
        size_range: (u64, u64),
        expires_in: Duration,
    ) -> StorageResult<PostGrant> {
        validate_key(key)?;

        let now = Utc::now();
        let expires_at = now
            + chrono::Duration::from_std(expires_in)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        let date = sign::date_stamp(now);
        let amz_date = sign::amz_date(now);
        let credential = sign::credential(&self.access_key_id, &date, &self.region);

        let (min_size, max_size) = size_range;
        let policy = serde_json::json!({
            "expiration": sign::policy_expiration(expires_at),
            "conditions": [
                { "bucket": self.bucket },
                { "key": key },
                { "Content-Type": content_type },
                [ "content-length-range", min_size, max_size ],
                { "x-amz-algorithm": sign::ALGORITHM },
                { "x-amz-credential": credential },
                { "x-amz-date": amz_date },
            ],
        });

        let policy_base64 =
            base64::engine::general_purpose::STANDARD.encode(policy.to_string().as_bytes());
        let signature = sign::sign_policy(
            &policy_base64,
            &self.secret_access_key,
            &date,
            &self.region,
        );

        let mut fields = BTreeMap::new();
        fields.insert("key".to_string(), key.to_string());
        fields.insert("Content-Type".to_string(), content_type.to_string());
        fields.insert("policy".to_string(), policy_base64);
        fields.insert("x-amz-algorithm".to_string(), sign::ALGORITHM.to_string());
        fields.insert("x-amz-credential".to_string(), credential);
        fields.insert("x-amz-date".to_string(), amz_date);
        fields.insert("x-amz-signature".to_string(), signature);

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            expires_secs = expires_in.as_secs(),
            "Issued POST grant"
        );

        Ok(PostGrant {
            url: self.post_url(),
            fields,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_storage() -> S3Storage {
        S3Storage::new(
            "docs".to_string(),
            "us-east-1".to_string(),
            None,
            "AKIAEXAMPLE".to_string(),
            "test-secret".to_string(),
        )
        .await
        .expect("build storage")
    }

    #[tokio::test]
    async fn test_post_grant_fields() {
        let storage = test_storage().await;
        let grant = storage
            .presigned_post(
                "uploads/abc/a.pdf",
                "application/pdf",
                (1, 104_857_600),
                Duration::from_secs(3600),
            )
            .await
            .expect("grant");

        assert_eq!(grant.url, "https://docs.s3.us-east-1.amazonaws.com/");
        assert_eq!(grant.fields.get("key").map(String::as_str), Some("uploads/abc/a.pdf"));
        assert_eq!(
            grant.fields.get("Content-Type").map(String::as_str),
            Some("application/pdf")
        );
        assert!(grant.fields.contains_key("policy"));
        assert!(grant.fields.contains_key("x-amz-signature"));

        // The policy must encode the exact key and a content-length-range.
        let policy_json = base64::engine::general_purpose::STANDARD
            .decode(grant.fields.get("policy").unwrap())
            .expect("base64");
        let policy: serde_json::Value = serde_json::from_slice(&policy_json).expect("json");
        let conditions = policy["conditions"].as_array().expect("conditions");
        assert!(conditions.iter().any(|c| c.get("key").is_some()));
        assert!(conditions
            .iter()
            .any(|c| c.as_array().is_some_and(|a| a[0] == "content-length-range")));
    }

    #[tokio::test]
    async fn test_post_grant_rejects_bad_key() {
        let storage = test_storage().await;
        let result = storage
            .presigned_post(
                "uploads/../etc/passwd",
                "application/pdf",
                (1, 100),
                Duration::from_secs(60),
            )
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_path_style_for_custom_endpoint() {
        let storage = S3Storage::new(
            "docs".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
            "minio".to_string(),
            "minio-secret".to_string(),
        )
        .await
        .expect("build storage");

        assert_eq!(storage.post_url(), "http://localhost:9000/docs/");
        assert_eq!(
            storage.generate_url("merged/x.pdf"),
            "http://localhost:9000/docs/merged/x.pdf"
        );
    }
}
