//! Object storage
//!
//! S3-compatible storage for rendered PDFs. Custom endpoints (MinIO and
//! friends) are supported through `endpoint` + path-style addressing.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Datelike, Utc};

use taskhub_types::{ReportId, UserId};

use crate::ReportError;

/// Object storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Custom endpoint for S3-compatible stores
    pub endpoint: Option<String>,
    /// Public base URL for uploaded objects; supports `{bucket}`/`{key}`
    /// templating
    pub public_base_url: String,
}

/// S3-backed object storage for report PDFs
#[derive(Clone)]
pub struct ObjectStorage {
    client: S3Client,
    bucket: String,
    public_base_url: String,
}

impl ObjectStorage {
    /// Build the storage client from configuration
    pub async fn new(config: StorageConfig) -> Self {
        let region = aws_config::Region::new(config.region.clone());
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: S3Client::from_conf(builder.build()),
            bucket: config.bucket,
            public_base_url: config.public_base_url,
        }
    }

    /// Upload an object and return its public URL
    pub async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, ReportError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key, error = %e, "S3 upload failed");
                ReportError::Storage(e.to_string())
            })?;

        tracing::info!(key, "Uploaded object");
        Ok(build_public_url(&self.public_base_url, &self.bucket, key))
    }

    /// Delete an object; missing objects are not an error
    pub async fn delete(&self, key: &str) -> Result<(), ReportError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key, error = %e, "S3 delete failed");
                ReportError::Storage(e.to_string())
            })?;

        tracing::info!(key, "Deleted object");
        Ok(())
    }
}

impl std::fmt::Debug for ObjectStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStorage")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

/// Storage key for a report's PDF, partitioned by upload month
pub fn report_pdf_key(user_id: UserId, report_id: ReportId, at: DateTime<Utc>) -> String {
    format!(
        "reports/{}/{:02}/{}/{}.pdf",
        at.year(),
        at.month(),
        user_id,
        report_id
    )
}

/// Build a public URL for an object.
///
/// The base may use `{bucket}`/`{key}` templating; otherwise the bucket
/// segment is appended only when the base does not already contain it.
pub fn build_public_url(base: &str, bucket: &str, key: &str) -> String {
    let trimmed = base.trim_end_matches('/');

    if trimmed.contains("{bucket}") || trimmed.contains("{key}") {
        return trimmed.replace("{bucket}", bucket).replace("{key}", key);
    }

    if trimmed.contains(bucket) {
        format!("{trimmed}/{key}")
    } else {
        format!("{trimmed}/{bucket}/{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_is_partitioned_by_month() {
        let user = UserId::new();
        let report = ReportId::new();
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();

        let key = report_pdf_key(user, report, at);
        assert_eq!(key, format!("reports/2026/03/{user}/{report}.pdf"));
    }

    #[test]
    fn public_url_variants() {
        assert_eq!(
            build_public_url("https://cdn.example.com", "pdfs", "a/b.pdf"),
            "https://cdn.example.com/pdfs/a/b.pdf"
        );
        assert_eq!(
            build_public_url("https://pdfs.s3.amazonaws.com/", "pdfs", "a.pdf"),
            "https://pdfs.s3.amazonaws.com/a.pdf"
        );
        assert_eq!(
            build_public_url("https://host/{bucket}/{key}", "pdfs", "a.pdf"),
            "https://host/pdfs/a.pdf"
        );
    }
}
