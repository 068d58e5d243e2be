//! AWS S3 adapter.

use crate::adapter::ObjectStream;
use crate::error::{AdapterError, AdapterResult};
use crate::remote::{ClientBuilder, RemoteContainers};
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as StorePath;
use object_store::signer::Signer;
use std::time::Duration;
use stratus_core::{ObjectRef, Provider};

/// S3-backed adapter. Credentials come from the standard environment
/// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, `AWS_DEFAULT_REGION`,
/// optionally `AWS_ENDPOINT`).
pub struct AwsAdapter {
    store: RemoteContainers<AmazonS3>,
}

impl AwsAdapter {
    /// Build an adapter whose per-bucket clients are configured from the
    /// environment.
    pub fn from_env() -> Self {
        let build: ClientBuilder<AmazonS3> = Box::new(|container| {
            AmazonS3Builder::from_env()
                .with_bucket_name(container)
                .build()
                .map_err(AdapterError::from)
        });
        Self {
            store: RemoteContainers::new(Provider::Aws, "STANDARD", build),
        }
    }

    pub fn provider(&self) -> Provider {
        self.store.provider()
    }

    pub fn enumerate(&self, container: &str, prefix: Option<&str>) -> ObjectStream {
        self.store.enumerate(container, prefix)
    }

    pub async fn stat(&self, container: &str, key: &str) -> AdapterResult<ObjectRef> {
        self.store.stat(container, key).await
    }

    pub async fn get(&self, container: &str, key: &str) -> AdapterResult<Bytes> {
        self.store.get(container, key).await
    }

    pub async fn put(&self, container: &str, key: &str, data: Bytes) -> AdapterResult<u64> {
        self.store.put(container, key, data).await
    }

    pub async fn delete(&self, container: &str, key: &str) -> AdapterResult<()> {
        self.store.delete(container, key).await
    }

    pub(crate) async fn server_side_copy(
        &self,
        src: &ObjectRef,
        dest_container: &str,
        dest_key: &str,
    ) -> AdapterResult<Option<u64>> {
        self.store.server_side_copy(src, dest_container, dest_key).await
    }

    /// Pre-signed GET URL for direct client download.
    pub async fn presign_get(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> AdapterResult<String> {
        let client = self.store.client(container)?;
        let url = client
            .signed_url(Method::GET, &StorePath::from(key), ttl)
            .await?;
        Ok(url.to_string())
    }
}
