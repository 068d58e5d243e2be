//! Google Cloud Storage adapter.

use crate::adapter::ObjectStream;
use crate::error::{AdapterError, AdapterResult};
use crate::remote::{ClientBuilder, RemoteContainers};
use bytes::Bytes;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use stratus_core::{ObjectRef, Provider};

/// GCS-backed adapter. Credentials come from the standard environment
/// (`GOOGLE_SERVICE_ACCOUNT` or `GOOGLE_SERVICE_ACCOUNT_PATH`).
pub struct GcpAdapter {
    store: RemoteContainers<GoogleCloudStorage>,
}

impl GcpAdapter {
    /// Build an adapter whose per-bucket clients are configured from the
    /// environment.
    pub fn from_env() -> Self {
        let build: ClientBuilder<GoogleCloudStorage> = Box::new(|container| {
            GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(container)
                .build()
                .map_err(AdapterError::from)
        });
        Self {
            store: RemoteContainers::new(Provider::Gcp, "STANDARD", build),
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
}
