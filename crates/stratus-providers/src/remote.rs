//! Shared implementation for the cloud-backed adapters.
//!
//! Each cloud adapter owns one `object_store` client per container, built on
//! first use and pooled thereafter. Connection pooling below that is the
//! client's concern.

use crate::adapter::ObjectStream;
use crate::error::{AdapterError, AdapterResult};
use async_stream::try_stream;
use bytes::Bytes;
use dashmap::DashMap;
use futures::StreamExt;
use object_store::path::Path as StorePath;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use std::sync::Arc;
use stratus_core::{ObjectRef, Provider};
use tracing::debug;

/// Builds a container-scoped client on demand.
pub(crate) type ClientBuilder<C> = Box<dyn Fn(&str) -> AdapterResult<C> + Send + Sync>;

/// Per-container client pool for one provider.
pub(crate) struct RemoteContainers<C: ObjectStore> {
    provider: Provider,
    /// Listings do not surface per-object storage classes; inventory entries
    /// report the container default.
    default_storage_class: &'static str,
    clients: DashMap<String, Arc<C>>,
    build: ClientBuilder<C>,
}

impl<C: ObjectStore> RemoteContainers<C> {
    pub(crate) fn new(
        provider: Provider,
        default_storage_class: &'static str,
        build: ClientBuilder<C>,
    ) -> Self {
        Self {
            provider,
            default_storage_class,
            clients: DashMap::new(),
            build,
        }
    }

    pub(crate) fn provider(&self) -> Provider {
        self.provider
    }

    /// Get or build the client for a container.
    pub(crate) fn client(&self, container: &str) -> AdapterResult<Arc<C>> {
        if let Some(client) = self.clients.get(container) {
            return Ok(client.clone());
        }
        let client = Arc::new((self.build)(container)?);
        self.clients.insert(container.to_string(), client.clone());
        Ok(client)
    }

    fn object_ref(&self, container: &str, meta: ObjectMeta) -> ObjectRef {
        ObjectRef {
            provider: self.provider,
            container: container.to_string(),
            key: meta.location.to_string(),
            size_bytes: meta.size as u64,
            last_modified: meta.last_modified,
            provider_storage_class: self.default_storage_class.to_string(),
            etag: meta.e_tag,
        }
    }

    /// Flat object stream over the container; pagination is handled by the
    /// underlying client.
    pub(crate) fn enumerate(&self, container: &str, prefix: Option<&str>) -> ObjectStream {
        let provider = self.provider;
        let default_class = self.default_storage_class;
        let container = container.to_string();
        let prefix = prefix.map(StorePath::from);
        let client = self.client(&container);

        Box::pin(try_stream! {
            let client = client?;
            let mut listing = client.list(prefix.as_ref());
            while let Some(meta) = listing.next().await {
                let meta = meta.map_err(AdapterError::from)?;
                yield ObjectRef {
                    provider,
                    container: container.clone(),
                    key: meta.location.to_string(),
                    size_bytes: meta.size as u64,
                    last_modified: meta.last_modified,
                    provider_storage_class: default_class.to_string(),
                    etag: meta.e_tag,
                };
            }
        })
    }

    pub(crate) async fn stat(&self, container: &str, key: &str) -> AdapterResult<ObjectRef> {
        let client = self.client(container)?;
        let meta = client.head(&StorePath::from(key)).await?;
        Ok(self.object_ref(container, meta))
    }

    pub(crate) async fn get(&self, container: &str, key: &str) -> AdapterResult<Bytes> {
        let client = self.client(container)?;
        let result = client.get(&StorePath::from(key)).await?;
        Ok(result.bytes().await?)
    }

    pub(crate) async fn put(&self, container: &str, key: &str, data: Bytes) -> AdapterResult<u64> {
        let client = self.client(container)?;
        let len = data.len() as u64;
        client
            .put(&StorePath::from(key), PutPayload::from(data))
            .await?;
        Ok(len)
    }

    /// Idempotent delete: a missing object is success.
    pub(crate) async fn delete(&self, container: &str, key: &str) -> AdapterResult<()> {
        let client = self.client(container)?;
        match client.delete(&StorePath::from(key)).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => {
                debug!("delete of absent object {}/{} treated as success", container, key);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Server-side copy within one container. Returns `None` when the copy
    /// crosses containers and must be streamed by the caller.
    pub(crate) async fn server_side_copy(
        &self,
        src: &ObjectRef,
        dest_container: &str,
        dest_key: &str,
    ) -> AdapterResult<Option<u64>> {
        if src.container != dest_container {
            return Ok(None);
        }
        let client = self.client(dest_container)?;
        client
            .copy(&StorePath::from(src.key.as_str()), &StorePath::from(dest_key))
            .await?;
        Ok(Some(src.size_bytes))
    }
}
