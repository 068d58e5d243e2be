//! The uniform adapter surface.
//!
//! Provider clients are heterogeneous, so the common operation set lives on a
//! tagged variant rather than a trait object; variant construction fixes each
//! adapter's container client pool.

use crate::aws::AwsAdapter;
use crate::azure::AzureAdapter;
use crate::error::{AdapterError, AdapterErrorKind, AdapterResult};
use crate::gcp::GcpAdapter;
use crate::mock::MockAdapter;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::time::Duration;
use stratus_core::{ObjectRef, Provider, Tier};
use tracing::debug;

/// Flat, transparently paginated object stream.
pub type ObjectStream = BoxStream<'static, AdapterResult<ObjectRef>>;

/// How a copy treats an existing destination object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteMode {
    /// Overwrite unconditionally.
    Always,
    /// Skip the copy when the destination already matches the source by size
    /// (and etag, when comparable). Makes re-copies idempotent.
    IfChanged,
    /// Fail with `DEST_EXISTS_CONFLICT` when the destination exists.
    Never,
}

/// A configured storage backend.
pub enum ProviderAdapter {
    Aws(AwsAdapter),
    Azure(AzureAdapter),
    Gcp(GcpAdapter),
    Mock(MockAdapter),
}

impl ProviderAdapter {
    /// The provider tag this adapter serves. The mock reports whichever
    /// provider it was constructed to impersonate.
    pub fn provider(&self) -> Provider {
        match self {
            ProviderAdapter::Aws(a) => a.provider(),
            ProviderAdapter::Azure(a) => a.provider(),
            ProviderAdapter::Gcp(a) => a.provider(),
            ProviderAdapter::Mock(a) => a.provider(),
        }
    }

    /// Enumerate a container as a single flat stream. Ordering across pages
    /// is provider-defined and not relied on.
    pub fn enumerate(&self, container: &str, prefix: Option<&str>) -> ObjectStream {
        match self {
            ProviderAdapter::Aws(a) => a.enumerate(container, prefix),
            ProviderAdapter::Azure(a) => a.enumerate(container, prefix),
            ProviderAdapter::Gcp(a) => a.enumerate(container, prefix),
            ProviderAdapter::Mock(a) => a.enumerate(container, prefix),
        }
    }

    /// Fresh metadata for one object.
    pub async fn stat(&self, container: &str, key: &str) -> AdapterResult<ObjectRef> {
        match self {
            ProviderAdapter::Aws(a) => a.stat(container, key).await,
            ProviderAdapter::Azure(a) => a.stat(container, key).await,
            ProviderAdapter::Gcp(a) => a.stat(container, key).await,
            ProviderAdapter::Mock(a) => a.stat(container, key).await,
        }
    }

    /// Read an object's payload.
    pub async fn get(&self, container: &str, key: &str) -> AdapterResult<Bytes> {
        match self {
            ProviderAdapter::Aws(a) => a.get(container, key).await,
            ProviderAdapter::Azure(a) => a.get(container, key).await,
            ProviderAdapter::Gcp(a) => a.get(container, key).await,
            ProviderAdapter::Mock(a) => a.get(container, key).await,
        }
    }

    /// Write an object's payload, returning the bytes written.
    pub async fn put(&self, container: &str, key: &str, data: Bytes) -> AdapterResult<u64> {
        match self {
            ProviderAdapter::Aws(a) => a.put(container, key, data).await,
            ProviderAdapter::Azure(a) => a.put(container, key, data).await,
            ProviderAdapter::Gcp(a) => a.put(container, key, data).await,
            ProviderAdapter::Mock(a) => a.put(container, key, data).await,
        }
    }

    /// Idempotent delete: deleting a non-existent object is success.
    pub async fn delete(&self, container: &str, key: &str) -> AdapterResult<()> {
        match self {
            ProviderAdapter::Aws(a) => a.delete(container, key).await,
            ProviderAdapter::Azure(a) => a.delete(container, key).await,
            ProviderAdapter::Gcp(a) => a.delete(container, key).await,
            ProviderAdapter::Mock(a) => a.delete(container, key).await,
        }
    }

    /// In-place storage class change, where the provider client supports it.
    pub async fn set_storage_class(
        &self,
        container: &str,
        key: &str,
        tier: Tier,
    ) -> AdapterResult<()> {
        match self {
            ProviderAdapter::Mock(a) => a.set_storage_class(container, key, tier).await,
            _ => Err(AdapterError::invalid_argument(
                "in-place storage class change is not supported by this client",
            )),
        }
    }

    /// Pre-signed GET URL. Only the AWS client signs URLs.
    pub async fn presign_get(
        &self,
        container: &str,
        key: &str,
        ttl: Duration,
    ) -> AdapterResult<String> {
        match self {
            ProviderAdapter::Aws(a) => a.presign_get(container, key, ttl).await,
            ProviderAdapter::Mock(a) => a.presign_get(container, key, ttl).await,
            _ => Err(AdapterError::invalid_argument(
                "presigned URLs are not supported by this client",
            )),
        }
    }

    /// Same-provider copy. Server-side when the client supports it for this
    /// source/destination pair, streamed otherwise.
    pub async fn copy_object(
        &self,
        src: &ObjectRef,
        dest_container: &str,
        dest_key: &str,
        mode: OverwriteMode,
    ) -> AdapterResult<u64> {
        copy_between(self, src, self, dest_container, dest_key, mode).await
    }

    /// Server-side copy attempt; `None` means the caller must stream.
    async fn server_side_copy(
        &self,
        src: &ObjectRef,
        dest_container: &str,
        dest_key: &str,
    ) -> AdapterResult<Option<u64>> {
        match self {
            ProviderAdapter::Aws(a) => a.server_side_copy(src, dest_container, dest_key).await,
            ProviderAdapter::Azure(a) => a.server_side_copy(src, dest_container, dest_key).await,
            ProviderAdapter::Gcp(a) => a.server_side_copy(src, dest_container, dest_key).await,
            ProviderAdapter::Mock(a) => a.server_side_copy(src, dest_container, dest_key).await,
        }
    }
}

/// Copy one object between adapters, possibly across providers.
///
/// Same-provider copies prefer the provider's server-side copy; cross-provider
/// copies stream the payload through the caller. Returns the bytes copied, or
/// the source size when the destination was already up to date under
/// [`OverwriteMode::IfChanged`].
pub async fn copy_between(
    src_adapter: &ProviderAdapter,
    src: &ObjectRef,
    dest_adapter: &ProviderAdapter,
    dest_container: &str,
    dest_key: &str,
    mode: OverwriteMode,
) -> AdapterResult<u64> {
    let same_provider = src_adapter.provider() == dest_adapter.provider();

    match mode {
        OverwriteMode::Always => {}
        OverwriteMode::Never | OverwriteMode::IfChanged => {
            match dest_adapter.stat(dest_container, dest_key).await {
                Ok(existing) => {
                    if mode == OverwriteMode::Never {
                        return Err(AdapterError::dest_exists(format!(
                            "destination exists: {}/{}",
                            dest_container, dest_key
                        )));
                    }
                    // Etags are only comparable within one provider.
                    let etag_matches = match (same_provider, &existing.etag, &src.etag) {
                        (true, Some(a), Some(b)) => a == b,
                        _ => true,
                    };
                    if existing.size_bytes == src.size_bytes && etag_matches {
                        debug!(
                            "destination {}/{} already up to date, skipping copy",
                            dest_container, dest_key
                        );
                        return Ok(src.size_bytes);
                    }
                }
                Err(err) if err.kind == AdapterErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }
    }

    if same_provider {
        if let Some(bytes) = dest_adapter
            .server_side_copy(src, dest_container, dest_key)
            .await?
        {
            return Ok(bytes);
        }
    }

    let data = match src_adapter.get(&src.container, &src.key).await {
        Ok(data) => data,
        Err(err) if err.kind == AdapterErrorKind::NotFound => {
            return Err(AdapterError::source_missing(format!(
                "copy source missing: {}/{}",
                src.container, src.key
            )));
        }
        Err(err) => return Err(err),
    };

    dest_adapter.put(dest_container, dest_key, data).await
}
