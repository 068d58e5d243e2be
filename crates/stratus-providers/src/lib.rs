//! # Stratus Providers
//!
//! Uniform object-storage adapters across AWS S3, Azure Blob Storage, and
//! Google Cloud Storage, plus an in-memory mock for tests.
//!
//! Every adapter exposes the same operation set — enumerate, stat, get, put,
//! copy, delete, set_storage_class, presign_get — behind the
//! [`ProviderAdapter`] tagged variant, and translates provider-native errors
//! into the shared [`AdapterErrorKind`] taxonomy. Pagination is transparent:
//! callers of [`ProviderAdapter::enumerate`] see a single flat stream.
//!
//! Adapter instances are safe for concurrent use by many workers; per-container
//! client pooling is internal to each adapter.

pub mod adapter;
pub mod aws;
pub mod azure;
pub mod error;
pub mod gcp;
pub mod mock;
pub mod registry;

mod remote;

pub use adapter::{copy_between, ObjectStream, OverwriteMode, ProviderAdapter};
pub use aws::AwsAdapter;
pub use azure::AzureAdapter;
pub use error::{AdapterError, AdapterErrorKind, AdapterResult};
pub use gcp::GcpAdapter;
pub use mock::MockAdapter;
pub use registry::{ProviderRegistry, ProviderSettings};
