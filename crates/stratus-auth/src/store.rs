//! Principal persistence.
//!
//! The `principals` table is small: an in-memory map for tests and a single
//! JSON document on disk for deployments.

use crate::error::{AuthError, AuthResult};
use crate::principal::Principal;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Storage for registered principals.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn get(&self, id: &str) -> AuthResult<Option<Principal>>;

    /// Insert a new principal; `AlreadyExists` on duplicate id.
    async fn insert(&self, principal: Principal) -> AuthResult<()>;

    async fn remove(&self, id: &str) -> AuthResult<()>;

    async fn list(&self) -> AuthResult<Vec<Principal>>;
}

/// Volatile store for tests.
pub struct MemoryPrincipalStore {
    principals: DashMap<String, Principal>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self {
            principals: DashMap::new(),
        }
    }
}

impl Default for MemoryPrincipalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn get(&self, id: &str) -> AuthResult<Option<Principal>> {
        Ok(self.principals.get(id).map(|p| p.clone()))
    }

    async fn insert(&self, principal: Principal) -> AuthResult<()> {
        if self.principals.contains_key(&principal.id) {
            return Err(AuthError::AlreadyExists(principal.id));
        }
        self.principals.insert(principal.id.clone(), principal);
        Ok(())
    }

    async fn remove(&self, id: &str) -> AuthResult<()> {
        self.principals
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AuthError::NotFound(id.to_string()))
    }

    async fn list(&self) -> AuthResult<Vec<Principal>> {
        Ok(self.principals.iter().map(|p| p.clone()).collect())
    }
}

/// File-backed store: the whole table is one JSON document, rewritten on
/// every mutation. Loaded eagerly at construction.
pub struct FilePrincipalStore {
    path: PathBuf,
    cache: DashMap<String, Principal>,
}

impl FilePrincipalStore {
    pub async fn open(path: impl Into<PathBuf>) -> AuthResult<Self> {
        let path = path.into();
        let cache = DashMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let loaded: BTreeMap<String, Principal> = serde_json::from_str(&raw)
                    .map_err(|e| AuthError::Storage(format!("corrupt principal store: {}", e)))?;
                for (id, principal) in loaded {
                    cache.insert(id, principal);
                }
                info!("loaded {} principals from {}", cache.len(), path.display());
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!("principal store {} missing, starting empty", path.display());
            }
            Err(err) => return Err(AuthError::Storage(err.to_string())),
        }

        Ok(Self { path, cache })
    }

    async fn persist(&self) -> AuthResult<()> {
        let snapshot: BTreeMap<String, Principal> = self
            .cache
            .iter()
            .map(|p| (p.key().clone(), p.value().clone()))
            .collect();
        let raw = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }
}

#[async_trait]
impl PrincipalStore for FilePrincipalStore {
    async fn get(&self, id: &str) -> AuthResult<Option<Principal>> {
        Ok(self.cache.get(id).map(|p| p.clone()))
    }

    async fn insert(&self, principal: Principal) -> AuthResult<()> {
        if self.cache.contains_key(&principal.id) {
            return Err(AuthError::AlreadyExists(principal.id));
        }
        self.cache.insert(principal.id.clone(), principal);
        self.persist().await
    }

    async fn remove(&self, id: &str) -> AuthResult<()> {
        self.cache
            .remove(id)
            .ok_or_else(|| AuthError::NotFound(id.to_string()))?;
        self.persist().await
    }

    async fn list(&self) -> AuthResult<Vec<Principal>> {
        Ok(self.cache.iter().map(|p| p.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use chrono::Utc;

    fn principal(id: &str) -> Principal {
        Principal {
            id: id.to_string(),
            role: Role::User,
            credential_hash: "$argon2id$fake".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_duplicate_insert() {
        let store = MemoryPrincipalStore::new();
        store.insert(principal("alice")).await.unwrap();
        let err = store.insert(principal("alice")).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("principals.json");

        {
            let store = FilePrincipalStore::open(&path).await.unwrap();
            store.insert(principal("alice")).await.unwrap();
            store.insert(principal("bob")).await.unwrap();
        }

        let reopened = FilePrincipalStore::open(&path).await.unwrap();
        assert!(reopened.get("alice").await.unwrap().is_some());
        assert_eq!(reopened.list().await.unwrap().len(), 2);

        reopened.remove("alice").await.unwrap();
        let reopened = FilePrincipalStore::open(&path).await.unwrap();
        assert!(reopened.get("alice").await.unwrap().is_none());
    }
}
