//! The auth service: register, login, validate, require.

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordHasher;
use crate::principal::{AuthContext, Principal, Role};
use crate::store::PrincipalStore;
use crate::token::TokenSigner;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// A signed bearer token and its absolute expiry.
#[derive(Debug, Clone, Serialize)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub role: Role,
}

/// Credential issuance and validation over a principal store.
pub struct AuthService {
    store: Arc<dyn PrincipalStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
}

impl AuthService {
    pub fn new(store: Arc<dyn PrincipalStore>, signer: TokenSigner) -> Self {
        Self {
            store,
            hasher: PasswordHasher::new(),
            signer,
        }
    }

    /// Register a principal. The credential is hashed before it is stored;
    /// re-registering an existing id is a conflict.
    pub async fn register(
        &self,
        principal_id: &str,
        credential: &str,
        role: Role,
    ) -> AuthResult<Principal> {
        if principal_id.trim().is_empty() {
            return Err(AuthError::Configuration(
                "principal id cannot be empty".to_string(),
            ));
        }

        let principal = Principal {
            id: principal_id.to_string(),
            role,
            credential_hash: self.hasher.hash(credential)?,
            created_at: Utc::now(),
        };
        self.store.insert(principal.clone()).await?;

        info!("registered principal {} with role {}", principal.id, role);
        Ok(principal)
    }

    /// Verify a credential and issue a bearer token.
    ///
    /// Unknown principals and wrong credentials produce the same error, so
    /// login cannot be used to enumerate ids.
    pub async fn login(&self, principal_id: &str, credential: &str) -> AuthResult<BearerToken> {
        let principal = self
            .store
            .get(principal_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(credential, &principal.credential_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let (token, expires_at) = self.signer.sign(&principal.id, principal.role)?;
        Ok(BearerToken {
            token,
            expires_at,
            role: principal.role,
        })
    }

    /// Validate a bearer token into a request auth context.
    pub fn validate(&self, token: &str) -> AuthResult<AuthContext> {
        let claims = self.signer.validate(token)?;
        let expires_at = claims.expires_at();
        Ok(AuthContext {
            principal_id: claims.sub,
            role: claims.role,
            expires_at,
        })
    }

    /// Role gate: the context's role must include `required`.
    pub fn require(&self, ctx: &AuthContext, required: Role) -> AuthResult<()> {
        if ctx.role.allows(required) {
            Ok(())
        } else {
            Err(AuthError::InsufficientRole {
                required: required.to_string(),
                actual: ctx.role.to_string(),
            })
        }
    }

    /// Whether any principal exists yet. Used to bootstrap the first admin.
    pub async fn is_empty(&self) -> AuthResult<bool> {
        Ok(self.store.list().await?.is_empty())
    }

    /// Remove a principal. Admin-gated by the control API.
    pub async fn remove(&self, principal_id: &str) -> AuthResult<()> {
        self.store.remove(principal_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPrincipalStore;

    fn service() -> AuthService {
        let signer =
            TokenSigner::new(b"test-signing-key-of-sufficient-length!!", 3600).unwrap();
        AuthService::new(Arc::new(MemoryPrincipalStore::new()), signer)
    }

    #[tokio::test]
    async fn test_register_login_validate_round_trip() {
        let auth = service();
        auth.register("alice", "s3cret-passphrase", Role::User)
            .await
            .unwrap();

        let bearer = auth.login("alice", "s3cret-passphrase").await.unwrap();
        let ctx = auth.validate(&bearer.token).unwrap();

        assert_eq!(ctx.principal_id, "alice");
        assert_eq!(ctx.role, Role::User);
    }

    #[tokio::test]
    async fn test_reregister_conflicts() {
        let auth = service();
        auth.register("alice", "pw-one", Role::Viewer).await.unwrap();
        let err = auth.register("alice", "pw-two", Role::Viewer).await.unwrap_err();
        assert!(matches!(err, AuthError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_wrong_credential_and_unknown_principal_indistinct() {
        let auth = service();
        auth.register("alice", "right", Role::Viewer).await.unwrap();

        let wrong = auth.login("alice", "wrong").await.unwrap_err();
        let unknown = auth.login("nobody", "whatever").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn test_require_role_gate() {
        let auth = service();
        auth.register("viewer", "pw", Role::Viewer).await.unwrap();
        let bearer = auth.login("viewer", "pw").await.unwrap();
        let ctx = auth.validate(&bearer.token).unwrap();

        assert!(auth.require(&ctx, Role::Viewer).is_ok());
        assert!(auth.require(&ctx, Role::User).is_err());
        assert!(auth.require(&ctx, Role::Admin).is_err());
    }
}
