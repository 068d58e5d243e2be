//! Bearer token signing and validation.

use crate::error::{AuthError, AuthResult};
use crate::principal::Role;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const ISSUER: &str = "stratus";

/// Claims embedded in a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id.
    pub sub: String,
    /// Principal role.
    pub role: Role,
    /// Absolute expiry (Unix timestamp).
    pub exp: i64,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Token id.
    pub jti: String,
    /// Issuer.
    pub iss: String,
}

impl Claims {
    fn new(principal_id: &str, role: Role, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: principal_id.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: ISSUER.to_string(),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// HS256 token signer and validator.
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Build a signer over a shared secret. Short secrets are refused.
    pub fn new(secret: &[u8], ttl_seconds: u64) -> AuthResult<Self> {
        if secret.len() < 32 {
            return Err(AuthError::Configuration(
                "signing key must be at least 32 bytes".to_string(),
            ));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(ttl_seconds as i64),
        })
    }

    /// Sign a bearer token for a principal.
    pub fn sign(&self, principal_id: &str, role: Role) -> AuthResult<(String, DateTime<Utc>)> {
        let claims = Claims::new(principal_id, role, self.ttl);
        let expires_at = claims.expires_at();
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok((token, expires_at))
    }

    /// Validate a bearer token, rejecting expired, malformed, or
    /// signature-mismatched tokens.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-signing-key-of-sufficient-length!!", 3600).unwrap()
    }

    #[test]
    fn test_sign_and_validate() {
        let signer = signer();
        let (token, expires_at) = signer.sign("alice", Role::User).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert!(expires_at > Utc::now());

        let claims = signer.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_short_secret_refused() {
        assert!(TokenSigner::new(b"short", 3600).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(signer().validate("not.a.token").is_err());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let ours = signer();
        let theirs =
            TokenSigner::new(b"another-signing-key-of-sufficient-len!!!", 3600).unwrap();
        let (token, _) = theirs.sign("mallory", Role::Admin).unwrap();
        assert!(ours.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let secret = b"test-signing-key-of-sufficient-length!!";
        let signer = TokenSigner::new(secret, 3600).unwrap();

        // Forge a token that expired an hour ago, signed with the right key.
        let now = Utc::now();
        let claims = Claims {
            sub: "alice".to_string(),
            role: Role::Viewer,
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: ISSUER.to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        assert!(signer.validate(&token).is_err());
    }
}
