//! # Stratus Auth
//!
//! Credential issuance and the role gate protecting every control-plane
//! operation: Argon2id credential hashing, HS256 bearer tokens, and a
//! principal store with in-memory and file-backed implementations.
//!
//! Credentials are never stored or logged in plaintext; bearer tokens carry
//! the principal id and role and expire absolutely.

pub mod error;
pub mod password;
pub mod principal;
pub mod service;
pub mod store;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use password::PasswordHasher;
pub use principal::{AuthContext, Principal, Role};
pub use service::{AuthService, BearerToken};
pub use store::{FilePrincipalStore, MemoryPrincipalStore, PrincipalStore};
pub use token::{Claims, TokenSigner};
