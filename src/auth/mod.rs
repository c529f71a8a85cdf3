//! # Authentication Module
//!
//! Password hashing, JWT issuance and validation, the credential authority
//! that ties them to the user store, and the middleware securing API
//! endpoints.

pub mod authority;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use authority::CredentialAuthority;
pub use middleware::AuthMiddleware;
pub use models::AuthUser;
