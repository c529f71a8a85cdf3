//! Credential Authority
//!
//! Registration, login and token authentication. This is the only place
//! that sees password hashes or signs tokens.

use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::auth::models::{AuthUser, Credentials, LoginOutcome};
use crate::auth::password::{
    PasswordPolicy, hash_password_blocking, verify_password_blocking,
};
use crate::config::AuthConfig;
use crate::database::models::{NewUser, UserRead};
use crate::database::{Storage, StorageError};
use crate::error::AppError;

pub struct CredentialAuthority {
    store: Arc<dyn Storage>,
    jwt: JwtService,
    policy: PasswordPolicy,
}

impl CredentialAuthority {
    pub fn new(store: Arc<dyn Storage>, config: &AuthConfig) -> Self {
        Self {
            store,
            jwt: JwtService::new(config),
            policy: PasswordPolicy {
                min_length: config.password_min_length,
                max_length: config.password_max_length,
            },
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Create a new user. Fails with `DuplicateUser` if the email is taken
    /// and `WeakCredential` if the password fails the policy.
    pub async fn register(&self, creds: Credentials) -> Result<UserRead, AppError> {
        if self.store.find_user_by_handle(&creds.email).await?.is_some() {
            return Err(AppError::DuplicateUser);
        }
        self.policy.check(&creds.password)?;

        let password_hash = hash_password_blocking(creds.password).await?;
        let user = self
            .store
            .insert_user(NewUser::new(creds.email, password_hash))
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration of the same email
                StorageError::Conflict(_) => AppError::DuplicateUser,
                other => AppError::Storage(other),
            })?;

        tracing::info!("👤 Registered user {}", user.id);
        Ok(UserRead::from(&user))
    }

    /// Check credentials and issue a token. Unknown email and wrong password
    /// both yield `InvalidCredentials`.
    pub async fn login(&self, creds: Credentials) -> Result<LoginOutcome, AppError> {
        let user = self.store.find_user_by_handle(&creds.email).await?;

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let valid = verify_password_blocking(creds.password, stored_hash).await?;

        let user = match user {
            Some(user) if valid => user,
            _ => {
                tracing::warn!("Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };
        if !user.is_active {
            return Err(AppError::InactiveUser);
        }

        let token = self.jwt.create_token(user.id, &user.email)?;
        tracing::info!("🔑 Issued token for user {}", user.id);
        Ok(LoginOutcome {
            token,
            user: UserRead::from(&user),
        })
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// The token must verify, be unexpired, and name a user that still
    /// exists and is active.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
        let claims = self.jwt.validate_token(token)?;

        match self.store.find_user_by_id(claims.sub).await? {
            Some(user) if user.is_active => Ok(AuthUser {
                id: user.id,
                email: user.email,
            }),
            _ => {
                tracing::warn!("Token for unknown or inactive user {}", claims.sub);
                Err(AppError::InvalidToken)
            }
        }
    }

    pub async fn current_user(&self, auth: &AuthUser) -> Result<UserRead, AppError> {
        self.store
            .find_user_by_id(auth.id)
            .await?
            .map(|user| UserRead::from(&user))
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::MemoryStore;
    use chrono::{Duration, Utc};

    fn authority() -> CredentialAuthority {
        CredentialAuthority::new(Arc::new(MemoryStore::new()), &Config::test_config().auth)
    }

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_login_authenticate_resolves_same_user() {
        let authority = authority();
        let registered = authority
            .register(creds("alice@example.com", "correct horse"))
            .await
            .unwrap();

        let outcome = authority
            .login(creds("alice@example.com", "correct horse"))
            .await
            .unwrap();
        assert_eq!(outcome.user.id, registered.id);

        let auth = authority.authenticate(&outcome.token.token).await.unwrap();
        assert_eq!(auth.id, registered.id);
        assert_eq!(auth.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_duplicate_registration_fails_regardless_of_password() {
        let authority = authority();
        authority
            .register(creds("alice@example.com", "correct horse"))
            .await
            .unwrap();

        for password in ["correct horse", "another password", ""] {
            let err = authority
                .register(creds("alice@example.com", password))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::DuplicateUser), "got {:?}", err);
        }
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let authority = authority();
        let err = authority.register(creds("bob@example.com", "short")).await.unwrap_err();
        assert!(matches!(err, AppError::WeakCredential(_)));

        // nothing was persisted
        let err = authority.login(creds("bob@example.com", "short")).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let authority = authority();
        authority
            .register(creds("alice@example.com", "correct horse"))
            .await
            .unwrap();

        let wrong_password = authority
            .login(creds("alice@example.com", "battery staple"))
            .await
            .unwrap_err();
        let unknown_user = authority
            .login(creds("nobody@example.com", "correct horse"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.code(), unknown_user.code());
    }

    #[tokio::test]
    async fn test_expired_token_fails_even_with_valid_signature() {
        let authority = authority();
        let user = authority
            .register(creds("alice@example.com", "correct horse"))
            .await
            .unwrap();

        let stale = authority
            .jwt()
            .issue_at(user.id, &user.email, Utc::now() - Duration::days(2))
            .unwrap();
        let err = authority.authenticate(&stale.token).await.unwrap_err();
        assert!(matches!(err, AppError::ExpiredToken));
    }

    #[tokio::test]
    async fn test_deactivated_account() {
        let store = Arc::new(MemoryStore::new());
        let authority = CredentialAuthority::new(store.clone(), &Config::test_config().auth);
        let user = authority
            .register(creds("carol@example.com", "correct horse"))
            .await
            .unwrap();
        let outcome = authority
            .login(creds("carol@example.com", "correct horse"))
            .await
            .unwrap();

        store.set_active(user.id, false);

        let err = authority
            .login(creds("carol@example.com", "correct horse"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InactiveUser), "got {:?}", err);

        // the account state is only revealed after the password checks out
        let err = authority
            .login(creds("carol@example.com", "battery staple"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials), "got {:?}", err);

        let err = authority.authenticate(&outcome.token.token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_is_invalid() {
        let authority = authority();
        let orphan = authority
            .jwt()
            .create_token(uuid::Uuid::new_v4(), "ghost@example.com")
            .unwrap();

        let err = authority.authenticate(&orphan.token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_registration_admits_one() {
        let authority = Arc::new(authority());
        let a = {
            let authority = authority.clone();
            tokio::spawn(async move {
                authority.register(creds("race@example.com", "password-one")).await
            })
        };
        let b = {
            let authority = authority.clone();
            tokio::spawn(async move {
                authority.register(creds("race@example.com", "password-two")).await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::DuplicateUser)))
            .count();
        assert_eq!((ok, dup), (1, 1));
    }
}
