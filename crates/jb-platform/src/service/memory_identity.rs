//! In-memory identity provider for local runs and tests

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::identity::{IdentityError, IdentityProvider, IdentityUser, Session, SignInOutcome, SignUpOutcome};

const SESSION_TTL_SECS: u64 = 3600;

struct StoredUser {
    user: IdentityUser,
    password_hash: String,
}

/// Users keyed by lowercase email; sessions are opaque random tokens
#[derive(Default)]
pub struct MemoryIdentityProvider {
    users: DashMap<String, StoredUser>,
    sessions: DashMap<String, Uuid>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user directly and return a live session token
    pub fn seed_user(&self, email: &str, password: &str, metadata: Value) -> (IdentityUser, String) {
        let user = IdentityUser {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            user_metadata: metadata,
        };
        self.users.insert(
            user.email.clone(),
            StoredUser {
                user: user.clone(),
                password_hash: hash_password(&user.email, password),
            },
        );
        let session = self.open_session(user.id);
        (user, session.access_token)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn open_session(&self, user_id: Uuid) -> Session {
        let token = format!("mem.{}.{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.sessions.insert(token.clone(), user_id);
        Session {
            access_token: token,
            token_type: "bearer".to_string(),
            expires_in: Some(SESSION_TTL_SECS),
            refresh_token: None,
        }
    }

    fn find_by_id(&self, user_id: Uuid) -> Option<IdentityUser> {
        self.users
            .iter()
            .find(|entry| entry.user.id == user_id)
            .map(|entry| entry.user.clone())
    }
}

fn hash_password(email: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        let user_id = self
            .sessions
            .get(token)
            .map(|entry| *entry.value())
            .ok_or_else(|| IdentityError::InvalidCredentials("invalid JWT".to_string()))?;

        self.find_by_id(user_id)
            .ok_or_else(|| IdentityError::InvalidCredentials("User not found".to_string()))
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: Value) -> Result<SignUpOutcome, IdentityError> {
        let email = email.to_lowercase();
        if self.users.contains_key(&email) {
            return Err(IdentityError::Rejected("User already registered".to_string()));
        }

        let user = IdentityUser {
            id: Uuid::new_v4(),
            email: email.clone(),
            user_metadata: metadata,
        };
        self.users.insert(
            email.clone(),
            StoredUser {
                user: user.clone(),
                password_hash: hash_password(&email, password),
            },
        );
        let session = self.open_session(user.id);

        Ok(SignUpOutcome {
            user: Some(user),
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, IdentityError> {
        let email = email.to_lowercase();
        let user = self
            .users
            .get(&email)
            .filter(|stored| stored.password_hash == hash_password(&email, password))
            .map(|stored| stored.user.clone())
            .ok_or_else(|| IdentityError::InvalidCredentials("Invalid login credentials".to_string()))?;

        let session = self.open_session(user.id);
        Ok(SignInOutcome { user, session })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.sessions.remove(token);
        Ok(())
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let email = self
            .find_by_id(user_id)
            .map(|user| user.email)
            .ok_or_else(|| IdentityError::Rejected("User not found".to_string()))?;
        self.users.remove(&email);
        self.sessions.retain(|_, owner| *owner != user_id);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let outcome = provider
            .sign_up("Ada@Example.com", "secret1", json!({ "full_name": "Ada" }))
            .await
            .unwrap();
        let user = outcome.user.unwrap();
        assert_eq!(user.email, "ada@example.com");

        let signed_in = provider.sign_in("ada@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.user.id, user.id);

        let verified = provider.verify(&signed_in.session.access_token).await.unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_and_bad_password() {
        let provider = MemoryIdentityProvider::new();
        provider.sign_up("a@b.co", "secret1", Value::Null).await.unwrap();

        assert!(matches!(
            provider.sign_up("a@b.co", "other1", Value::Null).await,
            Err(IdentityError::Rejected(_))
        ));
        assert!(matches!(
            provider.sign_in("a@b.co", "wrong").await,
            Err(IdentityError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_and_delete_revoke_sessions() {
        let provider = MemoryIdentityProvider::new();
        let (user, token) = provider.seed_user("x@y.io", "secret1", Value::Null);

        provider.sign_out(&token).await.unwrap();
        assert!(provider.verify(&token).await.is_err());

        let second = provider.sign_in("x@y.io", "secret1").await.unwrap();
        provider.delete_user(user.id).await.unwrap();
        assert!(provider.verify(&second.session.access_token).await.is_err());
        assert_eq!(provider.session_count(), 0);
    }
}
