//! Identity collaborator
//!
//! Authentication itself is delegated; the core only needs accounts,
//! sessions and a stream of session changes.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use td_core::error::TdError;
use td_core::result::TdResult;
use td_models::User;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Session change notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "user", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
    PasswordRecovery(User),
    TokenRefreshed(User),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

#[async_trait]
pub trait Identity: Send + Sync {
    /// Register and sign in
    async fn sign_up(&self, email: &str, password: &str) -> TdResult<User>;

    async fn sign_in(&self, email: &str, password: &str) -> TdResult<Session>;

    async fn sign_out(&self) -> TdResult<()>;

    async fn current_user(&self) -> Option<User>;

    /// Request a password reset mail; unknown addresses are not reported
    async fn reset_password(&self, email: &str) -> TdResult<()>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

struct Account {
    user: User,
    password: String,
}

/// In-memory identity service for development and tests
pub struct MemoryIdentity {
    accounts: RwLock<HashMap<String, Account>>,
    session: RwLock<Option<Session>>,
    recoveries: Mutex<Vec<String>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            recoveries: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Addresses a reset mail was sent to
    pub fn recoveries(&self) -> Vec<String> {
        self.recoveries.lock().clone()
    }

    /// Complete a recovery: the user follows the mail link and is signed in
    pub fn complete_recovery(&self, email: &str) -> TdResult<Session> {
        let session = self.open_session(&normalize_email(email))?;
        self.publish(AuthEvent::PasswordRecovery(session.user.clone()));
        Ok(session)
    }

    /// Renew the current session's token
    pub fn refresh(&self) -> Option<Session> {
        let session = {
            let mut current = self.session.write();
            let session = current.as_mut()?;
            session.access_token = generate_token();
            session.clone()
        };
        self.publish(AuthEvent::TokenRefreshed(session.user.clone()));
        Some(session)
    }

    fn open_session(&self, email: &str) -> TdResult<Session> {
        let user = self
            .accounts
            .read()
            .get(email)
            .map(|account| account.user.clone())
            .ok_or_else(|| TdError::Identity("User not found".to_string()))?;
        let session = Session {
            user,
            access_token: generate_token(),
        };
        *self.session.write() = Some(session.clone());
        Ok(session)
    }

    fn publish(&self, event: AuthEvent) {
        debug!(?event, "auth event");
        let _ = self.events.send(event);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Random opaque access token
fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const TOKEN_LENGTH: usize = 48;

    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[async_trait]
impl Identity for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> TdResult<User> {
        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(TdError::Identity("Unable to validate email address: invalid format".to_string()));
        }
        if password.len() < 6 {
            return Err(TdError::Identity("Password should be at least 6 characters.".to_string()));
        }

        let user = {
            let mut accounts = self.accounts.write();
            if accounts.contains_key(&email) {
                return Err(TdError::Identity("User already registered".to_string()));
            }
            let user = User::new(email.clone());
            accounts.insert(
                email.clone(),
                Account {
                    user: user.clone(),
                    password: password.to_string(),
                },
            );
            user
        };

        self.open_session(&email)?;
        info!(user_id = %user.id, "signed up");
        self.publish(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> TdResult<Session> {
        let email = normalize_email(email);
        let valid = self
            .accounts
            .read()
            .get(&email)
            .is_some_and(|account| account.password == password);
        if !valid {
            return Err(TdError::Identity("Invalid login credentials".to_string()));
        }

        let session = self.open_session(&email)?;
        info!(user_id = %session.user.id, "signed in");
        self.publish(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> TdResult<()> {
        let previous = self.session.write().take();
        if previous.is_some() {
            self.publish(AuthEvent::SignedOut);
        }
        Ok(())
    }

    async fn current_user(&self) -> Option<User> {
        self.session.read().as_ref().map(|session| session.user.clone())
    }

    async fn reset_password(&self, email: &str) -> TdResult<()> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(TdError::Identity("Email is required.".to_string()));
        }
        if self.accounts.read().contains_key(&email) {
            self.recoveries.lock().push(email);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_up_signs_in() {
        let identity = MemoryIdentity::new();
        let mut events = identity.subscribe();

        let user = identity.sign_up("Alice@Example.com ", "secret1").await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(identity.current_user().await, Some(user.clone()));
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn(user));
    }

    #[tokio::test]
    async fn test_sign_up_errors() {
        let identity = MemoryIdentity::new();
        assert!(identity.sign_up("alice", "secret1").await.is_err());
        assert!(identity.sign_up("alice@example.com", "123").await.is_err());

        identity.sign_up("alice@example.com", "secret1").await.unwrap();
        let err = identity.sign_up("alice@example.com", "secret1").await.unwrap_err();
        assert_eq!(err, TdError::Identity("User already registered".to_string()));
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let identity = MemoryIdentity::new();
        identity.sign_up("alice@example.com", "secret1").await.unwrap();
        identity.sign_out().await.unwrap();
        assert_eq!(identity.current_user().await, None);

        assert!(identity.sign_in("alice@example.com", "wrong").await.is_err());
        let session = identity.sign_in("alice@example.com", "secret1").await.unwrap();
        assert_eq!(session.access_token.len(), 48);

        let mut events = identity.subscribe();
        identity.sign_out().await.unwrap();
        identity.sign_out().await.unwrap();
        assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_password_recovery() {
        let identity = MemoryIdentity::new();
        identity.sign_up("alice@example.com", "secret1").await.unwrap();
        identity.sign_out().await.unwrap();

        identity.reset_password("nobody@example.com").await.unwrap();
        identity.reset_password("alice@example.com").await.unwrap();
        assert_eq!(identity.recoveries(), vec!["alice@example.com".to_string()]);

        let mut events = identity.subscribe();
        let session = identity.complete_recovery("alice@example.com").unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::PasswordRecovery(session.user)
        );
    }

    #[tokio::test]
    async fn test_token_refresh() {
        let identity = MemoryIdentity::new();
        assert!(identity.refresh().is_none());

        identity.sign_up("alice@example.com", "secret1").await.unwrap();
        let mut events = identity.subscribe();
        let session = identity.refresh().unwrap();
        assert!(matches!(events.recv().await.unwrap(), AuthEvent::TokenRefreshed(_)));
        assert_eq!(identity.current_user().await, Some(session.user));
    }
}
