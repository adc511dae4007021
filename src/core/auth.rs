//! Authentication: password hashing, the default administrator, login sessions.
//!
//! Sessions are kept in [`LocalStorage`] under a single key so a restart does not
//! log everyone out. Every request re-reads the user behind a session, so a
//! deactivation or permission change takes effect on the next call.

use crate::config::settings::AdminConfig;
use crate::core::ids::next_id;
use crate::entities::{PermissionSet, UserModel, UserRole, UserStatus, user::USERS_SCOPE};
use crate::errors::{Error, Result};
use crate::store::{Backend, LocalStorage, Store};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Storage key holding every open session.
pub const SESSIONS_KEY: &str = "lumanet-sessions";

/// Days a session stays valid after login.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Hashes a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: format!("hash error: {e}"),
        })
}

/// Checks `password` against a PHC hash.
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash is
/// malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = argon2::PasswordHash::new(hash).map_err(|e| Error::PasswordHash {
        message: format!("invalid hash format: {e}"),
    })?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::PasswordHash {
            message: format!("verify error: {e}"),
        }),
    }
}

/// Creates the configured administrator when there are no users at all.
///
/// Returns the new account, or `None` when users already exist.
#[instrument(skip(store, admin), fields(email = %admin.email))]
pub async fn seed_default_admin(store: &Store, admin: &AdminConfig) -> Result<Option<UserModel>> {
    let users: Vec<UserModel> = store.list(USERS_SCOPE).await?;
    if !users.is_empty() {
        debug!("{} users present, skipping admin seed", users.len());
        return Ok(None);
    }

    let account = UserModel {
        id: next_id(),
        owner_id: USERS_SCOPE.to_string(),
        name: admin.name.clone(),
        email: admin.email.clone(),
        password_hash: hash_password(&admin.password)?,
        role: UserRole::Admin,
        status: UserStatus::Active,
        permissions: PermissionSet::all(),
        created_at: Utc::now(),
    };
    let saved = store.upsert(USERS_SCOPE, &account).await?;
    info!("Seeded default administrator {}", saved.email);
    Ok(Some(saved))
}

/// An authenticated login
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Bearer token
    pub token: String,
    /// Logged-in user
    pub user_id: String,
    /// Login time
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) >= ttl
    }
}

/// Open sessions, persisted in local storage. Expired sessions are refused and
/// pruned on the next login.
#[derive(Clone, Debug)]
pub struct SessionStore {
    storage: LocalStorage,
    ttl: TimeDelta,
    lock: Arc<Mutex<()>>,
}

impl SessionStore {
    /// Sessions kept in `storage`, valid for [`SESSION_TTL_DAYS`].
    #[must_use]
    pub fn new(storage: LocalStorage) -> Self {
        Self {
            storage,
            ttl: TimeDelta::days(SESSION_TTL_DAYS),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Overrides how long a session stays valid.
    #[must_use]
    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    async fn load(&self) -> Result<BTreeMap<String, Session>> {
        Ok(self.storage.get_json(SESSIONS_KEY).await?.unwrap_or_default())
    }

    /// Opens a session for `user_id`.
    pub async fn create(&self, user_id: &str) -> Result<Session> {
        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        let _guard = self.lock.lock().await;
        let mut sessions = self.load().await?;
        let open = sessions.len();
        sessions.retain(|_, existing| !existing.is_expired(self.ttl, session.created_at));
        if sessions.len() < open {
            debug!("Pruned {} expired sessions", open - sessions.len());
        }
        sessions.insert(session.token.clone(), session.clone());
        self.storage.set_json(SESSIONS_KEY, &sessions).await?;
        Ok(session)
    }

    /// Session for `token`, if open and not expired.
    pub async fn get(&self, token: &str) -> Result<Option<Session>> {
        let now = Utc::now();
        Ok(self
            .load()
            .await?
            .remove(token)
            .filter(|session| !session.is_expired(self.ttl, now)))
    }

    /// Closes the session; closing an unknown token is not an error.
    pub async fn remove(&self, token: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut sessions = self.load().await?;
        if sessions.remove(token).is_some() {
            self.storage.set_json(SESSIONS_KEY, &sessions).await?;
        }
        Ok(())
    }
}

/// Authenticates an active user and opens a session.
#[instrument(skip(store, sessions, password))]
pub async fn login(
    store: &Store,
    sessions: &SessionStore,
    email: &str,
    password: &str,
) -> Result<(Session, UserModel)> {
    let users: Vec<UserModel> = store.list(USERS_SCOPE).await?;
    let email = email.trim();
    let Some(user) = users
        .into_iter()
        .find(|user| user.email.eq_ignore_ascii_case(email))
    else {
        warn!("Login attempt for unknown account");
        return Err(Error::InvalidCredentials);
    };

    if user.status != UserStatus::Active || !verify_password(password, &user.password_hash)? {
        warn!("Login refused for {}", user.email);
        return Err(Error::InvalidCredentials);
    }

    let session = sessions.create(&user.id).await?;
    info!("User {} logged in", user.email);
    Ok((session, user))
}

/// The active user behind `token`.
pub async fn current_user(store: &Store, sessions: &SessionStore, token: &str) -> Result<UserModel> {
    let session = sessions.get(token).await?.ok_or(Error::Unauthenticated)?;
    let users: Vec<UserModel> = store.list(USERS_SCOPE).await?;
    match users.into_iter().find(|user| user.id == session.user_id) {
        Some(user) if user.status == UserStatus::Active => Ok(user),
        _ => {
            debug!("Dropping session of missing or inactive user {}", session.user_id);
            sessions.remove(token).await?;
            Err(Error::Unauthenticated)
        }
    }
}

/// Ends the session.
pub async fn logout(sessions: &SessionStore, token: &str) -> Result<()> {
    sessions.remove(token).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::demo_store;

    fn admin_config() -> AdminConfig {
        AdminConfig {
            password: "segredo1".to_string(),
            ..AdminConfig::default()
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter22", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_seed_default_admin_once() -> Result<()> {
        let store = demo_store();
        let admin = seed_default_admin(&store, &admin_config()).await?.unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(admin.permissions, PermissionSet::all());
        assert!(seed_default_admin(&store, &admin_config()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_login_and_current_user() -> Result<()> {
        let store = demo_store();
        let sessions = SessionStore::new(LocalStorage::in_memory());
        seed_default_admin(&store, &admin_config()).await?;

        let (session, user) = login(&store, &sessions, "ADMIN@lumanet.ao", "segredo1").await?;
        assert_eq!(user.email, "admin@lumanet.ao");

        let current = current_user(&store, &sessions, &session.token).await?;
        assert_eq!(current.id, user.id);

        logout(&sessions, &session.token).await?;
        assert!(matches!(
            current_user(&store, &sessions, &session.token).await,
            Err(Error::Unauthenticated)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password_and_unknown_email() -> Result<()> {
        let store = demo_store();
        let sessions = SessionStore::new(LocalStorage::in_memory());
        seed_default_admin(&store, &admin_config()).await?;

        assert!(matches!(
            login(&store, &sessions, "admin@lumanet.ao", "nope").await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, &sessions, "ghost@lumanet.ao", "segredo1").await,
            Err(Error::InvalidCredentials)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login_and_loses_session() -> Result<()> {
        let store = demo_store();
        let sessions = SessionStore::new(LocalStorage::in_memory());
        let mut admin = seed_default_admin(&store, &admin_config()).await?.unwrap();
        let (session, _) = login(&store, &sessions, "admin@lumanet.ao", "segredo1").await?;

        admin.status = UserStatus::Inactive;
        store.upsert(USERS_SCOPE, &admin).await?;

        assert!(matches!(
            current_user(&store, &sessions, &session.token).await,
            Err(Error::Unauthenticated)
        ));
        assert!(sessions.get(&session.token).await?.is_none());
        assert!(matches!(
            login(&store, &sessions, "admin@lumanet.ao", "segredo1").await,
            Err(Error::InvalidCredentials)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_sessions_survive_reopening_storage() -> Result<()> {
        let storage = LocalStorage::in_memory();
        let first = SessionStore::new(storage.clone());
        let session = first.create("42").await?;

        let second = SessionStore::new(storage);
        assert_eq!(second.get(&session.token).await?, Some(session));
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_sessions_are_refused_and_pruned() -> Result<()> {
        let store = demo_store();
        let admin = seed_default_admin(&store, &admin_config()).await?.unwrap();
        let storage = LocalStorage::in_memory();
        let stale = Session {
            token: "stale-token".to_string(),
            user_id: admin.id.clone(),
            created_at: Utc::now() - TimeDelta::days(SESSION_TTL_DAYS + 1),
        };
        let mut open = BTreeMap::new();
        open.insert(stale.token.clone(), stale.clone());
        storage.set_json(SESSIONS_KEY, &open).await?;

        let sessions = SessionStore::new(storage.clone());
        assert!(sessions.get(&stale.token).await?.is_none());
        assert!(matches!(
            current_user(&store, &sessions, &stale.token).await,
            Err(Error::Unauthenticated)
        ));

        let (fresh, _) = login(&store, &sessions, "admin@lumanet.ao", "segredo1").await?;
        let kept: BTreeMap<String, Session> = storage.get_json(SESSIONS_KEY).await?.unwrap_or_default();
        assert_eq!(kept.keys().collect::<Vec<_>>(), vec![&fresh.token]);
        assert_eq!(current_user(&store, &sessions, &fresh.token).await?.email, "admin@lumanet.ao");

        let instant = SessionStore::new(storage).with_ttl(TimeDelta::zero());
        assert!(instant.get(&fresh.token).await?.is_none());
        Ok(())
    }
}
