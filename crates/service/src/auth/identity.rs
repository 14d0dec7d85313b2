use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use models::{user, Session, User};

use super::errors::AuthError;
use super::password::{hash_password, verify_password};
use crate::storage::{collections, load_opt, load_vec, save_value, CollectionStore};

/// Account records plus the single active session.
///
/// Register and login check-then-write under one lock, so two registrations
/// with the same name cannot both succeed.
pub struct IdentityStore {
    store: Arc<dyn CollectionStore>,
    session: RwLock<Option<Session>>,
    write: Mutex<()>,
}

impl IdentityStore {
    /// Open the identity store, restoring any persisted session.
    pub async fn open(store: Arc<dyn CollectionStore>) -> Result<Self, AuthError> {
        let session: Option<Session> = load_opt(&*store, collections::SESSION).await?;
        if let Some(s) = &session {
            debug!(user_id = %s.id, "session restored");
        }
        Ok(Self { store, session: RwLock::new(session), write: Mutex::new(()) })
    }

    /// Create an account and make it the active session.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::IdentityStore;
    /// use service::storage::MemoryStore;
    /// let identity = tokio_test::block_on(IdentityStore::open(Arc::new(MemoryStore::new()))).unwrap();
    /// let session = tokio_test::block_on(identity.register("alice", "pw1")).unwrap();
    /// assert_eq!(session.name, "alice");
    /// assert!(tokio_test::block_on(identity.register("alice", "pw2")).is_err());
    /// ```
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, password: &str) -> Result<Session, AuthError> {
        user::validate_name(name)?;
        user::validate_password(password)?;

        let _guard = self.write.lock().await;
        let mut users: Vec<User> = load_vec(&*self.store, collections::USERS).await?;
        if users.iter().any(|u| u.name == name) {
            debug!("user exists");
            return Err(AuthError::AlreadyExists);
        }

        let new_user = User::new(name, hash_password(password)?);
        let session = Session::from(&new_user);
        users.push(new_user);
        save_value(&*self.store, collections::USERS, &users).await?;

        if let Err(e) = save_value(&*self.store, collections::SESSION, &session).await {
            warn!(error = %e, "session write failed, restoring users");
            users.pop();
            if let Err(rollback) = save_value(&*self.store, collections::USERS, &users).await {
                error!(error = %rollback, "users rollback failed");
            }
            return Err(e.into());
        }

        *self.session.write().await = Some(session.clone());
        info!(user_id = %session.id, "user_registered");
        Ok(session)
    }

    /// Authenticate by exact name and password.
    ///
    /// An unknown name and a wrong password both yield `InvalidCredentials`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, name: &str, password: &str) -> Result<Session, AuthError> {
        let _guard = self.write.lock().await;
        let users: Vec<User> = load_vec(&*self.store, collections::USERS).await?;
        let found = users.iter().find(|u| u.name == name).ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &found.password_hash)? {
            debug!(user_id = %found.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session::from(found);
        save_value(&*self.store, collections::SESSION, &session).await?;
        *self.session.write().await = Some(session.clone());
        info!(user_id = %session.id, "user_logged_in");
        Ok(session)
    }

    /// Clear the active session and its persisted copy. Safe to repeat.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _guard = self.write.lock().await;
        self.store.remove(collections::SESSION).await?;
        if let Some(s) = self.session.write().await.take() {
            info!(user_id = %s.id, "user_logged_out");
        }
        Ok(())
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Public profile of a user, for showing who posted an item.
    pub async fn find_user(&self, id: Uuid) -> Result<Option<Session>, AuthError> {
        let users: Vec<User> = load_vec(&*self.store, collections::USERS).await?;
        Ok(users.iter().find(|u| u.id == id).map(Session::from))
    }
}
