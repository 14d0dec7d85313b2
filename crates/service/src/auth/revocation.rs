use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::errors::AuthError;
use super::token::VerifiedToken;
use crate::storage::{collections, load_vec, save_value, CollectionStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RevokedToken {
    jti: Uuid,
    exp: i64,
}

/// Ids of tokens ended by logout, kept until the token would have expired.
///
/// The set is persisted in the `revoked_tokens` collection so a restart does
/// not bring a logged-out token back to life.
pub struct TokenRevocations {
    store: Arc<dyn CollectionStore>,
    revoked: RwLock<HashMap<Uuid, i64>>,
    write: Mutex<()>,
}

impl TokenRevocations {
    pub async fn open(store: Arc<dyn CollectionStore>) -> Result<Self, AuthError> {
        let rows: Vec<RevokedToken> = load_vec(&*store, collections::REVOKED_TOKENS).await?;
        let now = Utc::now().timestamp();
        let revoked: HashMap<Uuid, i64> = rows.into_iter().filter(|r| r.exp > now).map(|r| (r.jti, r.exp)).collect();
        debug!(count = revoked.len(), "revoked tokens loaded");
        Ok(Self { store, revoked: RwLock::new(revoked), write: Mutex::new(()) })
    }

    /// Revoke `token`; expired entries are dropped on the same write.
    #[instrument(skip(self, token), fields(user_id = %token.session.id))]
    pub async fn revoke(&self, token: &VerifiedToken) -> Result<(), AuthError> {
        let _guard = self.write.lock().await;
        let now = Utc::now().timestamp();
        let mut next = self.revoked.read().await.clone();
        next.retain(|_, exp| *exp > now);
        next.insert(token.jti, token.expires_at);

        let rows: Vec<RevokedToken> = next.iter().map(|(jti, exp)| RevokedToken { jti: *jti, exp: *exp }).collect();
        save_value(&*self.store, collections::REVOKED_TOKENS, &rows).await?;
        *self.revoked.write().await = next;
        info!(jti = %token.jti, "token_revoked");
        Ok(())
    }

    pub async fn is_revoked(&self, jti: Uuid) -> bool {
        self.revoked.read().await.contains_key(&jti)
    }
}
