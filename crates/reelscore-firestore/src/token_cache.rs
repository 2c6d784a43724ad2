//! Access token caching for Firestore authentication.
//!
//! Tokens are refreshed a minute before expiry. Refresh happens under a write
//! lock with a double check, so concurrent callers trigger a single refresh.
//! If a refresh fails while the old token is still valid, the old token is used.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Used when the provider reports an expiry we cannot convert.
const FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for Firestore REST access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }

    fn is_unexpired(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub async fn get_token(&self) -> FirestoreResult<String> {
        if let Some(token) = self.cached.read().await.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        match self.provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let now = Utc::now();
                let expires_at = if token.expires_at() > now {
                    (token.expires_at() - now)
                        .to_std()
                        .map(|ttl| Instant::now() + ttl)
                        .unwrap_or_else(|_| Instant::now() + FALLBACK_TTL)
                } else {
                    Instant::now()
                };

                let value = token.as_str().to_string();
                *cached = Some(CachedToken {
                    value: value.clone(),
                    expires_at,
                });
                debug!("Refreshed Firestore access token");
                Ok(value)
            }
            Err(e) => match cached.as_ref().filter(|t| t.is_unexpired()) {
                Some(token) => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(token.value.clone())
                }
                None => Err(FirestoreError::auth_error(format!(
                    "Failed to obtain access token: {}",
                    e
                ))),
            },
        }
    }
}
