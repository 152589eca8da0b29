//! Access tokens for Firestore requests.
//!
//! - `TokenCache` wraps a `gcp_auth` provider with a refresh margin,
//!   single-flight refresh and fallback to a still-usable token
//! - `Credentials` picks between that cache and the emulator's static token

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

// =============================================================================
// Constants
// =============================================================================

/// Refresh this long before the reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the provider reports an expiry we cannot convert.
const TOKEN_FALLBACK_TTL: Duration = Duration::from_secs(45 * 60);

/// OAuth scope for the Firestore REST API.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Bearer token accepted by the Firestore emulator.
pub const EMULATOR_TOKEN: &str = "owner";

// =============================================================================
// Token Cache
// =============================================================================

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe token cache with single-flight refresh.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Return a fresh token, refreshing under the write lock when needed.
    pub async fn get_token(&self) -> FirestoreResult<String> {
        if let Some(cached) = self.slot.read().await.as_ref() {
            if cached.fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        let mut slot = self.slot.write().await;

        // Another task may have refreshed while we waited for the lock.
        if let Some(cached) = slot.as_ref() {
            if cached.fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        match self.provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();
                let remaining = token.expires_at() - Utc::now();
                let ttl = if remaining > chrono::Duration::zero() {
                    remaining.to_std().unwrap_or(TOKEN_FALLBACK_TTL)
                } else {
                    Duration::ZERO
                };

                *slot = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at: Instant::now() + ttl,
                });
                debug!(ttl_secs = ttl.as_secs(), "Refreshed Firestore access token");
                Ok(access_token)
            }
            Err(e) => match slot.as_ref() {
                Some(cached) if cached.usable() => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(cached.access_token.clone())
                }
                _ => Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                ))),
            },
        }
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Where request tokens come from.
#[derive(Clone)]
pub enum Credentials {
    /// Service-account tokens via `gcp_auth`.
    ServiceAccount(Arc<TokenCache>),
    /// Fixed token, used against the emulator.
    Static(String),
}

impl Credentials {
    pub fn emulator() -> Self {
        Self::Static(EMULATOR_TOKEN.to_string())
    }

    pub async fn token(&self) -> FirestoreResult<String> {
        match self {
            Self::ServiceAccount(cache) => cache.get_token().await,
            Self::Static(token) => Ok(token.clone()),
        }
    }

    pub async fn invalidate(&self) {
        if let Self::ServiceAccount(cache) = self {
            cache.invalidate().await;
        }
    }

    /// True if a 401 can be fixed by fetching a new token.
    pub fn can_refresh(&self) -> bool {
        matches!(self, Self::ServiceAccount(_))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServiceAccount(_) => f.write_str("Credentials::ServiceAccount"),
            Self::Static(_) => f.write_str("Credentials::Static"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_margin_below_fallback_ttl() {
        assert!(TOKEN_REFRESH_MARGIN < TOKEN_FALLBACK_TTL);
    }

    #[test]
    fn test_firestore_scope() {
        assert!(FIRESTORE_SCOPE.contains("datastore"));
    }

    #[tokio::test]
    async fn test_static_credentials() {
        let creds = Credentials::emulator();
        assert_eq!(creds.token().await.unwrap(), "owner");
        assert!(!creds.can_refresh());
        creds.invalidate().await;
        assert_eq!(creds.token().await.unwrap(), "owner");
    }
}
