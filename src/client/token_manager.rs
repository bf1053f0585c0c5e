use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use tokio::sync::{Mutex, RwLock};

use crate::error::AppResult;
use crate::modules::logger::redact_token;
use crate::modules::oauth::TokenResponse;

/// Time source for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub value: String,
    pub token_type: String,
    /// Server lifetime minus the safety margin
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn from_response(
        response: TokenResponse,
        acquired_at: DateTime<Utc>,
        margin: Duration,
    ) -> Self {
        // Lifetimes past chrono's range saturate instead of overflowing
        let lifetime = Duration::try_seconds(response.expires_in).unwrap_or(
            if response.expires_in < 0 { Duration::MIN } else { Duration::MAX },
        );
        let expires_at = saturating_add(saturating_add(acquired_at, lifetime), -margin);

        Self {
            expires_at,
            value: response.access_token,
            token_type: response.token_type,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

fn saturating_add(at: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(if delta < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Single-writer cell holding the bearer token.
///
/// Refreshes are serialized: a caller that arrives while another caller is
/// refreshing waits for it and then reuses the fresh token instead of hitting
/// the token endpoint again.
pub struct TokenManager {
    token: RwLock<Option<CachedToken>>,
    refresh_lock: Mutex<()>,
    margin: Duration,
}

impl TokenManager {
    pub fn new(margin: Duration) -> Self {
        Self {
            token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            margin,
        }
    }

    /// The cached token value, if one exists and is still inside its margin.
    pub async fn cached(&self, now: DateTime<Utc>) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .filter(|t| t.is_valid_at(now))
            .map(|t| t.value.clone())
    }

    pub async fn store(&self, response: TokenResponse, now: DateTime<Utc>) -> String {
        let token = CachedToken::from_response(response, now, self.margin);
        let value = token.value.clone();
        tracing::debug!(
            "Cached token {} valid until {}",
            redact_token(&token.value),
            token.expires_at
        );
        *self.token.write().await = Some(token);
        value
    }

    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    pub async fn snapshot(&self) -> Option<CachedToken> {
        self.token.read().await.clone()
    }

    /// Return the cached token or run `refresh` to get a new one.
    ///
    /// `now` is sampled again after the refresh lock is taken so that a token
    /// stored by a concurrent refresh is seen. On failure the cell is left empty.
    pub async fn get_or_refresh<C, F, Fut>(&self, clock: &C, refresh: F) -> AppResult<String>
    where
        C: Clock + ?Sized,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<TokenResponse>>,
    {
        if let Some(value) = self.cached(clock.now()).await {
            return Ok(value);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(value) = self.cached(clock.now()).await {
            tracing::debug!("Token refreshed by a concurrent caller, reusing it");
            return Ok(value);
        }

        // Expired or absent: drop whatever is there before going to the network
        self.clear().await;
        let response = refresh().await?;
        Ok(self.store(response, clock.now()).await)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Manually advanced clock
    pub(crate) struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub(crate) fn new(start: DateTime<Utc>) -> Self {
            Self(std::sync::Mutex::new(start))
        }

        pub(crate) fn advance(&self, by: Duration) {
            let mut now = self.0.lock().unwrap();
            *now = *now + by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn response(value: &str, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: value.to_string(),
            token_type: "bearer".to_string(),
            expires_in,
        }
    }

    #[test]
    fn test_expiry_subtracts_margin() {
        let acquired = Utc::now();
        let token =
            CachedToken::from_response(response("t", 300), acquired, Duration::seconds(30));
        assert_eq!(token.expires_at, acquired + Duration::seconds(270));
        assert!(token.is_valid_at(acquired + Duration::seconds(269)));
        assert!(!token.is_valid_at(acquired + Duration::seconds(270)));
    }

    #[test]
    fn test_huge_lifetime_saturates() {
        let acquired = Utc::now();
        let margin = Duration::seconds(30);

        let token =
            CachedToken::from_response(response("t", 10_000_000_000_000), acquired, margin);
        assert_eq!(token.expires_at, DateTime::<Utc>::MAX_UTC - margin);
        assert!(token.is_valid_at(acquired + Duration::days(365 * 1000)));

        let token = CachedToken::from_response(response("t", i64::MIN), acquired, margin);
        assert_eq!(token.expires_at, DateTime::<Utc>::MIN_UTC);
        assert!(!token.is_valid_at(acquired));
    }

    #[tokio::test]
    async fn test_reuses_token_until_margin() {
        let clock = ManualClock::new(Utc::now());
        let manager = TokenManager::new(Duration::seconds(30));
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let refresh = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(response(&format!("token-{n}"), 100))
        };

        assert_eq!(manager.get_or_refresh(&clock, refresh).await.unwrap(), "token-0");

        // e - 31 seconds: still cached
        clock.advance(Duration::seconds(69));
        assert_eq!(manager.get_or_refresh(&clock, refresh).await.unwrap(), "token-0");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // e - 29 seconds: refreshed
        clock.advance(Duration::seconds(2));
        assert_eq!(manager.get_or_refresh(&clock, refresh).await.unwrap(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cell_empty() {
        let clock = ManualClock::new(Utc::now());
        let manager = TokenManager::new(Duration::seconds(30));
        manager.store(response("old", 60), clock.now()).await;
        clock.advance(Duration::seconds(45));

        let result = manager
            .get_or_refresh(&clock, || async {
                Err(crate::error::AppError::Config("refused".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(manager.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let clock = Arc::new(SystemClock);
        let manager = Arc::new(TokenManager::new(Duration::seconds(30)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let clock = clock.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .get_or_refresh(clock.as_ref(), move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(response("shared", 3600))
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
