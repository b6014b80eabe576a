//! Single-use verification codes keyed by email.
//!
//! The registry owns issuance and redemption; the backing store is a
//! seam so a single process can use the in-memory map while a scaled
//! deployment points at Redis and keeps one code space across instances.

use crate::error::AppError;
use async_trait::async_trait;
use rand::Rng;
use redis::{aio::ConnectionManager, Client};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Keyed single-use token storage. `put` overwrites any existing value.
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AppError>;
    /// Remove and return the value in one step. The store hands the
    /// value to at most one caller, never to two concurrent ones.
    async fn take(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

/// Process-local store. Every operation holds the mutex for its full
/// duration, so `take` is atomic within one process.
#[derive(Default)]
pub struct InMemoryCodeStore {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Code store mutex poisoned: {}", e)))?;

        match entries.get(key) {
            Some((_, Some(deadline))) if Instant::now() >= *deadline => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AppError> {
        let deadline = ttl.map(|t| Instant::now() + t);
        self.entries
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Code store mutex poisoned: {}", e)))?
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Code store mutex poisoned: {}", e)))?;

        match entries.remove(key) {
            Some((_, Some(deadline))) if Instant::now() >= deadline => Ok(None),
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Redis-backed store for multi-instance deployments.
#[derive(Clone)]
pub struct RedisCodeStore {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisCodeStore {
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        tracing::info!(url = %url, "Connecting to Redis code store");
        let client = Client::open(url)?;

        // ConnectionManager reconnects automatically
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            AppError::RedisError(e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        cmd.query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        // GETDEL is atomic server-side; needs Redis 6.2+
        let value: Option<String> = redis::cmd("GETDEL").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await?;
        Ok(())
    }
}

fn code_key(email: &str) -> String {
    format!("code:{}", email)
}

fn verified_key(email: &str) -> String {
    format!("verified:{}", email)
}

/// Redemption markers always expire, even when codes themselves do not,
/// so the store never accumulates one entry per redeemed email.
const VERIFIED_MARKER_TTL: Duration = Duration::from_secs(60 * 60);

/// Issues and redeems 6-digit single-use codes bound to an email address.
#[derive(Clone)]
pub struct VerificationRegistry {
    store: Arc<dyn CodeStore>,
    ttl: Option<Duration>,
}

impl VerificationRegistry {
    pub fn new(store: Arc<dyn CodeStore>, ttl: Option<Duration>) -> Self {
        Self { store, ttl }
    }

    /// Issue a fresh code for `email`, silently invalidating any prior
    /// unredeemed code for the same address.
    pub async fn issue(&self, email: &str) -> Result<u32, AppError> {
        if email.trim().is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Email is required to issue a verification code"
            )));
        }

        let code: u32 = rand::thread_rng().gen_range(100_000..=999_999);
        self.store
            .put(&code_key(email), &code.to_string(), self.ttl)
            .await?;

        tracing::info!(email = %email, "Verification code issued");
        Ok(code)
    }

    /// Redeem `supplied` for `email`. True exactly once per issued code;
    /// a mismatch or miss returns false and leaves the code redeemable.
    /// The supplied code may arrive as text from a UI, so comparison is
    /// numeric when both sides parse.
    pub async fn redeem(&self, email: &str, supplied: &str) -> Result<bool, AppError> {
        let key = code_key(email);
        // Take, then compare: the store yields the code to at most one
        // caller, so concurrent redeems cannot both succeed.
        let Some(stored) = self.store.take(&key).await? else {
            return Ok(false);
        };

        if !codes_match(&stored, supplied) {
            // Wrong guess: put the code back so the right one still works
            self.store.put(&key, &stored, self.ttl).await?;
            return Ok(false);
        }

        self.store
            .put(
                &verified_key(email),
                "1",
                Some(self.ttl.unwrap_or(VERIFIED_MARKER_TTL)),
            )
            .await?;

        tracing::info!(email = %email, "Verification code redeemed");
        Ok(true)
    }

    /// Whether `email` has redeemed a code. Consulted by the strict
    /// confirm-checkout policy; advisory otherwise.
    pub async fn is_verified(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.store.get(&verified_key(email)).await?.is_some())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.store.health_check().await
    }
}

fn codes_match(stored: &str, supplied: &str) -> bool {
    let supplied = supplied.trim();
    match (stored.parse::<u32>(), supplied.parse::<u32>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => stored == supplied,
    }
}
