use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;

use crate::error::Result;

/// Contract over the shared store backing all limiter state.
///
/// The decision engine and the script registry only ever talk to this trait,
/// which keeps them independent of the transport and lets tests substitute an
/// in-memory store. Numeric arguments travel as decimal strings so i64
/// nanosecond timestamps round-trip the wire encoding without precision loss.
#[async_trait]
pub trait Store: Send + Sync {
    /// Whether the script with the given sha is currently cached by the store.
    async fn script_exists(&self, sha: &str) -> Result<bool>;

    /// Cache the script source, returning the sha the store computed for it.
    async fn script_load(&self, source: &str) -> Result<String>;

    /// Execute a cached script by sha with an ordered key list and argument
    /// list. Fails with `ScriptMissing` when the sha is not recognized and
    /// `Connection` on any transport failure.
    async fn eval_sha(&self, sha: &str, keys: &[String], args: &[String]) -> Result<redis::Value>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed store over a multiplexed connection manager.
///
/// `ConnectionManager` is cheaply cloneable and reconnects on its own, so a
/// single `RedisStore` serves any number of concurrent decision calls without
/// client-side locking.
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis and establish the managed connection.
    ///
    /// Fails with a `Connection` error when the store is unreachable, which
    /// is fatal at process startup.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn script_exists(&self, sha: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let flags: Vec<i64> = redis::cmd("SCRIPT")
            .arg("EXISTS")
            .arg(sha)
            .query_async(&mut conn)
            .await?;
        Ok(flags.first() == Some(&1))
    }

    async fn script_load(&self, source: &str) -> Result<String> {
        let mut conn = self.connection.clone();
        let sha: String = redis::cmd("SCRIPT")
            .arg("LOAD")
            .arg(source)
            .query_async(&mut conn)
            .await?;
        Ok(sha)
    }

    async fn eval_sha(&self, sha: &str, keys: &[String], args: &[String]) -> Result<redis::Value> {
        let mut conn = self.connection.clone();
        let mut cmd = redis::cmd("EVALSHA");
        cmd.arg(sha).arg(keys.len());
        for key in keys {
            cmd.arg(key);
        }
        for arg in args {
            cmd.arg(arg);
        }
        let value: redis::Value = cmd.query_async(&mut conn).await?;
        Ok(value)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
