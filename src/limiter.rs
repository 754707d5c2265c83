use std::sync::Arc;

use tracing::warn;

use crate::algorithms::{parse_reply, Decision};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::redis::Store;
use crate::script::ScriptRegistry;
use crate::window::Window;

/// Process-wide decision engine binding the injected store handle, the
/// script registry, and the clock. Cheap to clone; every clone shares the
/// same underlying connection.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn Store>,
    registry: Arc<ScriptRegistry>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn Store>, registry: Arc<ScriptRegistry>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            registry,
            clock,
        }
    }

    pub fn with_system_clock(store: Arc<dyn Store>, registry: Arc<ScriptRegistry>) -> Self {
        Self::new(store, registry, Arc::new(SystemClock::new()))
    }

    /// Build a per-policy limiter for one subject key.
    pub fn limiter(&self, window: Window, limit: u32, key: impl Into<String>) -> Limiter {
        Limiter {
            window,
            limit,
            key: key.into(),
            engine: self.clone(),
        }
    }

    /// Store liveness, for the health endpoint.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }
}

/// A rate limit policy bound to one subject key: immutable, built per policy
/// instance (typically per request), discarded after use. All state lives in
/// the store.
pub struct Limiter {
    window: Window,
    limit: u32,
    key: String,
    engine: RateLimiter,
}

impl Limiter {
    /// Decide whether one more event for this key is allowed right now.
    ///
    /// Fail-closed: the store being unreachable, the script having been
    /// evicted, or a malformed reply all log a warning and deny. Under
    /// infrastructure failure the system rejects rather than admitting
    /// unchecked traffic.
    pub async fn allow(&self) -> bool {
        match self.try_allow().await {
            Ok(decision) => decision.allowed,
            Err(e) => {
                warn!(key = %self.key, error = %e, "rate limit check failed, denying request");
                false
            }
        }
    }

    /// Same round trip as [`allow`], surfacing the error and the
    /// `{allowed, count}` pair the script returned.
    ///
    /// [`allow`]: Limiter::allow
    pub async fn try_allow(&self) -> Result<Decision> {
        let now = self.engine.clock.now_nanos();
        let invocation =
            self.engine
                .registry
                .algorithm()
                .invocation(&self.key, now, self.window, self.limit);

        let value = self
            .engine
            .store
            .eval_sha(self.engine.registry.sha(), &invocation.keys, &invocation.args)
            .await?;

        parse_reply(value)
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
