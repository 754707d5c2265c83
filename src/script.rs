use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::algorithms::Algorithm;
use crate::error::Result;
use crate::redis::Store;

/// Owns the decision script and keeps it registered with the store.
///
/// The sha is the SHA-1 of the script source, computed locally, so every
/// process running the same source arrives at the same identifier and shares
/// one registration without coordination. Redis evicts cached scripts on
/// restart and on `SCRIPT FLUSH`; the periodic reload task re-registers the
/// script so a missing-script condition heals within one tick.
pub struct ScriptRegistry {
    store: Arc<dyn Store>,
    algorithm: Algorithm,
    source: &'static str,
    sha: String,
}

impl ScriptRegistry {
    pub fn new(store: Arc<dyn Store>, algorithm: Algorithm) -> Self {
        let source = algorithm.script_source();
        let sha = redis::Script::new(source).get_hash().to_string();
        Self {
            store,
            algorithm,
            source,
            sha,
        }
    }

    /// Content identifier of the registered script.
    pub fn sha(&self) -> &str {
        &self.sha
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Startup registration. A failure here means the store is unreachable
    /// and is fatal to process initialization.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_present().await
    }

    /// One presence-check-and-register step. Issues no load call when the
    /// script is already cached.
    pub async fn ensure_present(&self) -> Result<()> {
        if self.store.script_exists(&self.sha).await? {
            return Ok(());
        }

        let loaded = self.store.script_load(self.source).await?;
        if loaded != self.sha {
            warn!(
                expected = %self.sha,
                loaded = %loaded,
                "store computed a different sha for the decision script"
            );
        }
        debug!(algorithm = %self.algorithm, sha = %self.sha, "registered decision script");
        Ok(())
    }

    /// Spawn the background reload task, repeating [`ensure_present`] on a
    /// fixed interval until the returned handle is shut down. Tick failures
    /// are logged and swallowed; the next decision call surfaces a missing
    /// script on its own and the following tick recovers it.
    ///
    /// [`ensure_present`]: ScriptRegistry::ensure_present
    pub fn spawn_reload(self: Arc<Self>, interval: Duration) -> ReloadHandle {
        let registry = self;
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = registry.ensure_present().await {
                            warn!(error = %e, "script presence check failed, retrying next tick");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            debug!("script reload task stopped");
        });

        ReloadHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to the background reload task, used to stop it during graceful
/// shutdown.
pub struct ReloadHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ReloadHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
