//! Shared test doubles: an in-memory store that executes the decision
//! algorithms the way Redis would, and a manually advanced clock.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ratewall::algorithms::Algorithm;
use ratewall::clock::Clock;
use ratewall::error::{RatewallError, Result};
use ratewall::limiter::RateLimiter;
use ratewall::redis::Store;
use ratewall::script::ScriptRegistry;

/// In-memory stand-in for Redis: tracks loaded scripts by sha and executes
/// both decision algorithms against local state, atomically under one mutex
/// per algorithm. Failure injection flips every operation to a `Connection`
/// error, and `flush_scripts` models a Redis restart evicting the script
/// cache.
pub struct MockStore {
    sliding_sha: String,
    bucket_sha: String,
    loaded: Mutex<HashSet<String>>,
    load_calls: AtomicUsize,
    failing: AtomicBool,
    // key -> (score, member) event log
    window_state: Mutex<HashMap<String, Vec<(i64, String)>>>,
    // tokens key -> (tokens, stamp)
    bucket_state: Mutex<HashMap<String, (f64, i64)>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            sliding_sha: redis::Script::new(Algorithm::SlidingWindowLog.script_source())
                .get_hash()
                .to_string(),
            bucket_sha: redis::Script::new(Algorithm::TokenBucket.script_source())
                .get_hash()
                .to_string(),
            loaded: Mutex::new(HashSet::new()),
            load_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            window_state: Mutex::new(HashMap::new()),
            bucket_state: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulate a Redis restart evicting the script cache.
    pub fn flush_scripts(&self) {
        self.loaded.lock().unwrap().clear();
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    fn check_connection(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(RatewallError::Connection("mock store disconnected".into()))
        } else {
            Ok(())
        }
    }

    fn run_sliding_window(&self, keys: &[String], args: &[String]) -> Result<redis::Value> {
        let now: i64 = args[0].parse().unwrap();
        let window: i64 = args[1].parse().unwrap();
        let limit: i64 = args[2].parse().unwrap();
        let member = format!("{}:{}", args[0], args[3]);
        let clear_before = now.saturating_sub(window);

        let mut state = self.window_state.lock().unwrap();
        let entries = state.entry(keys[0].clone()).or_default();
        entries.retain(|(score, _)| *score > clear_before);

        let count = entries.len() as i64;
        let allowed = if count < limit {
            if !entries.iter().any(|(_, m)| *m == member) {
                entries.push((now, member));
            }
            1
        } else {
            0
        };

        Ok(redis::Value::Bulk(vec![
            redis::Value::Int(allowed),
            redis::Value::Int(count),
        ]))
    }

    fn run_token_bucket(&self, keys: &[String], args: &[String]) -> Result<redis::Value> {
        let now: i64 = args[0].parse().unwrap();
        let window: i64 = args[1].parse().unwrap();
        let limit: i64 = args[2].parse().unwrap();
        let rate = limit as f64 / window as f64;

        let mut state = self.bucket_state.lock().unwrap();
        let (tokens, stamp) = state
            .entry(keys[0].clone())
            .or_insert((limit as f64, now));

        let delta = (now - *stamp).max(0) as f64;
        let mut filled = (*tokens + delta * rate).min(limit as f64);
        let allowed = if filled >= 1.0 {
            filled -= 1.0;
            1
        } else {
            0
        };
        *tokens = filled;
        *stamp = now;

        Ok(redis::Value::Bulk(vec![
            redis::Value::Int(allowed),
            redis::Value::Int(filled.floor() as i64),
        ]))
    }
}

#[async_trait]
impl Store for MockStore {
    async fn script_exists(&self, sha: &str) -> Result<bool> {
        self.check_connection()?;
        Ok(self.loaded.lock().unwrap().contains(sha))
    }

    async fn script_load(&self, source: &str) -> Result<String> {
        self.check_connection()?;
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let sha = redis::Script::new(source).get_hash().to_string();
        self.loaded.lock().unwrap().insert(sha.clone());
        Ok(sha)
    }

    async fn eval_sha(&self, sha: &str, keys: &[String], args: &[String]) -> Result<redis::Value> {
        self.check_connection()?;
        if !self.loaded.lock().unwrap().contains(sha) {
            return Err(RatewallError::ScriptMissing(format!("NOSCRIPT {sha}")));
        }

        if sha == self.sliding_sha {
            self.run_sliding_window(keys, args)
        } else if sha == self.bucket_sha {
            self.run_token_bucket(keys, args)
        } else {
            Err(RatewallError::ResultShape(format!("unknown script {sha}")))
        }
    }

    async fn ping(&self) -> Result<()> {
        self.check_connection()
    }
}

/// Manually advanced clock starting well away from zero.
pub struct MockClock {
    now: AtomicI64,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            // An arbitrary epoch-scale starting point.
            now: AtomicI64::new(1_700_000_000_000_000_000),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_nanos() as i64, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_nanos(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub engine: RateLimiter,
    pub store: Arc<MockStore>,
    pub clock: Arc<MockClock>,
    pub registry: Arc<ScriptRegistry>,
}

/// Wire a decision engine to the mock store and clock, with the script
/// already registered the way process startup does it.
pub async fn harness(algorithm: Algorithm) -> Harness {
    let store = Arc::new(MockStore::new());
    let clock = Arc::new(MockClock::new());
    let registry = Arc::new(ScriptRegistry::new(
        store.clone() as Arc<dyn Store>,
        algorithm,
    ));
    registry.initialize().await.expect("initial registration");

    let engine = RateLimiter::new(
        store.clone() as Arc<dyn Store>,
        registry.clone(),
        clock.clone() as Arc<dyn Clock>,
    );

    Harness {
        engine,
        store,
        clock,
        registry,
    }
}
