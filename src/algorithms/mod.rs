//! Rate limiting decision algorithms.
//!
//! Each algorithm is a Lua script executed atomically by Redis plus a builder
//! for its key/argument lists. Both variants share one invocation contract:
//! `ARGV[1] = now` (integer nanoseconds), `ARGV[2] = window` (nanoseconds, or
//! the unbounded sentinel), `ARGV[3] = limit`, and return an ordered pair
//! `{allowed in {0,1}, count}`.

pub mod sliding_window;
pub mod token_bucket;

use std::fmt;
use std::str::FromStr;

use crate::error::{RatewallError, Result};
use crate::window::Window;

/// Which decision algorithm the process runs, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Per-key sorted set of event timestamps, pruned to the trailing window
    /// on every decision. The default.
    SlidingWindowLog,
    /// Continuous refill at `limit / window` tokens per nanosecond with
    /// capacity `limit`.
    TokenBucket,
}

impl Algorithm {
    /// The algorithm's Lua source as registered with the store.
    pub fn script_source(&self) -> &'static str {
        match self {
            Algorithm::SlidingWindowLog => sliding_window::SOURCE,
            Algorithm::TokenBucket => token_bucket::SOURCE,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::SlidingWindowLog => "sliding_window",
            Algorithm::TokenBucket => "token_bucket",
        }
    }

    pub(crate) fn invocation(
        &self,
        key: &str,
        now: i64,
        window: Window,
        limit: u32,
    ) -> Invocation {
        match self {
            Algorithm::SlidingWindowLog => sliding_window::invocation(key, now, window, limit),
            Algorithm::TokenBucket => token_bucket::invocation(key, now, window, limit),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = RatewallError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sliding_window" | "sliding-window" => Ok(Algorithm::SlidingWindowLog),
            "token_bucket" | "token-bucket" => Ok(Algorithm::TokenBucket),
            other => Err(RatewallError::Config(format!(
                "unknown rate limit algorithm: {other}"
            ))),
        }
    }
}

/// Ordered key and argument lists for one script execution.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub keys: Vec<String>,
    pub args: Vec<String>,
}

/// Outcome of one atomic decision: the allow flag plus the count the script
/// observed before deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub count: i64,
}

/// Interpret the script reply, expecting the `{allowed, count}` pair.
pub(crate) fn parse_reply(value: redis::Value) -> Result<Decision> {
    if let redis::Value::Bulk(items) = &value {
        if let [redis::Value::Int(allowed), redis::Value::Int(count)] = items.as_slice() {
            return Ok(Decision {
                allowed: *allowed == 1,
                count: *count,
            });
        }
    }
    Err(RatewallError::ResultShape(format!("{value:?}")))
}
