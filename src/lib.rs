//! Distributed Redis-backed rate limiting service.
//!
//! All limiter state lives in Redis: each decision is a single atomic Lua
//! script execution, so concurrent callers across any number of processes
//! never over-admit for a key. The script registry keeps the decision script
//! cached on the server, and every infrastructure failure denies (fail-closed).

pub mod algorithms;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod middleware;
pub mod redis;
pub mod script;
pub mod server;
pub mod window;

pub use algorithms::{Algorithm, Decision};
pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::{RatewallError, Result};
pub use limiter::{Limiter, RateLimiter};
pub use self::redis::{RedisStore, Store};
pub use script::{ReloadHandle, ScriptRegistry};
pub use server::{create_app, Server};
pub use window::Window;
