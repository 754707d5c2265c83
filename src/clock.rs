use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the wall-clock timestamps fed into the decision scripts.
///
/// The decision engine takes the clock as a trait object so tests can drive
/// time explicitly instead of sleeping through real windows.
pub trait Clock: Send + Sync {
    /// Current time as nanoseconds since the Unix epoch.
    fn now_nanos(&self) -> i64;
}

/// System clock implementation backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_nanos(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0)
    }
}
