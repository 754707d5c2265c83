use std::fmt;
use std::time::Duration;

/// A sliding time window, stored as a signed nanosecond count.
///
/// A `Window` is either [`Window::UNBOUNDED`] or strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Window(i64);

impl Window {
    /// Sentinel meaning "no meaningful interval was supplied".
    ///
    /// With this window the store-side script derives a TTL of roughly 292
    /// years and a negative prune bound, so the per-key set practically never
    /// expires: the limit behaves as a global cap rather than a rolling
    /// window. The sentinel is reachable only through `every(Duration::ZERO)`.
    pub const UNBOUNDED: Window = Window(i64::MAX);

    /// Convert a minimum time interval between events into a window.
    ///
    /// A zero interval yields [`Window::UNBOUNDED`]; any positive interval
    /// yields a window of exactly that length.
    pub fn every(interval: Duration) -> Window {
        if interval.is_zero() {
            return Window::UNBOUNDED;
        }
        match i64::try_from(interval.as_nanos()) {
            Ok(ns) => Window(ns),
            Err(_) => Window::UNBOUNDED,
        }
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn is_unbounded(&self) -> bool {
        self.0 == i64::MAX
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "unbounded")
        } else {
            write!(f, "{}ns", self.0)
        }
    }
}
