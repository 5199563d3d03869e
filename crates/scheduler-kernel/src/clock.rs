//! Monotonic time source, injectable so tests can advance "now" deterministically.

use chrono::{DateTime, Utc};

/// A source of "now". The engine never calls `Utc::now()` directly outside
/// of [`SystemClock`] — every timing-sensitive component takes a `Arc<dyn Clock>`.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The default [`Clock`], backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
