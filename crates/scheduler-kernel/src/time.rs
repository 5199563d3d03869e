//! The [`TimeParser`] contract (§4.3). The concrete grammar lives in
//! `scheduler-foundation::time_parser`; kernel only fixes the signature so
//! the rest of the engine can be generic over it.

use chrono::{DateTime, Utc};

use crate::error::ParseError;

/// Resolves natural-language or ISO-8601 time strings against a fixed `now`.
/// Referentially transparent: same `(input, now)` always yields the same
/// result or the same error (§8 "round-trip / idempotence").
pub trait TimeParser: Send + Sync {
    fn parse(&self, input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError>;
}
