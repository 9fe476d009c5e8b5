//! # Admin token
//!
//! `"{timestamp_ms}.{hash}"` where `hash` is the first 32 hex characters of
//! `sha256("{password}-{timestamp_ms}")`. Anyone holding the password can mint
//! one, and a token is accepted for [`TOKEN_TTL`] after its timestamp. It gates
//! casual edits to the catalog and nothing more.

use std::time::Duration;

use axum::http::{HeaderMap, header::AUTHORIZATION};
use chrono::Utc;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

const HASH_LEN: usize = 32;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn digest(password: &str, timestamp: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{password}-{timestamp}"));

    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(HASH_LEN);
    hex
}

pub fn issue(password: &str, now_ms: i64) -> String {
    format!("{now_ms}.{}", digest(password, now_ms))
}

pub fn verify(token: &str, password: &str, now_ms: i64, ttl: Duration) -> bool {
    let mut parts = token.split('.');

    let (Some(timestamp), Some(hash), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let Ok(timestamp) = timestamp.parse::<i64>() else {
        return false;
    };

    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    if now_ms.saturating_sub(timestamp) > ttl_ms {
        return false;
    }

    bool::from(hash.as_bytes().ct_eq(digest(password, timestamp).as_bytes()))
}

pub fn password_matches(given: &str, expected: &str) -> bool {
    bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}

pub fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
