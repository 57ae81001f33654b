//! Random names for containers, prompts and staging files.
//!
//! Only `[A-Za-z0-9]` is ever generated: the sentinel doubles as a container
//! name and as a literal shell prompt.

use rand::distributions::Alphanumeric;
use rand::Rng;

pub const SENTINEL_SUFFIX_LEN: usize = 24;
pub const TEMP_SUFFIX_LEN: usize = 16;

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `prefix` followed by 24 random alphanumerics.
pub fn new_sentinel(prefix: &str) -> String {
    format!("{prefix}{}", random_alphanumeric(SENTINEL_SUFFIX_LEN))
}

/// A staging name namespaced under `session_id`.
pub fn new_temp_name(session_id: &str) -> String {
    format!("{session_id}__tmp-{}", random_alphanumeric(TEMP_SUFFIX_LEN))
}
