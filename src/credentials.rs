//! # Credential Selection
//!
//! Picks exactly one provider credential per request and validates its shape
//! before anything touches the network.
//!
//! Two modes, fixed at startup: a server-held pool rotated by uniform random
//! selection, or user-supplied mode where each request must carry its own
//! key. Selection is stateless; the pool is an immutable value captured at
//! construction.

use crate::{config::Config, error::RelayError};

/// Provider keys are `sk-` followed by 48 ASCII alphanumerics.
const KEY_PREFIX: &str = "sk-";
const KEY_SUFFIX_LEN: usize = 48;

/// Check a credential against the provider's lexical key format.
pub fn is_valid_key_format(key: &str) -> bool {
    match key.strip_prefix(KEY_PREFIX) {
        Some(rest) => rest.len() == KEY_SUFFIX_LEN && rest.bytes().all(|b| b.is_ascii_alphanumeric()),
        None => false,
    }
}

/// Per-request credential selector.
#[derive(Debug, Clone)]
pub struct KeySelector {
    pool: Vec<String>,
    require_user_key: bool,
}

impl KeySelector {
    pub fn new(pool: Vec<String>, require_user_key: bool) -> Self {
        let pool = pool
            .into_iter()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect();
        Self {
            pool,
            require_user_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_keys.clone(), config.require_user_key)
    }

    /// Produce the single credential to use for this request.
    ///
    /// Fails fast on a malformed credential; no upstream call is made to
    /// discover a bad key.
    pub fn select(&self, user_key: Option<&str>) -> Result<String, RelayError> {
        let key = if self.require_user_key {
            match user_key {
                Some(key) if !key.is_empty() => key.to_string(),
                _ => {
                    return Err(RelayError::BadRequest(
                        "An api_key is required for this request.".to_string(),
                    ))
                }
            }
        } else {
            match self.pool.as_slice() {
                [] => {
                    return Err(RelayError::Internal(
                        "credential pool is empty".to_string(),
                    ))
                }
                pool => pool[fastrand::usize(..pool.len())].clone(),
            }
        };

        if !is_valid_key_format(&key) {
            return Err(RelayError::CredentialFormat(
                "API key format error.".to_string(),
            ));
        }

        Ok(key)
    }
}
