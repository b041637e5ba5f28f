//! # Credential Selection Tests
//!
//! Pool rotation fairness and format gating for the per-request credential
//! selector.

use std::collections::HashMap;

use report_relay::{KeySelector, RelayError};

fn valid_key(fill: char) -> String {
    format!("sk-{}", fill.to_string().repeat(48))
}

#[test]
fn pool_selection_is_roughly_uniform() {
    let pool = vec![valid_key('a'), valid_key('b'), valid_key('c')];
    let selector = KeySelector::new(pool.clone(), false);

    let mut counts: HashMap<String, u32> = HashMap::new();
    for _ in 0..300 {
        let key = selector.select(None).unwrap();
        *counts.entry(key).or_insert(0) += 1;
    }

    assert_eq!(counts.len(), 3, "every key should be drawn at least once");
    for key in &pool {
        let count = counts.get(key).copied().unwrap_or(0);
        // Expected ~100 each; a wide tolerance keeps the test deterministic
        // in practice while still catching sticky or skewed selection.
        assert!(
            (40..=180).contains(&count),
            "key drawn {} times, outside uniform tolerance",
            count
        );
    }
}

#[test]
fn single_key_pool_always_selects_it() {
    let key = valid_key('z');
    let selector = KeySelector::new(vec![key.clone()], false);
    for _ in 0..10 {
        assert_eq!(selector.select(None).unwrap(), key);
    }
}

#[test]
fn format_gate_runs_in_both_modes() {
    let bad = "sk-too-short";

    let selector = KeySelector::new(vec![bad.to_string()], false);
    assert!(matches!(
        selector.select(None),
        Err(RelayError::CredentialFormat(_))
    ));

    let selector = KeySelector::new(Vec::new(), true);
    assert!(matches!(
        selector.select(Some(bad)),
        Err(RelayError::CredentialFormat(_))
    ));
}

#[test]
fn user_mode_never_reads_the_pool() {
    let selector = KeySelector::new(vec![valid_key('p')], true);
    let user = valid_key('u');
    for _ in 0..10 {
        assert_eq!(selector.select(Some(&user)).unwrap(), user);
    }
}
