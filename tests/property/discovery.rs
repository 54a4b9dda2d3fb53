//! Property-based tests for discovery guarantees

use prefix_probe::alphabet::Alphabet;
use prefix_probe::oracle::{LikeSyntax, SecretSetOracle};
use prefix_probe::discover;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

/// Secrets over an alphabet that includes LIKE metacharacters.
fn secret_sets() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("[ab_\\\\]{1,5}", 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every secret is found, nothing else is, whatever the worker count.
    #[test]
    fn test_sound_complete_and_order_independent(secrets in secret_sets()) {
        let rt = runtime();
        let alphabet = Alphabet::from("ab_\\");

        for workers in [1usize, 4, 16] {
            let oracle = Arc::new(SecretSetOracle::new(&secrets));
            let discovery = rt
                .block_on(discover("", alphabet.clone(), oracle, Arc::new(LikeSyntax), workers))
                .unwrap();

            prop_assert_eq!(&discovery.secrets, &secrets);
            prop_assert!(discovery.is_complete());
        }
    }

    /// No open pattern longer than the longest secret plus one character is ever sent.
    #[test]
    fn test_candidates_stay_bounded(secrets in secret_sets()) {
        let rt = runtime();
        let oracle = Arc::new(SecretSetOracle::new(&secrets));
        rt.block_on(discover("", Alphabet::from("ab_\\"), oracle.clone(), Arc::new(LikeSyntax), 4))
            .unwrap();

        let longest = secrets.iter().map(|s| s.chars().count()).max().unwrap_or(0);
        for pattern in oracle.queried_patterns() {
            let unescaped = pattern
                .trim_end_matches('%')
                .replace("\\\\", "b")
                .replace("\\_", "b")
                .chars()
                .count();
            prop_assert!(unescaped <= longest + 1);
        }
    }
}
