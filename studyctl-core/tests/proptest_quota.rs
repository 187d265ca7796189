use proptest::prelude::*;
use studyctl_core::models::ProblemType;
use studyctl_core::quota::{apply_delta, check, QuotaName};

proptest! {
    /// Property: a counter driven by any sequence of deltas never goes negative
    #[test]
    fn prop_counter_never_negative(deltas in prop::collection::vec(-50i64..50, 0..200)) {
        let mut used = 0;
        for delta in deltas {
            used = apply_delta(used, delta);
            prop_assert!(used >= 0);
        }
    }

    /// Property: check passes exactly when the amount still fits under the limit
    #[test]
    fn prop_check_matches_arithmetic(used in 0i64..10_000, limit in 0i64..10_000, amount in 0i64..100) {
        let name = QuotaName::size(ProblemType::EnglishWord);
        prop_assert_eq!(check(name, used, limit, amount).is_ok(), used + amount <= limit);
    }

    /// Property: incrementing up to the limit always passes the check first
    #[test]
    fn prop_fill_to_limit(limit in 0i64..500) {
        let name = QuotaName::update(ProblemType::EnglishPhrase);
        let mut used = 0;
        while check(name, used, limit, 1).is_ok() {
            used = apply_delta(used, 1);
        }
        prop_assert_eq!(used, limit);
    }
}
