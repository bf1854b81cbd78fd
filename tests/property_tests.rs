//! Property-based tests for replacements and core types.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use forgepatch::change::{Change, LiteralReplace, Replacement};
use forgepatch::core::types::{BranchName, Oid, RepoCoordinates};

/// Non-empty needles over a small alphabet so they actually occur in inputs.
fn needle() -> impl Strategy<Value = String> {
    "[ab]{1,3}"
}

fn haystack() -> impl Strategy<Value = String> {
    "[abc ]{0,64}"
}

proptest! {
    #[test]
    fn count_matches_non_overlapping_occurrences(find in needle(), input in haystack()) {
        let r = LiteralReplace::new(find.as_str(), "X");
        let (_, count) = r.replace(&input);
        prop_assert_eq!(count, input.matches(find.as_str()).count());
    }

    #[test]
    fn output_has_no_needle_when_replacement_cannot_recreate_it(
        find in needle(),
        input in haystack(),
    ) {
        // 'Z' shares no character with the needle alphabet.
        let r = LiteralReplace::new(find.as_str(), "Z");
        let (out, _) = r.replace(&input);
        prop_assert!(!out.contains(find.as_str()));
    }

    #[test]
    fn zero_occurrences_is_identity(find in "[xy]{1,4}", input in haystack()) {
        let r = LiteralReplace::new(find.as_str(), "anything");
        let (out, count) = r.replace(&input);
        prop_assert_eq!(out, input);
        prop_assert_eq!(count, 0);
    }

    #[test]
    fn change_apply_agrees_with_replacement(find in needle(), input in haystack()) {
        let r = LiteralReplace::new(find.as_str(), "Q");
        let expected = r.replace(&input).0;
        let change = Change::searching(r);
        prop_assert_eq!(change.apply(input.as_bytes()), expected);
    }

    #[test]
    fn length_changes_by_count_times_delta(find in needle(), replace in "[a-z]{0,5}", input in haystack()) {
        let r = LiteralReplace::new(find.as_str(), replace.as_str());
        let (out, count) = r.replace(&input);
        let expected = input.len() + count * replace.len() - count * find.len();
        prop_assert_eq!(out.len(), expected);
    }

    #[test]
    fn oid_hash_is_stable_and_valid(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let a = Oid::hash_object("blob", &body);
        let b = Oid::hash_object("blob", &body);
        prop_assert_eq!(&a, &b);
        prop_assert!(Oid::new(a.as_str()).is_ok());
    }

    #[test]
    fn simple_branch_names_are_valid(name in "[a-z0-9][a-z0-9_-]{0,20}(/[a-z0-9][a-z0-9_-]{0,20}){0,3}") {
        prop_assert!(BranchName::new(name.as_str()).is_ok());
    }

    #[test]
    fn owner_repo_round_trips(owner in "[a-zA-Z0-9][a-zA-Z0-9-]{0,15}", repo in "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,15}") {
        prop_assume!(!repo.ends_with(".git"));
        let coords: RepoCoordinates = format!("{}/{}", owner, repo).parse().unwrap();
        prop_assert_eq!(coords.owner(), owner.as_str());
        prop_assert_eq!(coords.repo(), repo.as_str());
        prop_assert_eq!(coords.to_string(), format!("{}/{}", owner, repo));
    }
}
