//! Property-based tests for stage semantics.

use proptest::prelude::*;
use unix_stream::{Pipeline, unixify};

/// Short lines over a tiny alphabet so duplicates and matches are common.
fn lines_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[ab \r\n]{0,4}", 0..20)
}

fn run(input: &[String], build: impl FnOnce(Pipeline<'_>) -> Pipeline<'_>) -> Vec<String> {
    build(unixify(input.iter().map(String::as_str)))
        .collect()
        .unwrap()
}

proptest! {
    #[test]
    fn grep_keeps_matching_subset_in_order(input in lines_strategy(), pattern in "[ab]{0,2}") {
        let out = run(&input, |p| p.grep(pattern.as_str()));
        let expected: Vec<String> = input
            .iter()
            .filter(|line| line.contains(pattern.as_str()))
            .cloned()
            .collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn uniq_is_idempotent(input in lines_strategy()) {
        let once = run(&input, |p| p.uniq());
        let twice = run(&input, |p| p.uniq().uniq());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sort_then_uniq_is_global_dedup(input in lines_strategy()) {
        let out = run(&input, |p| p.sort().uniq());
        let mut expected = input.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn uniq_never_has_adjacent_duplicates(input in lines_strategy()) {
        let out = run(&input, |p| p.uniq());
        prop_assert!(out.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn sort_is_idempotent(input in lines_strategy()) {
        let once = run(&input, |p| p.sort());
        let twice = run(&input, |p| p.sort().sort());
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn nl_numbers_one_to_n(input in lines_strategy()) {
        let out = run(&input, |p| p.nl());
        prop_assert_eq!(out.len(), input.len());
        for (i, (numbered, original)) in out.iter().zip(&input).enumerate() {
            prop_assert_eq!(numbered, &format!("{} {}", i + 1, original));
        }
    }

    #[test]
    fn dos2unix_is_idempotent(input in lines_strategy()) {
        let once = run(&input, |p| p.dos2unix());
        let twice = run(&input, |p| p.dos2unix().dos2unix());
        prop_assert_eq!(&once, &twice);
        for (line, original) in once.iter().zip(&input) {
            prop_assert!(!line.contains("\r\n"));
            if !original.contains("\r\n") {
                prop_assert_eq!(line, original);
            }
        }
    }

    #[test]
    fn compact_has_no_runs_or_edges(input in lines_strategy()) {
        for line in run(&input, |p| p.compact()) {
            prop_assert_eq!(line.trim(), line.as_str());
            prop_assert!(!line.contains("  "));
            prop_assert!(!line.contains(['\r', '\n']));
        }
    }

    #[test]
    fn concat_appends_in_order(a in lines_strategy(), b in lines_strategy()) {
        let out = unixify(a.clone())
            .concat(unixify(b.clone()))
            .collect()
            .unwrap();
        prop_assert_eq!(out.len(), a.len() + b.len());
        prop_assert_eq!(&out[..a.len()], &a[..]);
        prop_assert_eq!(&out[a.len()..], &b[..]);
    }
}

#[test]
fn compact_examples() {
    let out = unixify(["  a   b  ", ""]).compact().collect().unwrap();
    assert_eq!(out, vec!["a b", ""]);
}
