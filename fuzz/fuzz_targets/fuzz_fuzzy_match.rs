#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use ocidx::query::{find_near_matches, is_near_match, levenshtein};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    pattern: &'a str,
    text: &'a str,
    max_distance: u8,
}

fuzz_target!(|input: Input<'_>| {
    // Keep the DP tables small
    if input.pattern.len() > 64 || input.text.len() > 4096 {
        return;
    }
    let k = usize::from(input.max_distance % 8);

    let found = find_near_matches(input.pattern, input.text, k);
    assert_eq!(found.is_empty(), !is_near_match(input.pattern, input.text, k));

    for occ in &found {
        assert_eq!(&input.text[occ.start..occ.end], occ.matched);
        assert!(!occ.matched.is_empty());
        assert!(occ.distance <= k);
        assert_eq!(occ.distance, levenshtein(input.pattern, &occ.matched));
    }
    assert!(found.windows(2).all(|w| w[0].start <= w[1].start));
});
