#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Any line must parse to a command or an error, never panic
    if let Ok(ocidx::query::Command::Search(terms)) = ocidx::query::parse_command(data) {
        assert!(terms.iter().all(|t| !t.is_empty()));
    }
});
