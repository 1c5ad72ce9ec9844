#![no_main]

use arbiter_abac::parse_policy_document;
use libfuzzer_sys::fuzz_target;

// Arbitrary text must either fail to parse or yield only valid policies.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(policies) = parse_policy_document(text) {
        for policy in &policies {
            assert!(policy.validate().is_ok(), "parsed policy failed validation");
        }
    }
});
