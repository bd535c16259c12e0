#![no_main]

use agegate_verification::{SortDirection, SortField};
use libfuzzer_sys::fuzz_target;

// Field parsing accepts exactly the known names and the id alias; direction parsing never fails.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    match text.parse::<SortField>() {
        Ok(SortField::AttemptId) if text == SortField::ATTEMPT_ID_ALIAS => {}
        Ok(field) => assert_eq!(field.as_str(), text),
        Err(_) => {
            assert_ne!(text, SortField::ATTEMPT_ID_ALIAS);
            assert!(SortField::ALL.iter().all(|f| f.as_str() != text));
        }
    }
    let direction = SortDirection::parse_lenient(text);
    assert_eq!(direction == SortDirection::Descending, text == "desc");
});
