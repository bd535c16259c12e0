#![no_main]

use agegate_types::AttemptRecord;
use libfuzzer_sys::fuzz_target;

// Decoding arbitrary bytes as a stored attempt must never panic, and any
// record that does decode must re-encode to an equal record.
fuzz_target!(|data: &[u8]| {
    if let Ok(record) = bincode::deserialize::<AttemptRecord>(data) {
        let encoded = bincode::serialize(&record).expect("decoded record re-encodes");
        let decoded: AttemptRecord =
            bincode::deserialize(&encoded).expect("re-encoded record decodes");
        assert_eq!(decoded, record);
    }
});
