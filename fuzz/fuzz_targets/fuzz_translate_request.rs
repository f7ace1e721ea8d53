//! Fuzz translation body parsing and validation.
//!
//! Raw bytes go through the same path as a `POST /api/deepl` body: JSON
//! decode, then `validate_translate_request`. Neither step may panic, and an
//! accepted request must respect the text cap.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly fuzz run fuzz_translate_request -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use relay_guard::models::TranslateRequest;
use relay_guard::validation::{validate_lang_code, validate_translate_request};

const MAX_TEXT: usize = 1024;

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = serde_json::from_slice::<TranslateRequest>(data)
        && let Ok(params) = validate_translate_request(request, MAX_TEXT)
    {
        assert!(!params.text.is_empty());
        assert!(params.text.len() <= MAX_TEXT);
    }

    if let Ok(s) = std::str::from_utf8(data) {
        let _ = validate_lang_code(s, "target_lang");
    }
});
