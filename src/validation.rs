//! Input validation for relay request bodies.
//!
//! Runs after the security guard, so only callers that already passed the
//! origin, user-agent and rate-limit checks ever see these messages.

use crate::error::{AppError, AppResult};
use crate::models::{TranslateParams, TranslateRequest};

// =============================================================================
// Validation Constants
// =============================================================================

/// Message returned when `text` or `target_lang` is absent or empty.
pub const MISSING_TRANSLATE_PARAMS: &str = "Missing required parameters: text, target_lang";

/// Maximum length for a language code.
///
/// DeepL codes are short (`DE`, `EN-GB`, `ZH-HANS`); anything longer is noise.
pub const MAX_LANG_CODE_LENGTH: usize = 16;

/// Validate a translation request body and take ownership of its fields.
///
/// Rules:
/// - `text` and `target_lang` must be present and non-empty
/// - `text` must not exceed `max_text_length` bytes
/// - language codes must look like `XX` or `XX-YYYY`
pub fn validate_translate_request(
    request: TranslateRequest,
    max_text_length: usize,
) -> AppResult<TranslateParams> {
    let TranslateRequest {
        text,
        target_lang,
        source_lang,
    } = request;

    let (Some(text), Some(target_lang)) = (
        text.filter(|t| !t.is_empty()),
        target_lang.filter(|l| !l.is_empty()),
    ) else {
        return Err(AppError::BadRequest(MISSING_TRANSLATE_PARAMS.to_string()));
    };

    if text.len() > max_text_length {
        return Err(AppError::BadRequest(format!(
            "Text cannot exceed {max_text_length} bytes (got {})",
            text.len()
        )));
    }

    validate_lang_code(&target_lang, "target_lang")?;

    // An empty source language means "detect", same as omitting it.
    let source_lang = source_lang.filter(|l| !l.is_empty());
    if let Some(ref lang) = source_lang {
        validate_lang_code(lang, "source_lang")?;
    }

    Ok(TranslateParams {
        text,
        target_lang,
        source_lang,
    })
}

/// Validate a language code.
///
/// Accepts ASCII letters with at most one hyphen-separated suffix, e.g.
/// `de`, `EN-GB`, `zh-Hans`. Case is passed through untouched.
pub fn validate_lang_code(code: &str, field: &str) -> AppResult<()> {
    if code.len() > MAX_LANG_CODE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "{field} cannot exceed {MAX_LANG_CODE_LENGTH} characters"
        )));
    }

    let mut parts = code.split('-');
    let primary = parts.next().unwrap_or_default();
    let region = parts.next();

    let letters = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic());

    if !(2..=3).contains(&primary.len()) || !letters(primary) {
        return Err(AppError::BadRequest(format!(
            "{field} must start with a 2 or 3 letter language code"
        )));
    }

    if region.is_some_and(|r| !letters(r)) || parts.next().is_some() {
        return Err(AppError::BadRequest(format!(
            "{field} contains an invalid region or script suffix"
        )));
    }

    Ok(())
}
