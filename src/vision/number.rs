use regex::Regex;
use std::sync::LazyLock;

use crate::error::ExtractError;

/// Digits, optionally one separator and more digits
const NUMBER_PATTERN: &str = r"[0-9]+[.,]?[0-9]*";

static NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NUMBER_PATTERN).expect("NUMBER_PATTERN is a valid regex"));

/// First decimal number in normalized text, `.` or `,` as separator.
/// Anything after the first match is ignored.
pub fn extract(text: &str) -> Option<f64> {
    find_number(text).ok()
}

/// Like [`extract`], but says why nothing was found
pub fn find_number(text: &str) -> Result<f64, ExtractError> {
    let candidate = NUMBER_REGEX
        .find(text)
        .ok_or_else(|| ExtractError::NoNumericMatch {
            text: text.to_string(),
        })?
        .as_str()
        .replace(',', ".");

    candidate
        .parse::<f64>()
        .map_err(|source| ExtractError::ParseFault { candidate, source })
}
