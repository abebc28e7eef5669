//! Acceptance rules for event text before it is stored or displayed.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Token the model answers with when it knows no verifiable event.
pub const NO_EVENT_SENTINEL: &str = "NO_EVENT";

pub const MAX_EVENT_CHARS: usize = 180;

static LEADING_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2} de ").expect("valid leading date regex"));
static SENTINEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)NO_EVENT").expect("valid sentinel regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentRejection {
    #[error("event text is empty")]
    Empty,
    #[error("event text has {0} characters, limit is {MAX_EVENT_CHARS}")]
    TooLong(usize),
    #[error("event text starts with its own date")]
    LeadingDate,
    #[error("event text contains the {NO_EVENT_SENTINEL} marker")]
    Sentinel,
}

/// Applies the rules in order; the first one that fails decides the rejection.
pub fn validate(candidate: &str) -> Result<(), ContentRejection> {
    if candidate.trim().is_empty() {
        return Err(ContentRejection::Empty);
    }
    let chars = candidate.chars().count();
    if chars > MAX_EVENT_CHARS {
        return Err(ContentRejection::TooLong(chars));
    }
    if LEADING_DATE_RE.is_match(candidate) {
        return Err(ContentRejection::LeadingDate);
    }
    if SENTINEL_RE.is_match(candidate) {
        return Err(ContentRejection::Sentinel);
    }
    Ok(())
}

pub fn is_acceptable(candidate: &str) -> bool {
    validate(candidate).is_ok()
}
