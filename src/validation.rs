//! Field validators for account input.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("valid regex")
});
static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("valid regex"));

pub const PASSWORD_MIN_CHARS: usize = 8;
pub const PASSWORD_MAX_CHARS: usize = 20;

/// First or last name: ASCII letters only, at least 2 of them.
#[must_use]
pub fn is_valid_name(s: &str) -> bool {
    s.len() >= 2 && s.chars().all(|c| c.is_ascii_alphabetic())
}

/// ASCII address shaped like `local@domain.tld`.
#[must_use]
pub fn is_valid_email(s: &str) -> bool {
    s.is_ascii() && EMAIL.is_match(s)
}

/// Between 8 and 20 characters (not bytes).
#[must_use]
pub fn is_valid_password(s: &str) -> bool {
    (PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&s.chars().count())
}

/// E.164 phone number: `+`, then up to 15 digits without a leading zero.
#[must_use]
pub fn is_valid_phone(s: &str) -> bool {
    E164.is_match(s)
}

/// Canonical hyphenated UUID (`8-4-4-4-12` hex digits, either case).
#[must_use]
pub fn is_valid_uuid(s: &str) -> bool {
    s.len() == 36 && Uuid::try_parse(s).is_ok()
}
