//! Synthetic contact email derivation

use regex::Regex;
use std::sync::OnceLock;

/// RFC 5321 limit on the local part
const MAX_LOCAL_PART: usize = 64;

/// RFC 5321 limit on a whole address
const MAX_ADDRESS: usize = 254;

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .expect("email pattern is a valid regex")
    })
}

/// Standard email-format check
pub fn is_valid_email(address: &str) -> bool {
    if address.len() > MAX_ADDRESS {
        return false;
    }

    match address.split_once('@') {
        Some((local, _)) if local.len() <= MAX_LOCAL_PART => email_pattern().is_match(address),
        _ => false,
    }
}

/// Lowercased ASCII letters and digits of a display name
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Derives a collision-resistant email from a display name and numeric id
///
/// "Rick Sanchez" with id 1 becomes `ricksanchez1@{domain}`. Names with no
/// usable characters, or that produce an invalid address, fall back to the
/// id-only address `{id}@{domain}`.
pub fn derive_email(name: &str, id: u64, domain: &str) -> String {
    let fallback = format!("{}@{}", id, domain);

    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return fallback;
    }

    let candidate = format!("{}{}@{}", normalized, id, domain);
    if is_valid_email(&candidate) {
        candidate
    } else {
        fallback
    }
}
