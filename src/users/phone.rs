use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref STORED_PHONE_RE: Regex = Regex::new(r"^(\d{2}) (\d{5}-\d{4})$").unwrap();
}

/// `(00) 00000-0000` -> `00 00000-0000`. Expects an already validated value.
pub fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.map(|p| p.replace(['(', ')'], ""))
}

/// Inverse of [`normalize_phone`]. Values not in the stored shape are
/// returned as they are.
pub fn display_phone(stored: &str) -> String {
    match STORED_PHONE_RE.captures(stored) {
        Some(caps) => format!("({}) {}", &caps[1], &caps[2]),
        None => stored.to_string(),
    }
}
