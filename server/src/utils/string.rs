//! String utility functions

use std::sync::OnceLock;

/// Longest accepted resource identifier
pub const MAX_ID_LENGTH: usize = 256;

/// Check that a control-plane identifier is safe to embed in a request path
pub fn is_valid_id(id: &str) -> bool {
    static RE_ID: OnceLock<regex::Regex> = OnceLock::new();
    let re_id =
        RE_ID.get_or_init(|| regex::Regex::new(r"^[a-zA-Z0-9\-_.]+$").expect("Invalid regex"));

    !id.is_empty() && id.len() <= MAX_ID_LENGTH && re_id.is_match(id)
}

/// Treat empty strings as absent
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
