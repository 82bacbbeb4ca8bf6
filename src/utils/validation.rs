//! Common validation utilities shared across modules

use hyper::header::HeaderName;

/// Check if a string is empty or only whitespace
pub fn is_empty_or_whitespace(s: &str) -> bool {
    s.trim().is_empty()
}

/// Treat missing, empty and whitespace-only settings the same way
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_empty_or_whitespace(v))
}

/// Headers scoped to a single connection that must not be relayed by a proxy
pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection" | "keep-alive" | "proxy-authenticate" | "proxy-authorization" | "te" | "trailers" | "transfer-encoding" | "upgrade"
    )
}

/// Interpret a boolean-ish setting; anything unrecognised yields `None`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header;

    #[test]
    fn test_is_empty_or_whitespace() {
        assert!(is_empty_or_whitespace(""));
        assert!(is_empty_or_whitespace("  \t\n  "));
        assert!(!is_empty_or_whitespace("  Bearer abc  "));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some("SESSION".to_string())), Some("SESSION".to_string()));
    }

    #[test]
    fn test_is_hop_by_hop_header() {
        assert!(is_hop_by_hop_header(&header::CONNECTION));
        assert!(is_hop_by_hop_header(&header::TRANSFER_ENCODING));
        assert!(is_hop_by_hop_header(&HeaderName::from_static("keep-alive")));
        assert!(!is_hop_by_hop_header(&header::LOCATION));
        assert!(!is_hop_by_hop_header(&header::SET_COOKIE));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag(" NO "), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
