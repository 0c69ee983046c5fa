use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+7[0-9]{10}$").unwrap());

static IIN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{12}$").unwrap());

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn validate_iin(iin: &str) -> bool {
    IIN_REGEX.is_match(iin)
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+77771234567"));
        assert!(!validate_phone("87771234567"));
        assert!(!validate_phone("+7777123456"));
        assert!(!validate_phone("+777712345678"));
    }

    #[test]
    fn test_validate_iin() {
        assert!(validate_iin("123456789012"));
        assert!(!validate_iin("12345678901"));
        assert!(!validate_iin("1234567890123"));
        assert!(!validate_iin("12345678901a"));
    }

    #[test]
    fn test_sanitize_string() {
        assert_eq!(sanitize_string("  hello  "), "hello");
    }
}
