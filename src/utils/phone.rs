//! Phone number normalization for Indian mobile numbers.
//!
//! Numbers are stored as `+91-XXXXXXXXXX`. Input may carry a country code,
//! spaces, dashes or parentheses; only the digits matter.

/// Country prefix of normalized numbers.
pub const COUNTRY_PREFIX: &str = "+91-";

/// Digits in a subscriber number.
const SUBSCRIBER_DIGITS: usize = 10;

/// Longest raw input accepted by [`is_valid_phone_number`].
const MAX_INPUT_CHARS: usize = 15;

/// Normalize a phone number to `+91-XXXXXXXXXX`.
///
/// Exactly ten digits are used as is; longer digit strings keep their last
/// ten digits. Returns `None` when fewer than ten digits are present.
///
/// ```
/// use voicelive_assistant::utils::normalize_phone_number;
///
/// assert_eq!(normalize_phone_number("(704) 528-9568").as_deref(), Some("+91-7045289568"));
/// assert_eq!(normalize_phone_number("+91 70452 89568").as_deref(), Some("+91-7045289568"));
/// assert_eq!(normalize_phone_number("123"), None);
/// ```
pub fn normalize_phone_number(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();

    if digits.len() < SUBSCRIBER_DIGITS {
        return None;
    }

    let subscriber = &digits[digits.len() - SUBSCRIBER_DIGITS..];
    Some(format!("{}{}", COUNTRY_PREFIX, subscriber))
}

/// Whether the input has at least ten digits and at most fifteen characters.
pub fn is_valid_phone_number(input: &str) -> bool {
    let digit_count = input.chars().filter(char::is_ascii_digit).count();
    digit_count >= SUBSCRIBER_DIGITS && input.chars().count() <= MAX_INPUT_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_digits() {
        assert_eq!(
            normalize_phone_number("7045289568").as_deref(),
            Some("+91-7045289568")
        );
    }

    #[test]
    fn test_country_code_is_dropped() {
        assert_eq!(
            normalize_phone_number("917045289568").as_deref(),
            Some("+91-7045289568")
        );
        assert_eq!(
            normalize_phone_number("+91-7045289568").as_deref(),
            Some("+91-7045289568")
        );
        assert_eq!(
            normalize_phone_number("0091 70452 89568").as_deref(),
            Some("+91-7045289568")
        );
    }

    #[test]
    fn test_too_short() {
        assert_eq!(normalize_phone_number("123"), None);
        assert_eq!(normalize_phone_number(""), None);
        assert_eq!(normalize_phone_number("704-528-956"), None);
    }

    #[test]
    fn test_validation() {
        assert!(is_valid_phone_number("7045289568"));
        assert!(is_valid_phone_number("+91-7045289568"));
        assert!(!is_valid_phone_number("123"));
        // 16 characters
        assert!(!is_valid_phone_number("+91 (704) 528-95"));
        assert!(!is_valid_phone_number("+91 - 704 - 528 - 9568"));
    }
}
