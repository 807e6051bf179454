/// Confirmation and password-reset code generation
///
/// Codes are six digit numbers drawn uniformly from `100000..=999999`.
/// Uniqueness against outstanding codes is not checked: lookups pick the
/// newest live code with a given value.

use rand::Rng;

/// Number of digits in every code
pub const TOKEN_LENGTH: usize = 6;

/// Generates a six digit numeric code
///
/// # Example
///
/// ```
/// use uptask_shared::auth::token::generate_token;
///
/// let code = generate_token();
/// assert_eq!(code.len(), 6);
/// assert!(code.chars().all(|c| c.is_ascii_digit()));
/// ```
pub fn generate_token() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

/// Whether `value` has the shape of a code (six ASCII digits)
pub fn is_token_format(value: &str) -> bool {
    value.len() == TOKEN_LENGTH && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_six_digits_in_range() {
        for _ in 0..1000 {
            let token = generate_token();
            assert!(is_token_format(&token), "bad token {token}");

            let value: u32 = token.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_is_token_format() {
        assert!(is_token_format("123456"));
        assert!(!is_token_format("12345"));
        assert!(!is_token_format("1234567"));
        assert!(!is_token_format("12a456"));
        assert!(!is_token_format(""));
    }
}
