use std::sync::OnceLock;

use regex::Regex;

use super::ApiError;

const MAX_EMAIL_LEN: usize = 254;
const MAX_USERNAME_LEN: usize = 150;
const MAX_RECIPE_NAME_LEN: usize = 256;
const MIN_PASSWORD_LEN: usize = 8;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern"))
}

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[\w.@+-]+$")
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    get_regex(&RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    if email.is_empty() {
        return Err(ApiError::validation("Email cannot be empty"));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(ApiError::validation(format!(
            "Email must be {} characters or less",
            MAX_EMAIL_LEN
        )));
    }
    if !email_regex().is_match(email) {
        return Err(ApiError::validation(format!("Invalid email: {}", email)));
    }
    Ok(email)
}

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    if username.is_empty() {
        return Err(ApiError::validation("Username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be {} characters or less",
            MAX_USERNAME_LEN
        )));
    }
    if !username_regex().is_match(username) {
        return Err(ApiError::validation(
            "Username can only contain letters, digits and @/./+/-/_",
        ));
    }
    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(password)
}

pub fn validate_recipe_name(name: &str) -> Result<&str, ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("Recipe name cannot be empty"));
    }
    if name.len() > MAX_RECIPE_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Recipe name must be {} characters or less",
            MAX_RECIPE_NAME_LEN
        )));
    }
    Ok(name)
}

pub fn validate_cooking_time(minutes: i32) -> Result<i32, ApiError> {
    if minutes < 1 {
        return Err(ApiError::validation(format!(
            "Invalid cooking time: {}. Must be a positive number of minutes",
            minutes
        )));
    }
    Ok(minutes)
}

pub fn validate_amount(amount: i32) -> Result<i32, ApiError> {
    if amount < 1 {
        return Err(ApiError::validation(format!(
            "Invalid ingredient amount: {}. Amount must be a positive integer",
            amount
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("a.b+c@mail.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("chef_anna").is_ok());
        assert!(validate_username("user.name+tag@x").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has spaces").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("long-enough").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_cooking_time() {
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(90).is_ok());
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(-5).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(500).is_ok());
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-1).is_err());
    }
}
