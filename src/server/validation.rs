use crate::server::response::ApiError;

const MAX_LESSON_FIELD_LEN: usize = 100;
const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

fn validate_text(value: &str, field: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if value.chars().count() > max_len {
        return Err(format!("{field} cannot exceed {max_len} characters"));
    }
    Ok(())
}

pub fn validate_lesson(name: &str, topic: &str) -> Result<(), ApiError> {
    validate_text(name, "Lesson name", MAX_LESSON_FIELD_LEN).map_err(ApiError::bad_request)?;
    validate_text(topic, "Lesson topic", MAX_LESSON_FIELD_LEN).map_err(ApiError::bad_request)
}

/// Usernames are letters, digits and `@.+-_`, like most account systems
/// accept.
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    validate_text(username, "Username", MAX_USERNAME_LEN).map_err(ApiError::bad_request)?;
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(ApiError::bad_request(
            "Username can only contain letters, digits and @/./+/-/_",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    validate_text(email, "Email", MAX_EMAIL_LEN).map_err(ApiError::bad_request)?;
    let valid = !email.chars().any(char::is_whitespace)
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        });
    if !valid {
        return Err(ApiError::bad_request("Enter a valid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }
    Ok(())
}
