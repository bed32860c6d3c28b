use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 4;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email regex")
});

/// Trims `value` and rejects it when nothing is left.
pub fn required(field: &str, value: Option<&str>) -> Result<String, AppError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(AppError::param_error(format!("{} cannot be empty", field)));
    }
    Ok(value.to_string())
}

pub fn email(value: &str) -> Result<(), AppError> {
    if value.len() > 254 || !EMAIL_RE.is_match(value) {
        return Err(AppError::param_error("email is not a valid address"));
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), AppError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::param_error(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Accepts absolute http(s) URLs and bare hosts such as `example.com/page`.
pub fn post_url(value: &str) -> Result<(), AppError> {
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("http://{}", value)
    };
    let valid = match Url::parse(&candidate) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url
                    .host_str()
                    .map(|host| host.contains('.') || host == "localhost")
                    .unwrap_or(false)
        }
        Err(_) => false,
    };
    if !valid || value.chars().any(char::is_whitespace) {
        return Err(AppError::param_error("post_url is not a valid URL"));
    }
    Ok(())
}
