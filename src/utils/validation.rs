use crate::utils::error::{AppError, Result};
use std::fmt::Display;
use std::net::SocketAddr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> AppError {
    AppError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Share links are only built from http(s) base URLs.
pub fn validate_url(field: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).map_err(|e| invalid(field, raw, format!("not a URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(field, raw, format!("scheme {} is not http(s)", scheme))),
    }
}

pub fn validate_socket_addr(field: &str, raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .map_err(|e| invalid(field, raw, format!("not a socket address: {}", e)))
}

pub fn validate_path(field: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field, path, "path is empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field, path.escape_default(), "path contains a NUL byte"));
    }
    Ok(())
}

pub fn validate_positive_number(field: &str, value: usize, min: usize) -> Result<()> {
    if value < min {
        return Err(invalid(field, value, format!("must be at least {}", min)));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + Display + Copy>(
    field: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(field, value, format!("must be between {} and {}", min, max)));
    }
    Ok(())
}
