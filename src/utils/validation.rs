use crate::utils::error::{Result, TriageError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(TriageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(TriageError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(TriageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_urls(field_name: &str, urls: &[String]) -> Result<()> {
    for (index, url) in urls.iter().enumerate() {
        validate_url(&format!("{}[{}]", field_name, index), url)?;
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(TriageError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("api_url", "https://example.com").is_ok());
        assert!(validate_url("api_url", "http://127.0.0.1:8000").is_ok());
        assert!(validate_url("api_url", "").is_err());
        assert!(validate_url("api_url", "invalid-url").is_err());
        assert!(validate_url("api_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_urls_reports_index() {
        let urls = vec![
            "http://localhost:8000".to_string(),
            "localhost:8001".to_string(),
        ];
        match validate_urls("backend.fallback_urls", &urls) {
            Err(TriageError::InvalidConfigValueError { field, .. }) => {
                assert_eq!(field, "backend.fallback_urls[1]");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("timeout_seconds", 3, 1, 60).is_ok());
        assert!(validate_range("timeout_seconds", 0, 1, 60).is_err());
        assert!(validate_range("timeout_seconds", 61, 1, 60).is_err());
    }
}
