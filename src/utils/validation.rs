use crate::utils::error::{LabError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    validate_url_scheme(field_name, url_str, &["http", "https"])
}

pub fn validate_url_scheme(field_name: &str, url_str: &str, schemes: &[&str]) -> Result<()> {
    if url_str.is_empty() {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) if schemes.contains(&url.scheme()) => Ok(()),
        Ok(url) => Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!(
                "Unsupported URL scheme: {} (expected {})",
                url.scheme(),
                schemes.join(" or ")
            ),
        }),
        Err(e) => Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| LabError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LabError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
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
        return Err(LabError::InvalidConfigValueError {
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
        assert!(validate_url("llm.host", "http://127.0.0.1:11434").is_ok());
        assert!(validate_url("llm.host", "https://example.com").is_ok());
        assert!(validate_url("llm.host", "").is_err());
        assert!(validate_url("llm.host", "invalid-url").is_err());
        assert!(validate_url("NEO4J_URI", "bolt://localhost:7687").is_err());
        assert!(validate_url_scheme("NEO4J_URI", "bolt://localhost:7687", &["bolt"]).is_ok());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("source.input_dir", "data/strava/raw").is_ok());
        assert!(validate_path("source.input_dir", "").is_err());
        assert!(validate_path("source.input_dir", "a\0b").is_err());
    }

    #[test]
    fn test_validate_positive_number_and_range() {
        assert!(validate_positive_number("source.concurrent_files", 4, 1).is_ok());
        assert!(validate_positive_number("source.concurrent_files", 0, 1).is_err());
        assert!(validate_range("llm.timeout_seconds", 30u64, 1, 600).is_ok());
        assert!(validate_range("llm.timeout_seconds", 0u64, 1, 600).is_err());
    }

    #[test]
    fn test_validate_required_and_non_empty() {
        let present = Some("neo4j".to_string());
        let missing: Option<String> = None;
        assert_eq!(validate_required_field("NEO4J_USER", &present).unwrap(), "neo4j");
        assert!(matches!(
            validate_required_field("NEO4J_USER", &missing),
            Err(LabError::MissingConfigError { .. })
        ));
        assert!(validate_non_empty_string("llm.model", "  ").is_err());
    }
}
