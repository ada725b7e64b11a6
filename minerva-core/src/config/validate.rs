//! Configuration validation rules.

use super::schema::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Validate configuration and return aggregated validation errors.
pub fn validate_config(config: &Config) -> crate::Result<()> {
    let mut errors = Vec::new();

    let backend_url = config.chat.backend_url.trim();
    if backend_url.is_empty() {
        errors.push("chat.backend_url must not be empty".to_string());
    } else if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
        errors.push("chat.backend_url must be an http(s) URL".to_string());
    }

    if config.chat.provider.trim().is_empty() {
        errors.push("chat.provider must not be empty".to_string());
    }

    if config.storage.dir.trim().is_empty() {
        errors.push("storage.dir must not be empty".to_string());
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(format!(
            "logging.level must be one of {:?}, got '{}'",
            LOG_LEVELS, config.logging.level
        ));
    }

    let format = config.logging.format.to_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        errors.push(format!(
            "logging.format must be one of {:?}, got '{}'",
            LOG_FORMATS, config.logging.format
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::Error::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_defaults() {
        validate_config(&Config::default()).unwrap();
    }

    #[test]
    fn test_validate_rejects_non_http_backend() {
        let mut config = Config::default();
        config.chat.backend_url = "ftp://relay".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("chat.backend_url"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();

        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_validate_aggregates_all_problems() {
        let mut config = Config::default();
        config.chat.backend_url = String::new();
        config.chat.provider = String::new();
        config.logging.format = "xml".to_string();

        let err = validate_config(&config).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("chat.backend_url"));
        assert!(text.contains("chat.provider"));
        assert!(text.contains("logging.format"));
    }
}
