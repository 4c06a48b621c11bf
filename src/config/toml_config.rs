use crate::utils::error::{AppError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration file. Every key may be omitted.
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:3000"
/// public_url = "${PUBLIC_URL}"
/// max_upload_bytes = 10485760
/// max_decoded_bytes = 16777216
///
/// [fixture]
/// data_dir = "."
/// path = "students.json"
/// seed_count = 100
///
/// [logging]
/// json = false
/// verbose = false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub fixture: FixtureSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
    pub public_url: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub max_decoded_bytes: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureSection {
    pub data_dir: Option<String>,
    pub path: Option<String>,
    pub seed_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    pub json: Option<bool>,
    pub verbose: Option<bool>,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| AppError::ConfigError {
            message: format!(
                "cannot read config file {}: {}",
                path.as_ref().display(),
                e
            ),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AppError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PUBLIC_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AppError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
bind = "0.0.0.0:8080"
public_url = "https://marks.example.com"
max_upload_bytes = 2048

[fixture]
data_dir = "/var/lib/marks"
path = "roster.json"
seed_count = 10

[logging]
json = true
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.server.max_upload_bytes, Some(2048));
        assert_eq!(config.fixture.path.as_deref(), Some("roster.json"));
        assert_eq!(config.fixture.seed_count, Some(10));
        assert_eq!(config.logging.json, Some(true));
        assert_eq!(config.logging.verbose, None);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert!(config.server.bind.is_none());
        assert!(config.fixture.data_dir.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MARKS_TEST_PUBLIC_URL", "https://sub.example.com");

        let toml_content = r#"
[server]
public_url = "${MARKS_TEST_PUBLIC_URL}"
"#;

        let config = FileConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.server.public_url.as_deref(),
            Some("https://sub.example.com")
        );

        std::env::remove_var("MARKS_TEST_PUBLIC_URL");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = FileConfig::from_toml_str("[server\nbind = 1").unwrap_err();
        assert!(matches!(err, AppError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[fixture]\npath = \"from-file.json\"\n")
            .unwrap();

        let config = FileConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.fixture.path.as_deref(), Some("from-file.json"));
    }
}
