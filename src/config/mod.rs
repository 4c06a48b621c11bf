pub mod toml_config;

use crate::core::roster::DEFAULT_SEED_COUNT;
use crate::core::token::DEFAULT_MAX_DECODED_BYTES;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_socket_addr, validate_url,
    Validate,
};
use clap::Parser;
use std::net::SocketAddr;
use toml_config::FileConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_FIXTURE: &str = "students.json";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Command line flags. Each one can also come from the environment; anything
/// left unset falls back to the TOML file and then to built-in defaults.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "marks-blob")]
#[command(about = "Student marks lookup and stateless JSON-to-token service")]
pub struct ServerConfig {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "MARKS_CONFIG")]
    pub config: Option<String>,

    /// Socket address to listen on
    #[arg(long, env = "MARKS_BIND")]
    pub bind: Option<String>,

    /// Directory holding the student fixture
    #[arg(long, env = "MARKS_DATA_DIR")]
    pub data_dir: Option<String>,

    /// Student fixture file, relative to the data directory
    #[arg(long, env = "MARKS_FIXTURE")]
    pub fixture: Option<String>,

    /// Public base URL used when the demo page builds share links
    #[arg(long, env = "MARKS_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Largest accepted upload body, in bytes
    #[arg(long, env = "MARKS_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Largest payload a token may inflate to, in bytes
    #[arg(long, env = "MARKS_MAX_DECODED_BYTES")]
    pub max_decoded_bytes: Option<usize>,

    /// Number of random students to seed when the fixture is missing
    #[arg(long, env = "MARKS_SEED_COUNT")]
    pub seed_count: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Fully resolved settings the server runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: String,
    pub data_dir: String,
    pub fixture: String,
    pub public_url: Option<String>,
    pub max_upload_bytes: usize,
    pub max_decoded_bytes: usize,
    pub seed_count: usize,
    pub json_logs: bool,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            data_dir: ".".to_string(),
            fixture: DEFAULT_FIXTURE.to_string(),
            public_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_decoded_bytes: DEFAULT_MAX_DECODED_BYTES,
            seed_count: DEFAULT_SEED_COUNT,
            json_logs: false,
            verbose: false,
        }
    }
}

impl ServerConfig {
    /// 合併命令列、TOML 檔案與預設值
    pub fn resolve(self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Ok(self.merge(file))
    }

    pub fn merge(self, file: FileConfig) -> Settings {
        let defaults = Settings::default();

        Settings {
            bind: self.bind.or(file.server.bind).unwrap_or(defaults.bind),
            data_dir: self
                .data_dir
                .or(file.fixture.data_dir)
                .unwrap_or(defaults.data_dir),
            fixture: self
                .fixture
                .or(file.fixture.path)
                .unwrap_or(defaults.fixture),
            public_url: self
                .public_url
                .or(file.server.public_url)
                .map(|url| url.trim_end_matches('/').to_string()),
            max_upload_bytes: self
                .max_upload_bytes
                .or(file.server.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            max_decoded_bytes: self
                .max_decoded_bytes
                .or(file.server.max_decoded_bytes)
                .unwrap_or(defaults.max_decoded_bytes),
            seed_count: self
                .seed_count
                .or(file.fixture.seed_count)
                .unwrap_or(defaults.seed_count),
            json_logs: self.json_logs || file.logging.json.unwrap_or(false),
            verbose: self.verbose || file.logging.verbose.unwrap_or(false),
        }
    }
}

impl Settings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        validate_socket_addr("bind", &self.bind)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        validate_path("data_dir", &self.data_dir)?;
        validate_path("fixture", &self.fixture)?;

        if let Some(url) = &self.public_url {
            validate_url("public_url", url)?;
        }

        validate_positive_number("max_upload_bytes", self.max_upload_bytes, 1)?;
        validate_positive_number("max_decoded_bytes", self.max_decoded_bytes, 1)?;
        validate_range("seed_count", self.seed_count, 1, 100_000)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AppError;

    #[test]
    fn test_defaults_are_valid() {
        let settings = ServerConfig::default().merge(FileConfig::default());
        assert_eq!(settings, Settings::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = FileConfig::from_toml_str(
            r#"
[server]
bind = "0.0.0.0:9000"
public_url = "https://file.example.com/"

[fixture]
path = "file.json"
"#,
        )
        .unwrap();

        let cli = ServerConfig {
            bind: Some("127.0.0.1:4000".to_string()),
            ..Default::default()
        };

        let settings = cli.merge(file);
        assert_eq!(settings.bind, "127.0.0.1:4000");
        assert_eq!(settings.fixture, "file.json");
        assert_eq!(
            settings.public_url.as_deref(),
            Some("https://file.example.com")
        );
    }

    #[test]
    fn test_parse_cli_flags() {
        let cli = ServerConfig::try_parse_from([
            "marks-blob",
            "--bind",
            "0.0.0.0:8080",
            "--seed-count",
            "5",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(cli.bind.as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(cli.seed_count, Some(5));
        assert!(cli.verbose);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_bind = Settings {
            bind: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            bad_bind.validate(),
            Err(AppError::InvalidConfigValueError { .. })
        ));

        let empty_fixture = Settings {
            fixture: String::new(),
            ..Default::default()
        };
        assert!(empty_fixture.validate().is_err());

        let bad_url = Settings {
            public_url: Some("ftp://example.com".to_string()),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let zero_upload = Settings {
            max_upload_bytes: 0,
            ..Default::default()
        };
        assert!(zero_upload.validate().is_err());

        let zero_decoded = Settings {
            max_decoded_bytes: 0,
            ..Default::default()
        };
        assert!(zero_decoded.validate().is_err());
    }

    #[test]
    fn test_fixture_name_is_not_tied_to_an_extension() {
        let settings = Settings {
            fixture: "roster.data".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_decoded_limit_from_file_and_cli() {
        let file = FileConfig::from_toml_str(
            r#"
[server]
max_decoded_bytes = 4096
"#,
        )
        .unwrap();
        assert_eq!(
            ServerConfig::default().merge(file.clone()).max_decoded_bytes,
            4096
        );

        let cli =
            ServerConfig::try_parse_from(["marks-blob", "--max-decoded-bytes", "512"]).unwrap();
        assert_eq!(cli.merge(file).max_decoded_bytes, 512);
    }
}
