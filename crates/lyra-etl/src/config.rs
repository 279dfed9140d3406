use anyhow::{anyhow, Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::ingest::SongbookSource;
use crate::status::STATUS_FILE;
use crate::supplemental::SupplementalPdf;

/// Configuration for lyra.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (LYRA_* prefix)
/// 3. Config file (~/.config/lyra/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding songs, PDFs, the database and the status file.
    ///
    /// Can be set via:
    /// - CLI: --data-dir /path
    /// - ENV: LYRA_DATA_DIR
    /// - Config: data_dir = "/path"
    /// - Default: ~/.local/share/lyra
    pub data_dir: PathBuf,

    /// Path to the SQLite database. Defaults to `<data_dir>/Songs.db`.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: LYRA_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    pub database_path: Option<PathBuf>,

    /// Import only a handful of songs per songbook.
    ///
    /// Can be set via:
    /// - ENV: LYRA_TEST_RUN=true
    /// - Config: test_run = true
    #[serde(deserialize_with = "flag")]
    pub test_run: bool,

    /// Songbooks to import, in import order.
    pub songbooks: Vec<SongbookSource>,

    /// PDFs downloaded into `<data_dir>/PdfSources`.
    pub supplemental_pdfs: Vec<SupplementalPdf>,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_path: None,
            test_run: false,
            songbooks: SongbookSource::defaults(),
            supplemental_pdfs: SupplementalPdf::defaults(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file and environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path` (when it exists) and environment
    /// variables with the LYRA_ prefix.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            builder
                .add_str(&content)
                .context("Failed to load config file")?;
        }

        let mut env_opts = env::Options::with_top_level("lyra");
        env_opts.add_section("logging");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder
            .build()
            .context("Failed to build configuration")?;
        log::debug!("Loaded configuration with data dir {}", config.data_dir.display());
        Ok(config)
    }

    #[must_use]
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = data_dir;
        self
    }

    #[must_use]
    pub fn with_database_path(mut self, path: PathBuf) -> Self {
        self.database_path = Some(path);
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join("Songs.db"))
    }

    pub fn songbook_dir(&self) -> PathBuf {
        self.data_dir.join("SongBook")
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.data_dir.join("PdfSources")
    }

    pub fn status_path(&self) -> PathBuf {
        self.data_dir.join(STATUS_FILE)
    }
}

/// The `[logging]` table, turned into twyg options by [`LoggingConfig::opts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error.
    pub level: String,
    #[serde(deserialize_with = "flag")]
    pub coloured: bool,
    #[serde(deserialize_with = "flag")]
    pub report_caller: bool,
    /// stdout or stderr.
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            coloured: true,
            report_caller: false,
            output: "stderr".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn opts(&self) -> Result<twyg::Opts> {
        let level: twyg::LogLevel = self
            .level
            .parse()
            .map_err(|e| anyhow!("invalid logging.level {:?}: {e}", self.level))?;
        let output: twyg::Output = self
            .output
            .parse()
            .map_err(|e| anyhow!("invalid logging.output {:?}: {e}", self.output))?;
        twyg::OptsBuilder::new()
            .coloured(self.coloured)
            .output(output)
            .level(level)
            .report_caller(self.report_caller)
            .build()
            .map_err(|e| anyhow!("invalid logging options: {e}"))
    }
}

/// Accept `true`/`false` as booleans or as strings; environment values
/// arrive as strings.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, found {other:?}"
            ))),
        },
    }
}

/// Get the default data directory.
///
/// Returns: ~/.local/share/lyra (or platform equivalent)
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lyra")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/lyra/config.toml
/// - macOS: ~/Library/Application Support/lyra/config.toml
/// - Windows: %APPDATA%\lyra\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lyra")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Lyra Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (LYRA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Directory holding SongBook/, PdfSources/, Songs.db and status.toml
#
# Can also be set via:
# - CLI: lyra --data-dir /custom/dir import
# - Environment: LYRA_DATA_DIR=/custom/dir
#
# Default: Platform-specific data directory
#data_dir = "/path/to/lyra"

# Path to the SQLite database, when it should not live in data_dir
#
# Can also be set via:
# - CLI: lyra --db /custom/path.db list
# - Environment: LYRA_DATABASE_PATH=/custom/path.db
#database_path = "/path/to/Songs.db"

# Import only the first 25 files of every songbook
test_run = false

[logging]
level = "info"
coloured = true
report_caller = false
output = "stderr"

# Songbooks are imported in the order listed here. Leaving this section out
# keeps the built-in EZ and KK songbooks.
#
#[[songbooks]]
#acronym = "EZ"
#name = "Evangelický zpěvník 2021"
#path = "EZ"
#dialect = "ez"
#required = true
#expected_songs = 789
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Dialect;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.data_dir.ends_with("lyra"));
        assert!(config.database_path.is_none());
        assert_eq!(config.songbooks.len(), 2);
        assert_eq!(config.supplemental_pdfs.len(), 2);
        assert!(!config.test_run);
    }

    #[test]
    fn test_derived_paths() {
        let config = Config::default().with_data_dir(PathBuf::from("/data/lyra"));
        assert_eq!(config.database_path(), PathBuf::from("/data/lyra/Songs.db"));
        assert_eq!(config.songbook_dir(), PathBuf::from("/data/lyra/SongBook"));
        assert_eq!(config.pdf_dir(), PathBuf::from("/data/lyra/PdfSources"));
        assert_eq!(config.status_path(), PathBuf::from("/data/lyra/status.toml"));

        let config = config.with_database_path(PathBuf::from("/tmp/other.db"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("absent.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/srv/lyra"
test_run = true

[logging]
level = "debug"

[[songbooks]]
acronym = "KK"
name = "Katolický kancionál"
path = "KK/Kancional"
dialect = "kk"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/lyra"));
        assert!(config.test_run);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.output, "stderr");
        assert_eq!(config.songbooks.len(), 1);
        assert_eq!(config.songbooks[0].dialect, Dialect::Kk);
        assert!(!config.songbooks[0].required);
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert!(!config.test_run);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.songbooks, SongbookSource::defaults());
    }

    #[test]
    fn test_flag_accepts_strings() {
        let config: Config = toml::from_str("test_run = 'true'").unwrap();
        assert!(config.test_run);
        let config: Config = toml::from_str("test_run = 'no'").unwrap();
        assert!(!config.test_run);
        assert!(toml::from_str::<Config>("test_run = 'maybe'").is_err());
    }

    #[test]
    fn test_logging_opts() {
        assert!(LoggingConfig::default().opts().is_ok());

        let bad = LoggingConfig {
            level: "loud".to_string(),
            ..LoggingConfig::default()
        };
        assert!(bad.opts().is_err());
    }
}
