use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ::config::{Environment, File, FileFormat, Source};
use anyhow::{bail, Context};
use serde::Deserialize;

const ENV_PREFIX: &str = "PASTEBIN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Overrides the `<scheme>://<host>` prefix of returned paste URLs.
    pub base_url: Option<String>,
    pub server: Server,
    pub database: Database,
    pub keys: Keys,
    pub expiry: Expiry,
    pub assets: Assets,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            host: "0.0.0.0".into(),
            port: 5000,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Database {
    pub url: Option<String>,
    pub name: String,
    pub table: String,
}

impl Database {
    /// The connection URL, falling back to a SQLite file named after the database.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}.db?mode=rwc", self.name),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Database {
            url: None,
            name: "pastebin".into(),
            table: "pastes".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Keys {
    pub length: usize,
    pub max_attempts: u32,
}

impl Default for Keys {
    fn default() -> Self {
        Keys {
            length: 6,
            max_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Expiry {
    pub enabled: bool,
    pub min_opens: i64,
    pub min_age_secs: u64,
    pub interval_secs: u64,
}

impl Default for Expiry {
    fn default() -> Self {
        const WEEK: u64 = 7 * 24 * 60 * 60;
        Expiry {
            enabled: true,
            min_opens: 2,
            min_age_secs: WEEK,
            interval_secs: WEEK,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Assets {
    pub mode: AssetMode,
    pub dir: PathBuf,
    pub base_url: String,
}

impl Default for Assets {
    fn default() -> Self {
        Assets {
            mode: AssetMode::Dev,
            dir: "assets/static".into(),
            base_url: "/".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetMode {
    #[default]
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_upload_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_upload_size: 1024 * 1024,
        }
    }
}

impl Config {
    /// Load the config file (if present) and apply `PASTEBIN_*` environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::from(path).format(FileFormat::Toml).required(false);
        Self::from_sources(file, None)
    }

    /// Layer `file` under the environment. `env` replaces the process environment when given.
    fn from_sources<S>(file: S, env: Option<HashMap<String, String>>) -> anyhow::Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let config: Config = ::config::Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()
            .context("failed to read config")?
            .try_deserialize()
            .context("failed to deserialize config")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.keys.length == 0 {
            bail!("key length must be at least 1");
        }
        if self.keys.max_attempts == 0 {
            bail!("key max attempts must be at least 1");
        }
        if self.expiry.interval_secs == 0 {
            bail!("expiry interval must be at least one second");
        }
        if !is_identifier(&self.database.table) {
            bail!(
                "table name '{}' is not a plain identifier",
                self.database.table
            );
        }
        Ok(())
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn toml(contents: &str) -> impl Source + Send + Sync + 'static {
        File::from_str(contents, FileFormat::Toml)
    }

    #[test]
    fn defaults() {
        let config = Config::from_sources(toml(""), env(&[])).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.keys.length, 6);
        assert_eq!(config.database.name, "pastebin");
        assert_eq!(config.database.table, "pastes");
        assert_eq!(
            config.database.connection_url(),
            "sqlite://pastebin.db?mode=rwc"
        );
        assert_eq!(config.expiry.min_opens, 2);
        assert_eq!(config.expiry.min_age_secs, 604_800);
        assert_eq!(config.assets.mode, AssetMode::Dev);
        assert!(config.base_url.is_none());
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("pastebin-no-such-config.toml");
        let file = File::from(path.as_path())
            .format(FileFormat::Toml)
            .required(false);
        let config = Config::from_sources(file, env(&[])).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn env_overrides() {
        let config = Config::from_sources(
            toml("[server]\nport = 6000\n"),
            env(&[
                ("PASTEBIN_SERVER__PORT", "8080"),
                ("PASTEBIN_SERVER__DEBUG", "true"),
                ("PASTEBIN_ASSETS__MODE", "prod"),
                ("PASTEBIN_ASSETS__BASE_URL", "https://cdn.example.com"),
                ("PASTEBIN_KEYS__LENGTH", "10"),
                ("PASTEBIN_DATABASE__NAME", "other"),
                ("PASTEBIN_LIMITS__MAX_UPLOAD_SIZE", "2048"),
                ("PASTEBIN_BASE_URL", "https://paste.example.com"),
                ("UNRELATED", "1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.debug);
        assert_eq!(config.assets.mode, AssetMode::Prod);
        assert_eq!(config.assets.base_url, "https://cdn.example.com");
        assert_eq!(config.keys.length, 10);
        assert_eq!(config.database.connection_url(), "sqlite://other.db?mode=rwc");
        assert_eq!(config.limits.max_upload_size, 2048);
        assert_eq!(config.base_url.as_deref(), Some("https://paste.example.com"));
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let bad_port = env(&[("PASTEBIN_SERVER__PORT", "not-a-port")]);
        assert!(Config::from_sources(toml(""), bad_port).is_err());
    }

    #[test]
    fn parses_toml() {
        let config = Config::from_sources(
            toml(
                r#"
                base_url = "https://paste.example.com"

                [keys]
                length = 8

                [expiry]
                min_opens = 5

                [assets]
                mode = "prod"
                "#,
            ),
            env(&[]),
        )
        .unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://paste.example.com"));
        assert_eq!(config.keys.length, 8);
        assert_eq!(config.keys.max_attempts, 5);
        assert_eq!(config.expiry.min_opens, 5);
        assert_eq!(config.expiry.interval_secs, 604_800);
        assert_eq!(config.assets.mode, AssetMode::Prod);
    }

    #[test]
    fn rejects_invalid_values() {
        for contents in ["[keys]\nlength = 0\n", "[expiry]\ninterval_secs = 0\n"] {
            assert!(Config::from_sources(toml(contents), env(&[])).is_err());
        }
    }

    #[test]
    fn rejects_bad_table_names() {
        let mut config = Config::default();
        config.database.table = "pastes; DROP TABLE x".into();
        assert!(config.validate().is_err());

        config.database.table = "_pastes2".into();
        config.validate().unwrap();
    }
}
