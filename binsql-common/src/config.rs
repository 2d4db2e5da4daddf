use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_adapter")]
    pub adapter: String, // "postgis" for PostGIS deployments
}

fn default_adapter() -> String {
    "postgresql".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            adapter: default_adapter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default = "default_bins")]
    pub default_bins: i64,
}

fn default_bins() -> i64 {
    10
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            default_bins: default_bins(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

fn default_format() -> String {
    "table".into()
}
fn default_output_dir() -> String {
    ".".into()
}
fn default_bar_width() -> usize {
    40
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            output_dir: default_output_dir(),
            bar_width: default_bar_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub histogram: HistogramConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        if let Ok(env_path) = std::env::var("BINSQL_CONFIG") {
            return PathBuf::from(env_path); // $BINSQL_CONFIG overrides default config path
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("binsql")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&content).map_err(|e| crate::HistogramError::Config(e.to_string()))?;
        Ok(cfg)
    }

    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::HistogramError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Connection URL: `$BINSQL_DATABASE_URL`, then `$DATABASE_URL`, then the config file.
    pub fn database_url(&self) -> Option<String> {
        std::env::var("BINSQL_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok()
            .or_else(|| self.database.url.clone())
    }
}
