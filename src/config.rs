use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub customers: PathBuf,   // .json or .csv
    pub coordinates: PathBuf, // province,longitude,latitude
    #[serde(default)]
    pub strict_join: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub description: String,
    pub footer: String,
    pub default_age_range: [u32; 2],
    pub map_zoom: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Customer Demography Dashboard".to_string(),
            description: "A comprehensive view of the diverse tapestry that makes up our customer base. \
                This dynamic visualization tool provides valuable insights into the demographics of our clientele, \
                empowering you to make informed decisions and tailor strategies to better serve their needs."
                .to_string(),
            footer: "This dashboard was developed using a set of dummy data as part of Learning by \
                Building project in data science workshop titled \"NIK Data Enrichment and Interactive \
                Visualization\" provided by algorit.ma."
                .to_string(),
            default_age_range: [35, 50],
            map_zoom: 3,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Live sessions kept before the least recently used one is dropped.
    pub max_sessions: usize,
    /// Sessions untouched for this long are dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_sessions: 1000,
            session_idle_secs: 1800,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            customers = "data/customers.json"
            coordinates = "data/coordinate.csv"
            "#,
        )
        .unwrap();

        assert!(!config.input.strict_join);
        assert_eq!(config.dashboard.default_age_range, [35, 50]);
        assert_eq!(config.dashboard.map_zoom, 3);
        assert!(config
            .dashboard
            .footer
            .ends_with("\"NIK Data Enrichment and Interactive Visualization\" provided by algorit.ma."));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_sessions, 1000);
        assert_eq!(config.server.session_idle_secs, 1800);
    }

    #[test]
    fn test_partial_dashboard_section() {
        let config = AppConfig::from_toml(
            r#"
            [input]
            customers = "c.csv"
            coordinates = "p.csv"
            strict_join = true

            [dashboard]
            default_age_range = [20, 30]

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert!(config.input.strict_join);
        assert_eq!(config.dashboard.default_age_range, [20, 30]);
        assert_eq!(config.dashboard.title, "Customer Demography Dashboard");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_input_section_fails() {
        assert!(AppConfig::from_toml("[server]\nport = 1\n").is_err());
    }
}
