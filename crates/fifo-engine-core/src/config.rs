use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

/// Operator-facing settings, loaded from an optional `Config` file
/// (TOML/YAML/JSON) in the working directory. Every field has a default so
/// a missing file still yields a usable configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Aggregation granularity: 0 = asset, 1 = asset+index, 2 = full entity.
    #[serde(default = "default_granularity")]
    pub granularity: i32,
    /// Capacity limit in MB. Zero disables governance.
    #[serde(default)]
    pub limit_mb: f64,
    /// Fraction of the limit that standalone cleanup reduces usage to.
    #[serde(default = "default_target_pct")]
    pub target_pct: f64,
}

fn default_db_path() -> String {
    "fifo_engine.db".to_string()
}

fn default_root_path() -> String {
    "archive".to_string()
}

fn default_granularity() -> i32 {
    2
}

fn default_target_pct() -> f64 {
    0.7
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_source() {
        let config = Config::builder()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config.db_path, "fifo_engine.db");
        assert_eq!(config.granularity, 2);
        assert_eq!(config.limit_mb, 0.0);
        assert!((config.target_pct - 0.7).abs() < f64::EPSILON);
    }
}
