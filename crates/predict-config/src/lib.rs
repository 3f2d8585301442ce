//! Configuration management.

mod settings;

pub use settings::{AppConfig, AppSettings, LoggingConfig};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

/// Load configuration from file and environment.
///
/// The file is optional; `PREDICT`-prefixed environment variables override
/// its values, with `__` separating nesting levels, for example
/// `PREDICT__PIPELINE__DOWNLOAD__SYMBOL`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }
    let config = builder
        .add_source(
            Environment::with_prefix("PREDICT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(None).expect("load");
        assert_eq!(config.app.name, "predict");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.pipeline.download.symbol, "BTCUSDT");
        assert_eq!(config.pipeline.download.train_years, 4);
        assert!(config.pipeline.models.parallel);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join("predict-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(
            &path,
            r#"
[app]
name = "predict-test"
environment = "test"

[logging]
level = "debug"
format = "json"

[pipeline.download]
symbol = "ETHUSDT"
lookback_days = 1100
train_years = 2
test_years = 1

[pipeline.models]
parallel = false
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).expect("load");
        assert_eq!(config.app.name, "predict-test");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.pipeline.download.symbol, "ETHUSDT");
        assert_eq!(config.pipeline.download.train_years, 2);
        assert!(!config.pipeline.models.parallel);
        // Sections absent from the file keep their defaults.
        assert_eq!(config.pipeline.features.min_train_samples, 100);

        std::fs::remove_file(&path).ok();
    }
}
