//! Configuration loading from files and environment variables.

use config::{Config, Environment, File};

use crate::error::{ViewerError, ViewerResult};

use super::ViewerConfig;

/// Load configuration from `preproc-viewer.*` and `PREPROC__*` env vars
pub fn load_config() -> ViewerResult<ViewerConfig> {
    build(Config::builder().add_source(File::with_name("preproc-viewer").required(false)))
}

fn build(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> ViewerResult<ViewerConfig> {
    builder
        .add_source(
            Environment::with_prefix("PREPROC")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ViewerError::Config {
            message: format!("Failed to build config: {}", e),
        })?
        .try_deserialize()
        .map_err(|e| ViewerError::Config {
            message: format!("Failed to deserialize config: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_when_no_sources() {
        let config = build(Config::builder()).unwrap();

        assert_eq!(config.backend.base_url, "http://127.0.0.1:8099");
        assert!((config.viewer.zoom - 1.3).abs() < f32::EPSILON);
        assert_eq!(config.viewer.engine_wait_ms, 5_000);
        assert_eq!(config.ui.locale, "en");
    }

    #[test]
    fn test_file_overrides_nested_sections() {
        let toml = r#"
            [backend]
            base_url = "http://preproc.internal:9000"

            [ui]
            locale = "pt-BR"
        "#;
        let config =
            build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml))).unwrap();

        assert_eq!(config.backend.base_url, "http://preproc.internal:9000");
        assert_eq!(config.backend.request_timeout_secs, 300);
        assert_eq!(config.ui.locale, "pt-BR");
    }

    #[test]
    fn test_invalid_value_is_config_error() {
        let toml = r#"
            [viewer]
            zoom = "very large"
        "#;
        let err = build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
            .unwrap_err();

        assert_eq!(err.error_code(), "config_error");
    }
}
