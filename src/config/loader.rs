//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（narrator.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["narrator", "narrator.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NARRATOR_`，层级分隔符 `__`）
/// 2. 配置文件（`config_path`，为 None 时搜索 narrator.toml 或 narrator.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NARRATOR_ENGINE__PROGRAM=espeak`
/// - `NARRATOR_ENGINE__RATE=160`
/// - `NARRATOR_NARRATION__STRIP_ASTERISKS=false`
/// - `NARRATOR_VOICES__MALE_NAMES=david,mark`
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("engine.program", "espeak-ng")?
        .set_default("engine.rate", 175)?
        .set_default("engine.volume", 1.0)?
        .set_default("engine.voice", "en")?
        .set_default("engine.min_rate", 80)?
        .set_default("engine.max_rate", 450)?
        .set_default("narration.strip_asterisks", true)?
        .set_default("narration.queue_capacity", 16)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 名称片段列表以逗号分隔
    builder = builder.add_source(
        Environment::with_prefix("NARRATOR")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("voices.male_names")
            .with_list_parse_key("voices.female_names"),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.engine.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Engine program cannot be empty".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.engine.volume) {
        return Err(ConfigError::ValidationError(format!(
            "Engine volume must be within 0.0..=1.0, got {}",
            config.engine.volume
        )));
    }

    if config.engine.min_rate > config.engine.max_rate {
        return Err(ConfigError::ValidationError(format!(
            "Engine min_rate {} exceeds max_rate {}",
            config.engine.min_rate, config.engine.max_rate
        )));
    }

    if config.narration.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "Narration queue capacity cannot be 0".to_string(),
        ));
    }

    let names = config
        .voices
        .male_names
        .iter()
        .chain(config.voices.female_names.iter());
    for name in names {
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Voice name tokens cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Narrator Configuration ===");
    tracing::info!("Engine Program: {}", config.engine.program);
    tracing::info!(
        "Engine Defaults: rate={} volume={} voice={}",
        config.engine.rate,
        config.engine.volume,
        config.engine.voice
    );
    tracing::info!(
        "Engine Rate Range: {}..={}",
        config.engine.min_rate,
        config.engine.max_rate
    );
    tracing::info!("Strip Asterisks: {}", config.narration.strip_asterisks);
    tracing::info!("Queue Capacity: {}", config.narration.queue_capacity);
    tracing::info!("Male Name Tokens: {:?}", config.voices.male_names);
    tracing::info!("Female Name Tokens: {:?}", config.voices.female_names);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("==============================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_empty_program() {
        let mut config = AppConfig::default();
        config.engine.program = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_volume_out_of_range() {
        let mut config = AppConfig::default();
        config.engine.volume = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_inverted_rate_range() {
        let mut config = AppConfig::default();
        config.engine.min_rate = 500;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_queue() {
        let mut config = AppConfig::default();
        config.narration.queue_capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_blank_name_token() {
        let mut config = AppConfig::default();
        config.voices.female_names.push("  ".to_string());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[engine]
program = "espeak"
rate = 160
volume = 0.7

[narration]
strip_asterisks = false

[voices]
male_names = ["brian"]
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.engine.program, "espeak");
        assert_eq!(config.engine.rate, 160);
        assert!((config.engine.volume - 0.7).abs() < 1e-6);
        assert_eq!(config.engine.voice, "en");
        assert!(!config.narration.strip_asterisks);
        assert_eq!(config.voices.male_names, vec!["brian"]);
        // 未配置的列表使用默认值
        assert_eq!(config.voices.female_names.len(), 4);
    }

    #[test]
    fn test_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narrator.toml");
        std::fs::write(&path, "[engine]\nvolume = 2.5\n").unwrap();

        assert!(matches!(
            load_config_from_path(Some(&path)),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(
            load_config_from_path(Some(&path)),
            Err(ConfigError::LoadError(_))
        ));
    }
}
