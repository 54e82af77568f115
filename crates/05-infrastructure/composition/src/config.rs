//! 容器配置
//!
//! 配置来源按优先级从低到高依次为：默认值、可选的配置文件（TOML/JSON/YAML，按扩展名识别）、
//! 以 `CONTEXT_` 为前缀的环境变量。嵌套键使用 `__` 分隔，例如 `CONTEXT_LOGGING__LEVEL`。

use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "CONTEXT";

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// 容器显示名称
    pub display_name: String,
    /// 是否允许覆盖同名组件定义
    pub allow_definition_overriding: bool,
    /// 刷新完成前是否预先创建非延迟单例
    pub preinstantiate_singletons: bool,
    /// 日志设置
    pub logging: LoggingSettings,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            display_name: "application".to_string(),
            allow_definition_overriding: true,
            preinstantiate_singletons: true,
            logging: LoggingSettings::default(),
        }
    }
}

/// 日志设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// 日志级别
    pub level: String,
    /// 是否使用 JSON 格式
    pub json_format: bool,
    /// 是否显示目标
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            show_target: true,
        }
    }
}

impl LoggingSettings {
    /// 解析日志级别
    pub fn parse_level(&self) -> ConfigResult<tracing::Level> {
        self.level
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::ValidationError {
                message: format!("无效的日志级别: {}", self.level),
            })
    }
}

impl ContextConfig {
    /// 加载配置
    ///
    /// 显式指定的配置文件必须存在。
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError {
                source: Box::new(e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.display_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "容器显示名称不能为空".to_string(),
            });
        }
        self.logging.parse_level()?;
        Ok(())
    }
}
