//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

/// 依赖注入错误类型
///
/// 容器启动期间由扩展或工厂抛出的所有错误都使用此类型，
/// 编排层只负责原样向上传播。
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件未注册: {name}")]
    ComponentNotRegistered { name: String },

    #[error("循环依赖检测到: {dependency_chain}")]
    CircularDependency { dependency_chain: String },

    #[error("组件类型不匹配: {name}, 期望 {expected}, 实际 {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("组件定义无效: {name}, 原因: {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("不允许覆盖已存在的组件定义: {name}")]
    DefinitionOverrideNotAllowed { name: String },

    #[error("扩展执行失败: {name}, 原因: {message}")]
    ExtensionFailed { name: String, message: String },

    #[error("组件生命周期管理失败: {message}")]
    LifecycleError { message: String },
}

impl DependencyError {
    /// 创建组件未注册错误
    pub fn not_registered(name: impl Into<String>) -> Self {
        Self::ComponentNotRegistered { name: name.into() }
    }

    /// 创建组件定义无效错误
    pub fn invalid_definition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// 创建扩展执行失败错误
    pub fn extension_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExtensionFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
