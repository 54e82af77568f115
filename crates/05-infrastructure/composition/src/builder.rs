//! 应用容器构建器

use crate::config::{ContextConfig, LoggingSettings};
use crate::context::ApplicationContext;
use di_abstractions::{ComponentDefinition, DefinitionRegistry, Extension, OrderComparator};
use di_impl::{DefaultComponentFactory, OrderingResolver, PostProcessorDelegate};
use infrastructure_common::{ConfigResult, InfrastructureError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 应用容器构建器
///
/// 使用建造者模式组装组件定义、外部后置处理器和容器配置
pub struct ApplicationContextBuilder {
    /// 容器配置
    config: ContextConfig,
    /// 待注册的组件定义
    definitions: Vec<(String, ComponentDefinition)>,
    /// 外部提供的工厂后置处理器
    post_processors: Vec<Extension>,
    /// 工厂提供的依赖感知比较器
    dependency_comparator: Option<Arc<dyn OrderComparator>>,
    /// 排序解析器
    resolver: OrderingResolver,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl ApplicationContextBuilder {
    /// 创建新的应用容器构建器
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
            definitions: Vec::new(),
            post_processors: Vec::new(),
            dependency_comparator: None,
            resolver: OrderingResolver::default(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 使用指定的容器配置
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// 从配置文件和环境变量加载容器配置
    pub fn load_config(mut self, path: Option<&Path>) -> Result<Self, InfrastructureError> {
        if let Some(path) = path {
            info!("加载容器配置文件: {}", path.display());
        }
        self.config = ContextConfig::load(path)?;
        Ok(self)
    }

    /// 设置容器显示名称
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.config.display_name = name.into();
        self
    }

    /// 设置是否允许覆盖组件定义
    pub fn allow_definition_overriding(mut self, allow: bool) -> Self {
        self.config.allow_definition_overriding = allow;
        self
    }

    /// 设置刷新时是否预先创建单例
    pub fn preinstantiate_singletons(mut self, enabled: bool) -> Self {
        self.config.preinstantiate_singletons = enabled;
        self
    }

    /// 注册组件定义
    pub fn register_definition(mut self, name: impl Into<String>, definition: ComponentDefinition) -> Self {
        let name = name.into();
        debug!("添加组件定义: {} ({})", name, definition.type_name);
        self.definitions.push((name, definition));
        self
    }

    /// 添加外部工厂后置处理器
    pub fn add_post_processor(mut self, extension: Extension) -> Self {
        debug!("添加外部后置处理器: {}", extension.name());
        self.post_processors.push(extension);
        self
    }

    /// 设置工厂的依赖感知比较器
    pub fn with_dependency_comparator(mut self, comparator: Arc<dyn OrderComparator>) -> Self {
        self.dependency_comparator = Some(comparator);
        self
    }

    /// 设置默认排序比较器
    pub fn with_default_comparator(mut self, comparator: Arc<dyn OrderComparator>) -> Self {
        self.resolver = OrderingResolver::new(comparator);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 按容器配置中的日志设置初始化日志
    pub fn with_configured_logging(mut self) -> Result<Self, InfrastructureError> {
        self.logging_config = LoggingConfig::from_settings(&self.config.logging)?;
        self.logging_enabled = true;
        Ok(self)
    }

    /// 构建应用容器
    pub fn build(self) -> Result<ApplicationContext, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        info!("开始构建应用容器: {}", self.config.display_name);
        self.config.validate()?;

        let mut factory = DefaultComponentFactory::new();
        if let Some(comparator) = self.dependency_comparator {
            factory = factory.with_dependency_comparator(comparator);
        }
        factory.set_allow_definition_overriding(self.config.allow_definition_overriding);

        for (name, definition) in self.definitions {
            factory.register_definition(&name, definition)?;
        }

        let context = ApplicationContext::new(
            self.config.display_name,
            factory,
            self.post_processors,
            PostProcessorDelegate::new(self.resolver),
            self.config.preinstantiate_singletons,
        );

        info!("应用容器构建完成: {}", context.id());
        Ok(context)
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 从容器配置中的日志设置创建
    pub fn from_settings(settings: &LoggingSettings) -> ConfigResult<Self> {
        Ok(Self {
            level: settings.parse_level()?,
            show_target: settings.show_target,
            json_format: settings.json_format,
            ..Self::default()
        })
    }

    /// 初始化全局日志订阅者
    ///
    /// 全局订阅者已经存在时返回错误。
    pub fn init(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
